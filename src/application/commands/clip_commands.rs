use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::composition::Clip;
use crate::domain::foundation::ClipId;
use crate::domain::history::{Command, CommandError, CommandKind, CommandMeta};
use crate::ports::CompositionApi;

/// Deletes a clip; undo recreates it on the same track at the same position.
///
/// Like track deletion, the recreated clip may get a new id.
pub struct DeleteClipCommand {
    meta: CommandMeta,
    api: Arc<dyn CompositionApi>,
    clip_id: ClipId,
    snapshot: Option<Clip>,
}

impl DeleteClipCommand {
    pub fn new(api: Arc<dyn CompositionApi>, clip_id: ClipId) -> Self {
        Self {
            meta: CommandMeta::new(CommandKind::DeleteClip, format!("Delete clip {clip_id}")),
            api,
            clip_id,
            snapshot: None,
        }
    }

    pub fn clip_id(&self) -> &ClipId {
        &self.clip_id
    }
}

#[async_trait]
impl Command for DeleteClipCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        let snapshot = self.api.get_clip(&self.clip_id).await?;
        self.api.delete_clip(&self.clip_id).await?;
        self.snapshot = Some(snapshot);
        Ok(())
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        let snapshot = self.snapshot.as_ref().ok_or(CommandError::NotExecuted)?;
        let placement = snapshot.to_new();
        placement.validate()?;
        let recreated = self.api.create_clip(&placement).await?;
        self.clip_id = recreated.id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::composition::InMemoryCompositionApi;
    use crate::domain::composition::{NewClip, NewTrack};

    #[tokio::test]
    async fn undo_recreates_clip_in_place() {
        let backend = InMemoryCompositionApi::new();
        let api: Arc<dyn CompositionApi> = Arc::new(backend.clone());
        let track = api.create_track(&NewTrack::named("Drums").unwrap()).await.unwrap();
        let clip = api
            .create_clip(&NewClip {
                track_id: track.id.clone(),
                name: "Verse beat".into(),
                start_beats: 16.0,
                length_beats: 8.0,
            })
            .await
            .unwrap();

        let mut command = DeleteClipCommand::new(Arc::clone(&api), clip.id.clone());
        command.execute().await.unwrap();
        assert!(backend.clips().is_empty());

        command.undo().await.unwrap();
        let restored = backend.clips().pop().unwrap();
        assert_eq!(restored.to_new(), clip.to_new());
        assert_eq!(command.clip_id(), &restored.id);
    }

    #[tokio::test]
    async fn undo_fails_when_track_is_gone() {
        let backend = InMemoryCompositionApi::new();
        let api: Arc<dyn CompositionApi> = Arc::new(backend.clone());
        let track = api.create_track(&NewTrack::named("Drums").unwrap()).await.unwrap();
        let clip = api
            .create_clip(&NewClip {
                track_id: track.id.clone(),
                name: "Fill".into(),
                start_beats: 0.0,
                length_beats: 1.0,
            })
            .await
            .unwrap();

        let mut command = DeleteClipCommand::new(Arc::clone(&api), clip.id);
        command.execute().await.unwrap();
        api.delete_track(&track.id).await.unwrap();

        assert!(matches!(
            command.undo().await,
            Err(CommandError::NotFound { entity: "track", .. })
        ));
    }
}
