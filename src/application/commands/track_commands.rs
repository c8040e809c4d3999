//! Reversible track mutations against the composition backend.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::composition::{Clip, NewTrack, Track, TrackPatch};
use crate::domain::foundation::{TrackId, ValidationError};
use crate::domain::history::{Command, CommandError, CommandKind, CommandMeta};
use crate::ports::CompositionApi;

/// Creates a track; undo deletes it.
///
/// Redo creates a fresh track, which may receive a new id.
pub struct CreateTrackCommand {
    meta: CommandMeta,
    api: Arc<dyn CompositionApi>,
    track: NewTrack,
    created: Option<TrackId>,
}

impl CreateTrackCommand {
    pub fn new(api: Arc<dyn CompositionApi>, track: NewTrack) -> Self {
        Self {
            meta: CommandMeta::new(CommandKind::CreateTrack, format!("Create track '{}'", track.name)),
            api,
            track,
            created: None,
        }
    }

    /// Id assigned by the backend on the latest execute.
    pub fn created_id(&self) -> Option<&TrackId> {
        self.created.as_ref()
    }
}

#[async_trait]
impl Command for CreateTrackCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        let created = self.api.create_track(&self.track).await?;
        self.created = Some(created.id);
        Ok(())
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        let id = self.created.clone().ok_or(CommandError::NotExecuted)?;
        self.api.delete_track(&id).await?;
        self.created = None;
        Ok(())
    }
}

/// Deletes a track and its clips; undo recreates both from the snapshot
/// taken on execute.
///
/// The recreated track and clips may get new ids; later redos delete those.
pub struct DeleteTrackCommand {
    meta: CommandMeta,
    api: Arc<dyn CompositionApi>,
    track_id: TrackId,
    snapshot: Option<(Track, Vec<Clip>)>,
}

impl DeleteTrackCommand {
    pub fn new(api: Arc<dyn CompositionApi>, track_id: TrackId) -> Self {
        Self {
            meta: CommandMeta::new(CommandKind::DeleteTrack, format!("Delete track {track_id}")),
            api,
            track_id,
            snapshot: None,
        }
    }

    /// Id of the track this command currently targets.
    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }
}

#[async_trait]
impl Command for DeleteTrackCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        let track = self.api.get_track(&self.track_id).await?;
        let clips = self.api.list_clips(&self.track_id).await?;
        self.api.delete_track(&self.track_id).await?;
        self.snapshot = Some((track, clips));
        Ok(())
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        let (track, clips) = self.snapshot.as_ref().ok_or(CommandError::NotExecuted)?;
        let recreated = self.api.create_track(&track.to_new()).await?;
        if recreated.id != self.track_id {
            tracing::debug!(old = %self.track_id, new = %recreated.id, "Track recreated under new id");
        }
        self.track_id = recreated.id;

        for clip in clips {
            let mut placement = clip.to_new();
            placement.track_id = self.track_id.clone();
            placement.validate()?;
            self.api.create_clip(&placement).await?;
        }
        Ok(())
    }
}

/// Renames a track, remembering the previous name.
pub struct RenameTrackCommand {
    meta: CommandMeta,
    api: Arc<dyn CompositionApi>,
    track_id: TrackId,
    new_name: String,
    old_name: Option<String>,
}

impl RenameTrackCommand {
    pub fn new(api: Arc<dyn CompositionApi>, track_id: TrackId, new_name: impl Into<String>) -> Self {
        let new_name = new_name.into();
        Self {
            meta: CommandMeta::new(CommandKind::RenameTrack, format!("Rename track to '{new_name}'")),
            api,
            track_id,
            new_name,
            old_name: None,
        }
    }
}

#[async_trait]
impl Command for RenameTrackCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        if self.new_name.trim().is_empty() {
            return Err(ValidationError::empty_field("name").into());
        }
        let current = self.api.get_track(&self.track_id).await?;
        self.api.rename_track(&self.track_id, &self.new_name).await?;
        self.old_name = Some(current.name);
        Ok(())
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        let old_name = self.old_name.as_deref().ok_or(CommandError::NotExecuted)?;
        self.api.rename_track(&self.track_id, old_name).await?;
        Ok(())
    }
}

/// Applies a partial update; undo applies the inverse patch computed from
/// the track as it was just before execution.
pub struct UpdateTrackCommand {
    meta: CommandMeta,
    api: Arc<dyn CompositionApi>,
    track_id: TrackId,
    patch: TrackPatch,
    inverse: Option<TrackPatch>,
}

impl UpdateTrackCommand {
    pub fn new(api: Arc<dyn CompositionApi>, track_id: TrackId, patch: TrackPatch) -> Self {
        Self {
            meta: CommandMeta::new(CommandKind::UpdateTrack, format!("Update track {track_id}")),
            api,
            track_id,
            patch,
            inverse: None,
        }
    }
}

#[async_trait]
impl Command for UpdateTrackCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        self.patch.validate()?;
        if self.patch.is_empty() {
            return Err(CommandError::Rejected("track update changes nothing".into()));
        }
        let before = self.api.get_track(&self.track_id).await?;
        self.api.update_track(&self.track_id, &self.patch).await?;
        self.inverse = Some(self.patch.inverse_against(&before));
        Ok(())
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        let inverse = self.inverse.as_ref().ok_or(CommandError::NotExecuted)?;
        if !inverse.is_empty() {
            self.api.update_track(&self.track_id, inverse).await?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackFlag {
    Mute,
    Solo,
}

/// Sets a track's mute or solo flag; undo restores the previous value.
pub struct TrackFlagCommand {
    meta: CommandMeta,
    api: Arc<dyn CompositionApi>,
    track_id: TrackId,
    flag: TrackFlag,
    value: bool,
    previous: Option<bool>,
}

impl TrackFlagCommand {
    pub fn mute(api: Arc<dyn CompositionApi>, track_id: TrackId, muted: bool) -> Self {
        let verb = if muted { "Mute" } else { "Unmute" };
        Self::build(api, track_id, TrackFlag::Mute, muted, CommandKind::MuteTrack, verb)
    }

    pub fn solo(api: Arc<dyn CompositionApi>, track_id: TrackId, soloed: bool) -> Self {
        let verb = if soloed { "Solo" } else { "Unsolo" };
        Self::build(api, track_id, TrackFlag::Solo, soloed, CommandKind::SoloTrack, verb)
    }

    fn build(
        api: Arc<dyn CompositionApi>,
        track_id: TrackId,
        flag: TrackFlag,
        value: bool,
        kind: CommandKind,
        verb: &str,
    ) -> Self {
        Self {
            meta: CommandMeta::new(kind, format!("{verb} track {track_id}")),
            api,
            track_id,
            flag,
            value,
            previous: None,
        }
    }

    async fn set(&self, value: bool) -> Result<(), CommandError> {
        match self.flag {
            TrackFlag::Mute => self.api.set_track_mute(&self.track_id, value).await?,
            TrackFlag::Solo => self.api.set_track_solo(&self.track_id, value).await?,
        };
        Ok(())
    }
}

#[async_trait]
impl Command for TrackFlagCommand {
    fn meta(&self) -> &CommandMeta {
        &self.meta
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        let before = self.api.get_track(&self.track_id).await?;
        self.set(self.value).await?;
        self.previous = Some(match self.flag {
            TrackFlag::Mute => before.muted,
            TrackFlag::Solo => before.soloed,
        });
        Ok(())
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        let previous = self.previous.ok_or(CommandError::NotExecuted)?;
        self.set(previous).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::composition::InMemoryCompositionApi;
    use crate::application::history::CommandStack;
    use crate::domain::composition::NewClip;

    async fn with_track(name: &str) -> (InMemoryCompositionApi, Arc<dyn CompositionApi>, Track) {
        let backend = InMemoryCompositionApi::new();
        let api: Arc<dyn CompositionApi> = Arc::new(backend.clone());
        let track = api.create_track(&NewTrack::named(name).unwrap()).await.unwrap();
        (backend, api, track)
    }

    #[tokio::test]
    async fn create_then_undo_removes_track() {
        let backend = InMemoryCompositionApi::new();
        let mut command = CreateTrackCommand::new(Arc::new(backend.clone()), NewTrack::named("Keys").unwrap());

        command.execute().await.unwrap();
        assert_eq!(backend.tracks().len(), 1);
        assert_eq!(command.created_id().unwrap().as_str(), "track-1");

        command.undo().await.unwrap();
        assert!(backend.tracks().is_empty());
        assert_eq!(command.undo().await, Err(CommandError::NotExecuted));
    }

    #[tokio::test]
    async fn delete_undo_recreates_and_follows_new_id() {
        let (backend, api, mut track) = with_track("Drums").await;
        api.set_track_mute(&track.id, true).await.unwrap();
        track.muted = true;

        let mut command = DeleteTrackCommand::new(Arc::clone(&api), track.id.clone());
        command.execute().await.unwrap();
        assert!(backend.tracks().is_empty());

        command.undo().await.unwrap();
        let restored = backend.tracks().pop().unwrap();
        assert_ne!(restored.id, track.id);
        assert_eq!(restored.to_new(), track.to_new());
        assert_eq!(command.track_id(), &restored.id);

        command.execute().await.unwrap();
        assert!(backend.tracks().is_empty());
    }

    #[tokio::test]
    async fn delete_undo_puts_clips_back_on_recreated_track() {
        let (backend, api, track) = with_track("Drums").await;
        for (name, start) in [("Intro", 0.0), ("Fill", 12.0)] {
            api.create_clip(&NewClip {
                track_id: track.id.clone(),
                name: name.into(),
                start_beats: start,
                length_beats: 4.0,
            })
            .await
            .unwrap();
        }
        let placements = |clips: Vec<Clip>| -> Vec<(String, f64, f64)> {
            clips
                .into_iter()
                .map(|c| (c.name, c.start_beats, c.length_beats))
                .collect()
        };
        let before = placements(api.list_clips(&track.id).await.unwrap());

        let stack = CommandStack::default();
        stack
            .push_command(Box::new(DeleteTrackCommand::new(Arc::clone(&api), track.id.clone())))
            .await
            .unwrap();
        assert!(backend.clips().is_empty());

        stack.undo().await.unwrap();
        let restored = backend.tracks().pop().unwrap();
        assert!(backend.clips().iter().all(|c| c.track_id == restored.id));
        assert_eq!(placements(api.list_clips(&restored.id).await.unwrap()), before);

        stack.redo().await.unwrap();
        assert!(backend.tracks().is_empty());
        assert!(backend.clips().is_empty());
    }

    #[tokio::test]
    async fn delete_of_missing_track_fails_without_side_effects() {
        let backend = InMemoryCompositionApi::new();
        let mut command =
            DeleteTrackCommand::new(Arc::new(backend.clone()), TrackId::new("ghost").unwrap());

        let err = command.execute().await.unwrap_err();
        assert!(matches!(err, CommandError::NotFound { entity: "track", .. }));
        assert_eq!(backend.calls(), vec!["get_track ghost"]);
    }

    #[tokio::test]
    async fn rename_round_trips() {
        let (backend, api, track) = with_track("Bass").await;
        let mut command = RenameTrackCommand::new(api, track.id.clone(), "Sub Bass");

        command.execute().await.unwrap();
        assert_eq!(backend.tracks()[0].name, "Sub Bass");
        command.undo().await.unwrap();
        assert_eq!(backend.tracks()[0].name, "Bass");
    }

    #[tokio::test]
    async fn rename_rejects_blank_name() {
        let (backend, api, track) = with_track("Bass").await;
        let mut command = RenameTrackCommand::new(api, track.id, "  ");

        assert!(matches!(
            command.execute().await,
            Err(CommandError::Validation(_))
        ));
        assert_eq!(backend.tracks()[0].name, "Bass");
    }

    #[tokio::test]
    async fn update_undo_restores_only_touched_fields() {
        let (backend, api, track) = with_track("Vox").await;
        let patch = TrackPatch {
            volume_db: Some(-6.0),
            pan: Some(0.5),
            ..TrackPatch::default()
        };
        let mut command = UpdateTrackCommand::new(api, track.id.clone(), patch);

        command.execute().await.unwrap();
        let updated = &backend.tracks()[0];
        assert_eq!((updated.volume_db, updated.pan), (-6.0, 0.5));

        command.undo().await.unwrap();
        assert_eq!(backend.tracks()[0], track);
    }

    #[tokio::test]
    async fn update_rejects_out_of_range_pan() {
        let (_backend, api, track) = with_track("Vox").await;
        let patch = TrackPatch {
            pan: Some(2.0),
            ..TrackPatch::default()
        };
        let mut command = UpdateTrackCommand::new(api, track.id, patch);
        assert!(matches!(
            command.execute().await,
            Err(CommandError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn mute_and_solo_restore_previous_flags() {
        let (backend, api, track) = with_track("Gtr").await;

        let mut mute = TrackFlagCommand::mute(Arc::clone(&api), track.id.clone(), true);
        let mut solo = TrackFlagCommand::solo(Arc::clone(&api), track.id.clone(), true);
        assert_eq!(mute.kind(), CommandKind::MuteTrack);
        assert_eq!(solo.description(), "Solo track track-1");

        mute.execute().await.unwrap();
        solo.execute().await.unwrap();
        assert!(backend.tracks()[0].muted && backend.tracks()[0].soloed);

        solo.undo().await.unwrap();
        mute.undo().await.unwrap();
        assert_eq!(backend.tracks()[0], track);
    }

    #[tokio::test]
    async fn backend_outage_surfaces_as_backend_error() {
        let (backend, api, track) = with_track("Pad").await;
        backend.set_unavailable(true);

        let mut command = TrackFlagCommand::mute(api, track.id, true);
        assert!(matches!(
            command.execute().await,
            Err(CommandError::Backend(m)) if m.contains("503")
        ));
    }
}
