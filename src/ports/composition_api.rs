//! CompositionApi port - the track/clip/tempo backend mutated by commands.

use async_trait::async_trait;

use crate::domain::composition::{Clip, NewClip, NewTrack, Tempo, Track, TrackPatch};
use crate::domain::foundation::{ClipId, TrackId};
use crate::domain::history::CommandError;

/// Errors returned by composition backends
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl From<ApiError> for CommandError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound { entity, id } => CommandError::NotFound { entity, id },
            other => CommandError::Backend(other.to_string()),
        }
    }
}

/// Port for the composition backend
#[async_trait]
pub trait CompositionApi: Send + Sync {
    async fn get_track(&self, id: &TrackId) -> Result<Track, ApiError>;

    /// Creates a track. The backend assigns the id.
    async fn create_track(&self, track: &NewTrack) -> Result<Track, ApiError>;

    async fn update_track(&self, id: &TrackId, patch: &TrackPatch) -> Result<Track, ApiError>;

    /// Deletes a track together with its clips.
    async fn delete_track(&self, id: &TrackId) -> Result<(), ApiError>;

    async fn rename_track(&self, id: &TrackId, name: &str) -> Result<Track, ApiError>;

    async fn set_track_mute(&self, id: &TrackId, muted: bool) -> Result<Track, ApiError>;

    async fn set_track_solo(&self, id: &TrackId, soloed: bool) -> Result<Track, ApiError>;

    async fn get_tempo(&self) -> Result<Tempo, ApiError>;

    async fn set_tempo(&self, tempo: Tempo) -> Result<Tempo, ApiError>;

    async fn get_clip(&self, id: &ClipId) -> Result<Clip, ApiError>;

    /// Clips placed on a track, ordered by start position.
    async fn list_clips(&self, track_id: &TrackId) -> Result<Vec<Clip>, ApiError>;

    /// Creates a clip. The backend assigns the id.
    async fn create_clip(&self, clip: &NewClip) -> Result<Clip, ApiError>;

    async fn delete_clip(&self, id: &ClipId) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_command_not_found() {
        let err: CommandError = ApiError::NotFound {
            entity: "track",
            id: "t1".into(),
        }
        .into();
        assert_eq!(
            err,
            CommandError::NotFound {
                entity: "track",
                id: "t1".into()
            }
        );
    }

    #[test]
    fn other_failures_map_to_backend() {
        let err: CommandError = ApiError::Status {
            status: 500,
            message: "boom".into(),
        }
        .into();
        assert!(matches!(err, CommandError::Backend(m) if m.contains("500")));
    }
}
