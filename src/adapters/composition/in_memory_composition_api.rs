//! In-memory composition backend.
//!
//! Assigns sequential ids (`track-1`, `clip-1`, ...) and records every call,
//! so tests can assert both on resulting state and on the request sequence.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::composition::{Clip, NewClip, NewTrack, Tempo, Track, TrackPatch};
use crate::domain::foundation::{ClipId, TrackId};
use crate::ports::{ApiError, CompositionApi};

#[derive(Debug)]
struct Backend {
    tracks: BTreeMap<String, Track>,
    clips: BTreeMap<String, Clip>,
    tempo: Tempo,
    next_id: u64,
    calls: Vec<String>,
    unavailable: bool,
}

/// In-memory composition backend for tests and offline development
#[derive(Debug, Clone)]
pub struct InMemoryCompositionApi {
    backend: Arc<Mutex<Backend>>,
}

impl InMemoryCompositionApi {
    pub fn new() -> Self {
        Self {
            backend: Arc::new(Mutex::new(Backend {
                tracks: BTreeMap::new(),
                clips: BTreeMap::new(),
                tempo: Tempo::default(),
                next_id: 1,
                calls: Vec::new(),
                unavailable: false,
            })),
        }
    }

    /// While unavailable, every call fails with a 503 status.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.backend.lock().unavailable = unavailable;
    }

    /// Calls made so far, e.g. `"delete_track track-1"`.
    pub fn calls(&self) -> Vec<String> {
        self.backend.lock().calls.clone()
    }

    /// Current tracks ordered by id.
    pub fn tracks(&self) -> Vec<Track> {
        self.backend.lock().tracks.values().cloned().collect()
    }

    pub fn clips(&self) -> Vec<Clip> {
        self.backend.lock().clips.values().cloned().collect()
    }

    pub fn tempo(&self) -> Tempo {
        self.backend.lock().tempo
    }

    fn begin(&self, call: String) -> Result<parking_lot::MutexGuard<'_, Backend>, ApiError> {
        let mut backend = self.backend.lock();
        backend.calls.push(call);
        if backend.unavailable {
            return Err(ApiError::Status {
                status: 503,
                message: "backend unavailable".into(),
            });
        }
        Ok(backend)
    }
}

impl Default for InMemoryCompositionApi {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend {
    fn next(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn track_mut(&mut self, id: &TrackId) -> Result<&mut Track, ApiError> {
        self.tracks
            .get_mut(id.as_str())
            .ok_or_else(|| ApiError::NotFound {
                entity: "track",
                id: id.to_string(),
            })
    }
}

fn new_track_id(raw: String) -> Result<TrackId, ApiError> {
    TrackId::new(raw).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl CompositionApi for InMemoryCompositionApi {
    async fn get_track(&self, id: &TrackId) -> Result<Track, ApiError> {
        let mut backend = self.begin(format!("get_track {id}"))?;
        let track = backend.track_mut(id)?.clone();
        Ok(track)
    }

    async fn create_track(&self, track: &NewTrack) -> Result<Track, ApiError> {
        let mut backend = self.begin(format!("create_track {}", track.name))?;
        let id = new_track_id(backend.next("track"))?;
        let created = Track {
            id: id.clone(),
            name: track.name.clone(),
            volume_db: track.volume_db,
            pan: track.pan,
            muted: track.muted,
            soloed: track.soloed,
            color: track.color.clone(),
        };
        backend.tracks.insert(id.as_str().to_string(), created.clone());
        Ok(created)
    }

    async fn update_track(&self, id: &TrackId, patch: &TrackPatch) -> Result<Track, ApiError> {
        let mut backend = self.begin(format!("update_track {id}"))?;
        let track = backend.track_mut(id)?;
        track.apply(patch);
        Ok(track.clone())
    }

    async fn delete_track(&self, id: &TrackId) -> Result<(), ApiError> {
        let mut backend = self.begin(format!("delete_track {id}"))?;
        if backend.tracks.remove(id.as_str()).is_none() {
            return Err(ApiError::NotFound {
                entity: "track",
                id: id.to_string(),
            });
        }
        backend.clips.retain(|_, clip| clip.track_id != *id);
        Ok(())
    }

    async fn rename_track(&self, id: &TrackId, name: &str) -> Result<Track, ApiError> {
        let mut backend = self.begin(format!("rename_track {id}"))?;
        let track = backend.track_mut(id)?;
        track.name = name.to_string();
        Ok(track.clone())
    }

    async fn set_track_mute(&self, id: &TrackId, muted: bool) -> Result<Track, ApiError> {
        let mut backend = self.begin(format!("set_track_mute {id} {muted}"))?;
        let track = backend.track_mut(id)?;
        track.muted = muted;
        Ok(track.clone())
    }

    async fn set_track_solo(&self, id: &TrackId, soloed: bool) -> Result<Track, ApiError> {
        let mut backend = self.begin(format!("set_track_solo {id} {soloed}"))?;
        let track = backend.track_mut(id)?;
        track.soloed = soloed;
        Ok(track.clone())
    }

    async fn get_tempo(&self) -> Result<Tempo, ApiError> {
        let backend = self.begin("get_tempo".to_string())?;
        Ok(backend.tempo)
    }

    async fn set_tempo(&self, tempo: Tempo) -> Result<Tempo, ApiError> {
        let mut backend = self.begin(format!("set_tempo {}", tempo.bpm()))?;
        backend.tempo = tempo;
        Ok(tempo)
    }

    async fn get_clip(&self, id: &ClipId) -> Result<Clip, ApiError> {
        let backend = self.begin(format!("get_clip {id}"))?;
        backend
            .clips
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                entity: "clip",
                id: id.to_string(),
            })
    }

    async fn list_clips(&self, track_id: &TrackId) -> Result<Vec<Clip>, ApiError> {
        let mut backend = self.begin(format!("list_clips {track_id}"))?;
        backend.track_mut(track_id)?;
        let mut clips: Vec<Clip> = backend
            .clips
            .values()
            .filter(|clip| clip.track_id == *track_id)
            .cloned()
            .collect();
        clips.sort_by(|a, b| a.start_beats.total_cmp(&b.start_beats));
        Ok(clips)
    }

    async fn create_clip(&self, clip: &NewClip) -> Result<Clip, ApiError> {
        let mut backend = self.begin(format!("create_clip {}", clip.name))?;
        if !backend.tracks.contains_key(clip.track_id.as_str()) {
            return Err(ApiError::NotFound {
                entity: "track",
                id: clip.track_id.to_string(),
            });
        }
        let raw = backend.next("clip");
        let id = ClipId::new(raw).map_err(|e| ApiError::Decode(e.to_string()))?;
        let created = Clip {
            id: id.clone(),
            track_id: clip.track_id.clone(),
            name: clip.name.clone(),
            start_beats: clip.start_beats,
            length_beats: clip.length_beats,
        };
        backend.clips.insert(id.as_str().to_string(), created.clone());
        Ok(created)
    }

    async fn delete_clip(&self, id: &ClipId) -> Result<(), ApiError> {
        let mut backend = self.begin(format!("delete_clip {id}"))?;
        backend
            .clips
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound {
                entity: "clip",
                id: id.to_string(),
            })
    }
}
