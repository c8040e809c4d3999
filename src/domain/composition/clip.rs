//! Clip entity placed on a track.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ClipId, TrackId, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: ClipId,
    pub track_id: TrackId,
    pub name: String,
    pub start_beats: f64,
    pub length_beats: f64,
}

impl Clip {
    pub fn to_new(&self) -> NewClip {
        NewClip {
            track_id: self.track_id.clone(),
            name: self.name.clone(),
            start_beats: self.start_beats,
            length_beats: self.length_beats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClip {
    pub track_id: TrackId,
    pub name: String,
    pub start_beats: f64,
    pub length_beats: f64,
}

impl NewClip {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start_beats < 0.0 {
            return Err(ValidationError::invalid_format(
                "start_beats",
                "must not be negative",
            ));
        }
        if self.length_beats <= 0.0 {
            return Err(ValidationError::invalid_format(
                "length_beats",
                "must be positive",
            ));
        }
        Ok(())
    }
}
