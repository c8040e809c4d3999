//! Track entity as exposed by the composition backend.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{TrackId, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    #[serde(default)]
    pub volume_db: f32,
    #[serde(default)]
    pub pan: f32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub soloed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Track {
    /// Creation payload that rebuilds this track (without its id).
    pub fn to_new(&self) -> NewTrack {
        NewTrack {
            name: self.name.clone(),
            volume_db: self.volume_db,
            pan: self.pan,
            muted: self.muted,
            soloed: self.soloed,
            color: self.color.clone(),
        }
    }

    pub fn apply(&mut self, patch: &TrackPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(volume_db) = patch.volume_db {
            self.volume_db = volume_db;
        }
        if let Some(pan) = patch.pan {
            self.pan = pan;
        }
        if let Some(color) = &patch.color {
            self.color = Some(color.clone());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrack {
    pub name: String,
    #[serde(default)]
    pub volume_db: f32,
    #[serde(default)]
    pub pan: f32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub soloed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl NewTrack {
    pub fn named(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        Ok(Self {
            name,
            volume_db: 0.0,
            pan: 0.0,
            muted: false,
            soloed: false,
            color: None,
        })
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_db: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl TrackPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.volume_db.is_none() && self.pan.is_none() && self.color.is_none()
    }

    /// Patch restoring the fields this patch touches to their values in `track`.
    ///
    /// A color that was unset cannot be cleared through a patch, so it is
    /// left out of the inverse.
    pub fn inverse_against(&self, track: &Track) -> TrackPatch {
        TrackPatch {
            name: self.name.as_ref().map(|_| track.name.clone()),
            volume_db: self.volume_db.map(|_| track.volume_db),
            pan: self.pan.map(|_| track.pan),
            color: self.color.as_ref().and_then(|_| track.color.clone()),
        }
    }

    /// Validates ranges: pan in [-1, 1], name non-blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::empty_field("name"));
            }
        }
        if let Some(pan) = self.pan {
            if !(-1.0..=1.0).contains(&pan) {
                return Err(ValidationError::invalid_format(
                    "pan",
                    "must be between -1.0 and 1.0",
                ));
            }
        }
        Ok(())
    }
}
