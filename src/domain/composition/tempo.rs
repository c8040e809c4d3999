use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Project tempo in beats per minute.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Tempo(f64);

impl Tempo {
    pub const MIN_BPM: f64 = 20.0;
    pub const MAX_BPM: f64 = 999.0;

    pub fn new(bpm: f64) -> Result<Self, ValidationError> {
        if !bpm.is_finite() || !(Self::MIN_BPM..=Self::MAX_BPM).contains(&bpm) {
            return Err(ValidationError::invalid_format(
                "tempo_bpm",
                format!("must be between {} and {}", Self::MIN_BPM, Self::MAX_BPM),
            ));
        }
        Ok(Self(bpm))
    }

    pub fn bpm(&self) -> f64 {
        self.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(120.0)
    }
}

impl TryFrom<f64> for Tempo {
    type Error = ValidationError;

    fn try_from(bpm: f64) -> Result<Self, Self::Error> {
        Tempo::new(bpm)
    }
}

impl From<Tempo> for f64 {
    fn from(tempo: Tempo) -> f64 {
        tempo.0
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_musical_range() {
        assert_eq!(Tempo::new(120.0).unwrap().bpm(), 120.0);
        assert!(Tempo::new(0.0).is_err());
        assert!(Tempo::new(f64::NAN).is_err());
        assert!(Tempo::new(1200.0).is_err());
    }

    #[test]
    fn deserialization_validates() {
        assert!(serde_json::from_str::<Tempo>("128.5").is_ok());
        assert!(serde_json::from_str::<Tempo>("-4").is_err());
    }
}
