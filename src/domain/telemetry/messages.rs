//! Inbound telemetry message protocol.
//!
//! Every frame is a JSON object `{ "type": <tag>, ...fields }`. Frames are
//! decoded into the exhaustive [`TelemetryMessage`] union; unknown tags are
//! rejected with [`ParseError::UnknownType`] rather than ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::TelemetryChannel;

/// Malformed inbound frame. Logged and dropped by the socket client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Frame is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Frame has no string 'type' field")]
    MissingType,

    #[error("Unknown message type '{0}'")]
    UnknownType(String),

    #[error("Invalid '{tag}' payload: {reason}")]
    InvalidPayload { tag: String, reason: String },

    #[error("Binary frames are not supported")]
    Binary,
}

/// All messages the telemetry endpoints can send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryMessage {
    Spectrum(SpectrumFrame),
    Waveform(WaveformFrame),
    Meters(MeterLevels),
    Transport(TransportPosition),
    Analytics(SystemAnalytics),
}

impl TelemetryMessage {
    /// Decodes one text frame.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ParseError::MissingType)?
            .to_string();

        if TelemetryChannel::from_tag(&tag).is_none() {
            return Err(ParseError::UnknownType(tag));
        }

        serde_json::from_value(value).map_err(|e| ParseError::InvalidPayload {
            tag,
            reason: e.to_string(),
        })
    }

    /// Channel this message belongs to.
    pub fn channel(&self) -> TelemetryChannel {
        match self {
            TelemetryMessage::Spectrum(_) => TelemetryChannel::Spectrum,
            TelemetryMessage::Waveform(_) => TelemetryChannel::Waveform,
            TelemetryMessage::Meters(_) => TelemetryChannel::Meters,
            TelemetryMessage::Transport(_) => TelemetryChannel::Transport,
            TelemetryMessage::Analytics(_) => TelemetryChannel::Analytics,
        }
    }
}

/// FFT magnitude bins for the spectrum analyser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpectrumFrame {
    pub bins: Vec<f32>,
    pub sample_rate: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fft_size: Option<u32>,
}

/// Downsampled waveform window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveformFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Peak/RMS levels for every metered channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterLevels {
    pub channels: Vec<ChannelLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelLevel {
    pub id: String,
    pub peak_db: f32,
    pub rms_db: f32,
    #[serde(default)]
    pub clipping: bool,
}

/// Playhead position and transport flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportPosition {
    pub is_playing: bool,
    #[serde(default)]
    pub is_recording: bool,
    pub position_seconds: f64,
    pub position_beats: f64,
    pub tempo_bpm: f64,
}

/// Engine load figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemAnalytics {
    pub cpu_percent: f32,
    pub memory_mb: f32,
    #[serde(default)]
    pub buffer_underruns: u64,
    pub latency_ms: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_meter_frame() {
        let msg = TelemetryMessage::parse(
            r#"{"type":"meters","channels":[{"id":"master","peakDb":-3.5,"rmsDb":-12.0}]}"#,
        )
        .unwrap();

        match msg {
            TelemetryMessage::Meters(levels) => {
                assert_eq!(levels.channels.len(), 1);
                assert_eq!(levels.channels[0].id, "master");
                assert!(!levels.channels[0].clipping);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_transport_frame() {
        let msg = TelemetryMessage::parse(
            r#"{"type":"transport","isPlaying":true,"positionSeconds":12.5,"positionBeats":25.0,"tempoBpm":120.0}"#,
        )
        .unwrap();
        assert_eq!(msg.channel(), TelemetryChannel::Transport);
    }

    #[test]
    fn rejects_unknown_type_explicitly() {
        let err = TelemetryMessage::parse(r#"{"type":"video","frame":1}"#).unwrap_err();
        assert_eq!(err, ParseError::UnknownType("video".to_string()));
    }

    #[test]
    fn rejects_missing_type() {
        let err = TelemetryMessage::parse(r#"{"bins":[1.0]}"#).unwrap_err();
        assert_eq!(err, ParseError::MissingType);
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            TelemetryMessage::parse("{not json"),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn rejects_payload_with_wrong_shape() {
        let err = TelemetryMessage::parse(r#"{"type":"spectrum","bins":"loud"}"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidPayload { ref tag, .. } if tag == "spectrum"));
    }

    #[test]
    fn serializes_with_type_tag() {
        let msg = TelemetryMessage::Analytics(SystemAnalytics {
            cpu_percent: 12.0,
            memory_mb: 512.0,
            buffer_underruns: 0,
            latency_ms: 5.3,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "analytics");
        assert_eq!(json["cpuPercent"], 12.0);
    }
}
