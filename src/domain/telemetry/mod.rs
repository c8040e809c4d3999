//! Telemetry domain - channel identities and the typed inbound protocol.

mod channel;
mod messages;

pub use channel::TelemetryChannel;
pub use messages::{
    ChannelLevel, MeterLevels, ParseError, SpectrumFrame, SystemAnalytics, TelemetryMessage,
    TransportPosition, WaveformFrame,
};
