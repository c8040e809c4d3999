//! The five live telemetry channels and their wire identities.

use std::fmt;

use crate::domain::foundation::EndpointKey;

/// One-way typed live data feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelemetryChannel {
    Spectrum,
    Waveform,
    Meters,
    Transport,
    Analytics,
}

impl TelemetryChannel {
    pub const ALL: [TelemetryChannel; 5] = [
        TelemetryChannel::Spectrum,
        TelemetryChannel::Waveform,
        TelemetryChannel::Meters,
        TelemetryChannel::Transport,
        TelemetryChannel::Analytics,
    ];

    /// Value of the `type` discriminant carried by this channel's messages.
    pub fn tag(&self) -> &'static str {
        match self {
            TelemetryChannel::Spectrum => "spectrum",
            TelemetryChannel::Waveform => "waveform",
            TelemetryChannel::Meters => "meters",
            TelemetryChannel::Transport => "transport",
            TelemetryChannel::Analytics => "analytics",
        }
    }

    /// URL path appended to the streaming base address.
    pub fn path(&self) -> &'static str {
        match self {
            TelemetryChannel::Spectrum => "/ws/spectrum",
            TelemetryChannel::Waveform => "/ws/waveform",
            TelemetryChannel::Meters => "/ws/meters",
            TelemetryChannel::Transport => "/ws/transport",
            TelemetryChannel::Analytics => "/ws/analytics",
        }
    }

    /// Stable pooling key for the registry.
    pub fn endpoint_key(&self) -> EndpointKey {
        EndpointKey::from_static(self.tag())
    }

    /// Full socket URL for this channel under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }

    /// Reverse lookup from a wire tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }
}

impl fmt::Display for TelemetryChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        assert_eq!(
            TelemetryChannel::Meters.url("ws://localhost:8000/"),
            "ws://localhost:8000/ws/meters"
        );
    }

    #[test]
    fn tags_round_trip() {
        for channel in TelemetryChannel::ALL {
            assert_eq!(TelemetryChannel::from_tag(channel.tag()), Some(channel));
        }
        assert_eq!(TelemetryChannel::from_tag("video"), None);
    }

    #[test]
    fn endpoint_keys_are_distinct() {
        let mut keys: Vec<_> = TelemetryChannel::ALL
            .iter()
            .map(|c| c.endpoint_key())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 5);
    }
}
