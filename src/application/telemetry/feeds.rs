//! The five standard feeds, opened and closed together.

use super::feed::{AnalyticsFeed, FeedValue, MeterFeed, SpectrumFeed, TelemetryFeed, TransportFeed, WaveformFeed};
use crate::application::connection_registry::ConnectionRegistry;
use crate::domain::connection::ReconnectPolicy;
use crate::domain::telemetry::TelemetryChannel;

/// One feed per telemetry channel, each on its own pooled socket.
pub struct TelemetryFeeds {
    pub spectrum: SpectrumFeed,
    pub waveform: WaveformFeed,
    pub meters: MeterFeed,
    pub transport: TransportFeed,
    pub analytics: AnalyticsFeed,
}

impl TelemetryFeeds {
    pub fn open(registry: &ConnectionRegistry, base_url: &str, policy: ReconnectPolicy) -> Self {
        tracing::info!(base_url, "Opening telemetry feeds");
        Self {
            spectrum: TelemetryFeed::open(registry, base_url, policy.clone()),
            waveform: TelemetryFeed::open(registry, base_url, policy.clone()),
            meters: TelemetryFeed::open(registry, base_url, policy.clone()),
            transport: TelemetryFeed::open(registry, base_url, policy.clone()),
            analytics: TelemetryFeed::open(registry, base_url, policy),
        }
    }

    /// Detaches every feed and tears down their pooled sockets.
    pub fn close(&self, registry: &ConnectionRegistry) {
        self.spectrum.detach();
        self.waveform.detach();
        self.meters.detach();
        self.transport.detach();
        self.analytics.detach();
        for channel in TelemetryChannel::ALL {
            registry.disconnect(&channel.endpoint_key());
        }
    }

    /// Per-channel connection flags in `TelemetryChannel::ALL` order.
    pub fn connection_flags(&self) -> [(TelemetryChannel, bool); 5] {
        [
            flag(&self.spectrum),
            flag(&self.waveform),
            flag(&self.meters),
            flag(&self.transport),
            flag(&self.analytics),
        ]
    }

    pub fn connected_count(&self) -> usize {
        self.connection_flags().iter().filter(|(_, up)| *up).count()
    }
}

fn flag<T: FeedValue>(feed: &TelemetryFeed<T>) -> (TelemetryChannel, bool) {
    (feed.channel(), feed.is_connected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::websocket::InMemoryTransport;
    use crate::domain::connection::ConnectionState;
    use std::sync::Arc;
    use std::time::Duration;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn opens_one_socket_per_channel() {
        let transport = InMemoryTransport::new();
        let registry = ConnectionRegistry::new(Arc::new(transport.clone()));
        let feeds = TelemetryFeeds::open(&registry, "ws://studio.test/", ReconnectPolicy::default());
        settle().await;

        assert_eq!(registry.len(), 5);
        assert_eq!(feeds.connected_count(), 5);
        let mut urls = transport.opened_urls();
        urls.sort();
        assert_eq!(
            urls,
            vec![
                "ws://studio.test/ws/analytics",
                "ws://studio.test/ws/meters",
                "ws://studio.test/ws/spectrum",
                "ws://studio.test/ws/transport",
                "ws://studio.test/ws/waveform",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn failure_on_one_channel_leaves_others_untouched() {
        let transport = InMemoryTransport::new();
        let registry = ConnectionRegistry::new(Arc::new(transport.clone()));
        let feeds = TelemetryFeeds::open(&registry, "ws://studio.test", ReconnectPolicy::default());

        let mut peers = Vec::new();
        for _ in 0..5 {
            peers.push(transport.next_peer().await.unwrap());
        }
        settle().await;

        let meters_idx = peers.iter().position(|p| p.url.ends_with("/meters")).unwrap();
        let meters_peer = peers.remove(meters_idx);
        transport.set_refusing(true);
        meters_peer.close();
        settle().await;

        assert!(!feeds.meters.is_connected());
        assert_eq!(feeds.connected_count(), 4);

        let transport_peer = peers.iter().find(|p| p.url.ends_with("/transport")).unwrap();
        transport_peer.send_text(
            r#"{"type":"transport","isPlaying":true,"positionSeconds":1.0,"positionBeats":2.0,"tempoBpm":120.0}"#,
        );
        settle().await;
        assert!(feeds.transport.value().unwrap().is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn close_tears_down_all_sockets() {
        let transport = InMemoryTransport::new();
        let registry = ConnectionRegistry::new(Arc::new(transport.clone()));
        let feeds = TelemetryFeeds::open(&registry, "ws://studio.test", ReconnectPolicy::default());
        settle().await;

        feeds.close(&registry);

        assert!(registry.is_empty());
        assert_eq!(feeds.spectrum.client().state(), ConnectionState::Disconnected);
    }
}
