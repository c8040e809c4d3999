//! Integration tests for pooled telemetry sockets.
//!
//! Drives the registry and the five feeds against the in-memory transport
//! with a paused clock, so reconnect timing is deterministic.

use std::sync::Arc;
use std::time::Duration;

use studio_sync::adapters::{InMemoryTransport, PeerHandle};
use studio_sync::application::{ConnectionOptions, ConnectionRegistry, TelemetryFeeds};
use studio_sync::domain::connection::{ConnectionState, ReconnectPolicy};
use studio_sync::domain::telemetry::{SpectrumFrame, TelemetryChannel};

const BASE_URL: &str = "ws://studio.test";

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn drain_peers(transport: &InMemoryTransport) -> Vec<PeerHandle> {
    std::iter::from_fn(|| transport.try_next_peer()).collect()
}

fn take_peer(peers: &mut Vec<PeerHandle>, channel: TelemetryChannel) -> PeerHandle {
    let index = peers
        .iter()
        .position(|peer| peer.url.ends_with(channel.path()))
        .expect("peer for channel");
    peers.remove(index)
}

#[tokio::test(start_paused = true)]
async fn feeds_reduce_frames_per_channel() {
    let transport = InMemoryTransport::new();
    let registry = ConnectionRegistry::new(Arc::new(transport.clone()));
    let feeds = TelemetryFeeds::open(&registry, BASE_URL, ReconnectPolicy::default());
    settle().await;

    let mut peers = drain_peers(&transport);
    assert_eq!(peers.len(), 5);
    assert_eq!(feeds.connected_count(), 5);

    let spectrum = take_peer(&mut peers, TelemetryChannel::Spectrum);
    spectrum.send_text(r#"{"type":"spectrum","bins":[0.5,0.25],"sampleRate":48000}"#);
    spectrum.send_text(r#"{"type":"spectrum","bins":[0.75],"sampleRate":48000}"#);
    // Valid frame on the wrong socket is not attributed to another feed
    spectrum.send_text(r#"{"type":"meters","channels":[]}"#);
    spectrum.send_text("not json");
    settle().await;

    assert_eq!(
        feeds.spectrum.value(),
        Some(SpectrumFrame {
            bins: vec![0.75],
            sample_rate: 48000,
            fft_size: None,
        })
    );
    assert!(feeds.meters.value().is_none());
    assert!(feeds.spectrum.is_connected());
}

#[tokio::test(start_paused = true)]
async fn dropped_socket_reconnects_after_backoff() {
    let transport = InMemoryTransport::new();
    let registry = ConnectionRegistry::new(Arc::new(transport.clone()));
    let feeds = TelemetryFeeds::open(&registry, BASE_URL, ReconnectPolicy::default());
    settle().await;

    let mut peers = drain_peers(&transport);
    take_peer(&mut peers, TelemetryChannel::Transport).close();
    settle().await;

    assert!(!feeds.transport.is_connected());
    assert_eq!(
        feeds.transport.client().state(),
        ConnectionState::Reconnecting
    );
    assert_eq!(feeds.connected_count(), 4);

    tokio::time::sleep(Duration::from_millis(1000)).await;
    settle().await;

    assert_eq!(transport.attempts(), 6);
    assert!(feeds.transport.is_connected());
    assert!(registry.health_status().all_connected());
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_report_failed_health() {
    let transport = InMemoryTransport::new();
    transport.set_refusing(true);
    let registry = ConnectionRegistry::new(Arc::new(transport.clone()));

    let options = ConnectionOptions::new(TelemetryChannel::Meters.url(BASE_URL))
        .with_reconnect(ReconnectPolicy::default().with_max_attempts(2));
    let client = registry.get_connection(&TelemetryChannel::Meters.endpoint_key(), options);

    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(client.state(), ConnectionState::Failed);
    assert_eq!(transport.attempts(), 3);
    let health = registry.health_status();
    assert_eq!(health.total, 1);
    assert_eq!(health.count(ConnectionState::Failed), 1);
    assert!(!health.all_connected());
}

#[tokio::test(start_paused = true)]
async fn closing_feeds_releases_the_pool() {
    let transport = InMemoryTransport::new();
    let registry = ConnectionRegistry::new(Arc::new(transport.clone()));
    let feeds = TelemetryFeeds::open(&registry, BASE_URL, ReconnectPolicy::default());
    settle().await;
    let peers = drain_peers(&transport);

    feeds.close(&registry);
    settle().await;

    assert!(registry.is_empty());
    assert!(peers.iter().all(PeerHandle::is_client_gone));
    assert_eq!(
        feeds.analytics.client().state(),
        ConnectionState::Disconnected
    );
}
