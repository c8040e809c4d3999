//! Last-value-wins reduction of one telemetry channel.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::application::connection_registry::ConnectionRegistry;
use crate::application::handler_set::Subscription;
use crate::application::socket_client::{ConnectionOptions, SocketClient};
use crate::domain::connection::{ConnectionState, ReconnectPolicy};
use crate::domain::telemetry::{
    MeterLevels, SpectrumFrame, SystemAnalytics, TelemetryChannel, TelemetryMessage,
    TransportPosition, WaveformFrame,
};

/// Payload type carried by exactly one telemetry channel.
pub trait FeedValue: Clone + Send + Sync + 'static {
    const CHANNEL: TelemetryChannel;

    /// The payload, when `message` belongs to this channel.
    fn extract(message: &TelemetryMessage) -> Option<Self>;
}

macro_rules! feed_value {
    ($payload:ty, $variant:ident) => {
        impl FeedValue for $payload {
            const CHANNEL: TelemetryChannel = TelemetryChannel::$variant;

            fn extract(message: &TelemetryMessage) -> Option<Self> {
                match message {
                    TelemetryMessage::$variant(frame) => Some(frame.clone()),
                    _ => None,
                }
            }
        }
    };
}

feed_value!(SpectrumFrame, Spectrum);
feed_value!(WaveformFrame, Waveform);
feed_value!(MeterLevels, Meters);
feed_value!(TransportPosition, Transport);
feed_value!(SystemAnalytics, Analytics);

/// Latest value of one channel plus its connection flag.
///
/// Messages of other variants arriving on the same socket are ignored.
pub struct TelemetryFeed<T: FeedValue> {
    client: SocketClient,
    value: watch::Receiver<Option<T>>,
    connected: watch::Receiver<bool>,
    subscription: Mutex<Option<Subscription>>,
}

pub type SpectrumFeed = TelemetryFeed<SpectrumFrame>;
pub type WaveformFeed = TelemetryFeed<WaveformFrame>;
pub type MeterFeed = TelemetryFeed<MeterLevels>;
pub type TransportFeed = TelemetryFeed<TransportPosition>;
pub type AnalyticsFeed = TelemetryFeed<SystemAnalytics>;

impl<T: FeedValue> TelemetryFeed<T> {
    /// Attaches to the pooled client for `T::CHANNEL`, connecting it if needed.
    pub fn open(registry: &ConnectionRegistry, base_url: &str, policy: ReconnectPolicy) -> Self {
        let channel = T::CHANNEL;
        let options = ConnectionOptions::new(channel.url(base_url)).with_reconnect(policy);
        let client = registry.get_connection(&channel.endpoint_key(), options);

        let (value_tx, value) = watch::channel(None);
        let (connected_tx, connected) = watch::channel(false);
        let connected_tx = Arc::new(connected_tx);
        let observed = Arc::new(AtomicBool::new(false));

        let on_message = client.on_message(move |message| {
            if let Some(latest) = T::extract(message) {
                value_tx.send_replace(Some(latest));
            }
        });
        let state_tx = Arc::clone(&connected_tx);
        let state_observed = Arc::clone(&observed);
        let on_state = client.on_state_change(move |state| {
            state_tx.send_modify(|flag| {
                state_observed.store(true, Ordering::Release);
                *flag = *state == ConnectionState::Connected;
            });
        });
        // The client may have connected before the handler was registered.
        seed_connected(&connected_tx, &observed, client.is_connected());

        tracing::debug!(channel = %channel, "Telemetry feed attached");
        Self {
            client,
            value,
            connected,
            subscription: Mutex::new(Some(Subscription::merge(vec![on_message, on_state]))),
        }
    }

    pub fn channel(&self) -> TelemetryChannel {
        T::CHANNEL
    }

    /// Most recent payload, `None` until the first message.
    pub fn value(&self) -> Option<T> {
        self.value.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn subscribe_value(&self) -> watch::Receiver<Option<T>> {
        self.value.clone()
    }

    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.connected.clone()
    }

    pub fn client(&self) -> &SocketClient {
        &self.client
    }

    /// Stops reducing messages. The pooled client stays up.
    pub fn detach(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.unsubscribe();
            tracing::debug!(channel = %T::CHANNEL, "Telemetry feed detached");
        }
    }
}

impl<T: FeedValue> Drop for TelemetryFeed<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Sets the initial flag unless a state change already reported a newer one.
fn seed_connected(tx: &watch::Sender<bool>, observed: &AtomicBool, current: bool) {
    tx.send_if_modified(|flag| {
        if observed.load(Ordering::Acquire) {
            return false;
        }
        *flag = current;
        current
    });
}
