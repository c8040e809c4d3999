//! Cross-surface state mirroring.
//!
//! # Architecture
//!
//! ```text
//!                 broadcast::Sender<BroadcastEnvelope>
//!        ┌───────────────┬──────────────┴──────────┐
//!   main surface     popout A                  popout B
//!   (pump task)     (pump task)               (pump task)
//!        │               │                         │
//!   routes[key]     routes[key]               routes[key]
//! ```
//!
//! Every surface owns one receiver and one pump task. The pump drops
//! envelopes the surface published itself and dispatches the rest to the
//! handlers registered for the envelope's channel key. A single channel and
//! a single pump per surface keep same-key envelopes in publish order.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::application::handler_set::{HandlerSet, Subscription};
use crate::domain::foundation::{SurfaceId, WindowId};
use crate::domain::sync::{BroadcastEnvelope, WindowKind, WindowLifecycleEvent, WINDOW_LIFECYCLE_KEY};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("Payload for '{key}' is not serializable: {reason}")]
    Serialize { key: String, reason: String },

    #[error("Surface {0} is closed")]
    SurfaceClosed(SurfaceId),
}

type Routes = Arc<Mutex<HashMap<String, HandlerSet<Value>>>>;

/// Shared channel all surfaces of one application attach to.
#[derive(Clone)]
pub struct CrossWindowBus {
    sender: broadcast::Sender<BroadcastEnvelope>,
}

impl CrossWindowBus {
    pub const DEFAULT_CAPACITY: usize = 256;

    /// `capacity` bounds how far a slow surface may fall behind before it
    /// starts skipping envelopes.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Attaches the main surface.
    pub fn attach_main(&self) -> Surface {
        let surface = self.attach(WindowKind::Main, Vec::new());
        tracing::info!(surface = %surface.id(), "Main surface attached");
        surface
    }

    /// Attaches a popout surface and announces it on the lifecycle key.
    pub fn open_popout(&self, panel_ids: Vec<String>) -> Surface {
        let surface = self.attach(WindowKind::Popout, panel_ids.clone());
        let event = WindowLifecycleEvent::PopoutOpened {
            window_id: surface.window_id(),
            panel_ids,
        };
        if let Err(e) = surface.publish(WINDOW_LIFECYCLE_KEY, &event) {
            tracing::warn!(surface = %surface.id(), error = %e, "Failed to announce popout");
        }
        tracing::info!(surface = %surface.id(), window = %surface.window_id(), "Popout opened");
        surface
    }

    /// Surfaces currently attached.
    pub fn surface_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn attach(&self, kind: WindowKind, panel_ids: Vec<String>) -> Surface {
        let id = SurfaceId::new();
        let routes: Routes = Arc::new(Mutex::new(HashMap::new()));
        // Subscribe before spawning so nothing published after attach is missed.
        let receiver = self.sender.subscribe();
        let pump = tokio::spawn(pump(id, receiver, Arc::clone(&routes)));

        Surface {
            inner: Arc::new(SurfaceInner {
                id,
                window_id: WindowId::new(),
                kind,
                panel_ids,
                sender: self.sender.clone(),
                routes,
                pump: Mutex::new(Some(pump)),
                closed: AtomicBool::new(false),
            }),
        }
    }
}

impl Default for CrossWindowBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

async fn pump(id: SurfaceId, mut receiver: broadcast::Receiver<BroadcastEnvelope>, routes: Routes) {
    loop {
        match receiver.recv().await {
            Ok(envelope) => {
                if envelope.is_from(&id) {
                    continue;
                }
                let handlers = routes.lock().get(&envelope.channel_key).cloned();
                if let Some(handlers) = handlers {
                    handlers.emit(&envelope.payload);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(surface = %id, skipped, "Surface fell behind; envelopes dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

struct SurfaceInner {
    id: SurfaceId,
    window_id: WindowId,
    kind: WindowKind,
    panel_ids: Vec<String>,
    sender: broadcast::Sender<BroadcastEnvelope>,
    routes: Routes,
    pump: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl SurfaceInner {
    /// Announces `popout-closed` for popouts and stops the pump. Runs once.
    fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.kind == WindowKind::Popout {
            let event = WindowLifecycleEvent::PopoutClosed {
                window_id: self.window_id,
            };
            match serde_json::to_value(&event) {
                Ok(payload) => self.send(BroadcastEnvelope::new(WINDOW_LIFECYCLE_KEY, payload, self.id)),
                Err(e) => tracing::warn!(error = %e, "Failed to encode popout-closed"),
            }
        }
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
        tracing::info!(surface = %self.id, kind = ?self.kind, "Surface closed");
    }

    fn send(&self, envelope: BroadcastEnvelope) {
        let key = envelope.channel_key.clone();
        match self.sender.send(envelope) {
            Ok(receivers) => {
                tracing::trace!(surface = %self.id, key = %key, receivers, "Envelope published");
            }
            Err(_) => {
                tracing::debug!(surface = %self.id, key = %key, "No surface attached");
            }
        }
    }
}

// Dropping the last handle counts as closing the window.
impl Drop for SurfaceInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// One attached surface. Clones share the same attachment.
#[derive(Clone)]
pub struct Surface {
    inner: Arc<SurfaceInner>,
}

impl Surface {
    pub fn id(&self) -> SurfaceId {
        self.inner.id
    }

    pub fn window_id(&self) -> WindowId {
        self.inner.window_id
    }

    pub fn kind(&self) -> WindowKind {
        self.inner.kind
    }

    pub fn is_main(&self) -> bool {
        self.inner.kind == WindowKind::Main
    }

    pub fn panel_ids(&self) -> &[String] {
        &self.inner.panel_ids
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Broadcasts `value` to every other surface under `key`.
    ///
    /// # Errors
    ///
    /// - `BusError::Serialize` if `value` does not serialize to JSON
    /// - `BusError::SurfaceClosed` after [`Surface::close`]
    pub fn publish<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), BusError> {
        if self.is_closed() {
            return Err(BusError::SurfaceClosed(self.inner.id));
        }
        let payload = serde_json::to_value(value).map_err(|e| BusError::Serialize {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.send(BroadcastEnvelope::new(key, payload, self.inner.id));
        Ok(())
    }

    /// Registers `handler` for envelopes on `key` published by other surfaces.
    ///
    /// Payloads that do not decode into `T` are logged and dropped.
    pub fn subscribe<T, F>(&self, key: &str, handler: F) -> Subscription
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let surface = self.inner.id;
        let owned_key = key.to_string();
        let decode = move |payload: &Value| match T::deserialize(payload) {
            Ok(value) => handler(value),
            Err(e) => {
                tracing::warn!(
                    surface = %surface,
                    key = %owned_key,
                    error = %e,
                    "Dropping undecodable envelope"
                );
            }
        };

        let handlers = self
            .inner
            .routes
            .lock()
            .entry(key.to_string())
            .or_default()
            .clone();
        handlers.add(decode)
    }

    /// Detaches the surface. Popouts announce `popout-closed` first.
    ///
    /// Idempotent. Dropping the last clone of a surface has the same effect.
    pub fn close(&self) {
        self.inner.shutdown();
    }

    fn send(&self, envelope: BroadcastEnvelope) {
        self.inner.send(envelope);
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("id", &self.inner.id)
            .field("window_id", &self.inner.window_id)
            .field("kind", &self.inner.kind)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Volume {
        track: String,
        db: f32,
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn collect<T>(surface: &Surface, key: &str) -> (mpsc::UnboundedReceiver<T>, Subscription)
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let sub = surface.subscribe(key, move |value: T| {
            let _ = tx.send(value);
        });
        (rx, sub)
    }

    #[tokio::test]
    async fn delivers_to_other_surfaces_but_not_origin() {
        let bus = CrossWindowBus::default();
        let main = bus.attach_main();
        let popout = bus.open_popout(vec!["mixer".into()]);

        let (mut at_main, _a) = collect::<Volume>(&main, "volume");
        let (mut at_popout, _b) = collect::<Volume>(&popout, "volume");

        let v = Volume {
            track: "drums".into(),
            db: -3.0,
        };
        popout.publish("volume", &v).unwrap();

        assert_eq!(at_main.recv().await, Some(v));
        settle().await;
        assert!(at_popout.try_recv().is_err(), "origin must not see its own publish");
    }

    #[tokio::test]
    async fn same_key_arrives_in_publish_order() {
        let bus = CrossWindowBus::default();
        let main = bus.attach_main();
        let popout = bus.open_popout(vec![]);
        let (mut received, _s) = collect::<u32>(&popout, "seq");

        for n in 0..50u32 {
            main.publish("seq", &n).unwrap();
        }

        let mut got = Vec::new();
        while got.len() < 50 {
            got.push(received.recv().await.unwrap());
        }
        assert_eq!(got, (0..50).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn handlers_only_see_their_key() {
        let bus = CrossWindowBus::default();
        let main = bus.attach_main();
        let popout = bus.open_popout(vec![]);
        let (mut tempo, _s) = collect::<f64>(&main, "tempo");

        popout.publish("volume", &1.0).unwrap();
        popout.publish("tempo", &128.0).unwrap();

        assert_eq!(tempo.recv().await, Some(128.0));
    }

    #[tokio::test]
    async fn undecodable_payload_is_dropped() {
        let bus = CrossWindowBus::default();
        let main = bus.attach_main();
        let popout = bus.open_popout(vec![]);
        let (mut volumes, _s) = collect::<Volume>(&main, "volume");

        popout.publish("volume", &"not a volume").unwrap();
        let good = Volume {
            track: "bass".into(),
            db: 0.0,
        };
        popout.publish("volume", &good).unwrap();

        assert_eq!(volumes.recv().await, Some(good));
    }

    #[tokio::test]
    async fn unsubscribed_handler_is_not_called() {
        let bus = CrossWindowBus::default();
        let main = bus.attach_main();
        let popout = bus.open_popout(vec![]);
        let (mut first, sub) = collect::<u8>(&main, "k");
        let (mut second, _keep) = collect::<u8>(&main, "k");

        sub.unsubscribe();
        popout.publish("k", &7u8).unwrap();

        assert_eq!(second.recv().await, Some(7));
        assert!(first.try_recv().is_err());
    }

    #[tokio::test]
    async fn popout_lifecycle_is_announced() {
        let bus = CrossWindowBus::default();
        let main = bus.attach_main();
        let (mut events, _s) = collect::<WindowLifecycleEvent>(&main, WINDOW_LIFECYCLE_KEY);

        let popout = bus.open_popout(vec!["spectrum".into()]);
        assert_eq!(
            events.recv().await,
            Some(WindowLifecycleEvent::PopoutOpened {
                window_id: popout.window_id(),
                panel_ids: vec!["spectrum".into()],
            })
        );

        popout.close();
        popout.close();
        assert_eq!(
            events.recv().await,
            Some(WindowLifecycleEvent::PopoutClosed {
                window_id: popout.window_id()
            })
        );
        settle().await;
        assert!(events.try_recv().is_err());
        assert!(matches!(
            popout.publish("k", &1),
            Err(BusError::SurfaceClosed(_))
        ));
    }

    #[tokio::test]
    async fn closed_surface_stops_receiving() {
        let bus = CrossWindowBus::default();
        let main = bus.attach_main();
        let popout = bus.open_popout(vec![]);
        let (mut received, _s) = collect::<u8>(&popout, "k");

        popout.close();
        main.publish("k", &1u8).unwrap();
        settle().await;

        assert!(received.try_recv().is_err());
    }

    #[tokio::test]
    async fn surface_count_tracks_attachments() {
        let bus = CrossWindowBus::default();
        let main = bus.attach_main();
        let popout = bus.open_popout(vec![]);
        assert_eq!(bus.surface_count(), 2);

        drop(popout);
        settle().await;
        assert_eq!(bus.surface_count(), 1);
        drop(main);
    }
}
