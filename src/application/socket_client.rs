//! Resilient streaming-socket client.
//!
//! One `SocketClient` owns one logical connection: it drives the
//! [`ConnectionState`] machine, reconnects with exponential backoff, decodes
//! inbound frames into [`TelemetryMessage`]s and fans them out to handlers.
//!
//! # Cancellation
//!
//! Every connection attempt runs under a generation number. Each async
//! continuation (socket open, inbound frame, reconnect timer) re-checks the
//! generation and the cleanup flag under the state lock before touching
//! anything, so a torn-down client cannot be resurrected by a late callback.
//!
//! # Notification order
//!
//! State handlers are invoked outside the state lock, and the next async
//! step of a transition is only spawned after its handlers have run.

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::handler_set::{HandlerSet, Subscription};
use crate::domain::connection::{
    Backoff, BackoffDecision, ConnectionError, ConnectionState, ReconnectPolicy,
};
use crate::domain::foundation::{EndpointKey, StateMachine};
use crate::domain::telemetry::{ParseError, TelemetryMessage};
use crate::ports::{InboundFrame, OutboundFrame, SocketChannel, SocketTransport};

/// How to reach an endpoint and how hard to retry.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionOptions {
    pub url: String,
    pub reconnect: ReconnectPolicy,
}

impl ConnectionOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect: ReconnectPolicy::default(),
        }
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }
}

struct ClientState {
    connection: ConnectionState,
    backoff: Backoff,
    generation: u64,
    outbound: Option<mpsc::UnboundedSender<OutboundFrame>>,
    driver: Option<JoinHandle<()>>,
    reconnect_timer: Option<JoinHandle<()>>,
}

struct ClientInner {
    endpoint: EndpointKey,
    url: String,
    transport: Arc<dyn SocketTransport>,
    cleaning_up: AtomicBool,
    state: Mutex<ClientState>,
    message_handlers: HandlerSet<TelemetryMessage>,
    state_handlers: HandlerSet<ConnectionState>,
}

/// Handle to one logical streaming connection. Clones share the connection.
///
/// Normally obtained from `ConnectionRegistry::get_connection`, which
/// guarantees one live client per endpoint.
#[derive(Clone)]
pub struct SocketClient {
    inner: Arc<ClientInner>,
}

impl SocketClient {
    /// Creates a disconnected client. Call [`SocketClient::connect`] to start.
    pub fn new(
        endpoint: EndpointKey,
        options: ConnectionOptions,
        transport: Arc<dyn SocketTransport>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                endpoint,
                url: options.url,
                transport,
                cleaning_up: AtomicBool::new(false),
                state: Mutex::new(ClientState {
                    connection: ConnectionState::Disconnected,
                    backoff: Backoff::new(options.reconnect),
                    generation: 0,
                    outbound: None,
                    driver: None,
                    reconnect_timer: None,
                }),
                message_handlers: HandlerSet::new(),
                state_handlers: HandlerSet::new(),
            }),
        }
    }

    pub fn endpoint(&self) -> &EndpointKey {
        &self.inner.endpoint
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.lock().connection
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Consecutive failed attempts since the last successful open.
    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.state.lock().backoff.attempts()
    }

    /// Delay the next failure will wait before reconnecting.
    pub fn current_delay(&self) -> Duration {
        self.inner.state.lock().backoff.current_delay()
    }

    /// True once [`SocketClient::disconnect`] has been called.
    pub fn is_cleaning_up(&self) -> bool {
        self.inner.cleaning_up.load(Ordering::SeqCst)
    }

    /// Starts connecting.
    ///
    /// No-op while `Connecting` or `Connected`. While `Reconnecting` the
    /// pending timer is cancelled and an attempt starts immediately. A client
    /// that has been disconnected or has `Failed` stays put.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self) {
        let inner = &self.inner;
        if inner.cleaning_up.load(Ordering::SeqCst) {
            tracing::debug!(endpoint = %inner.endpoint, "connect() ignored after disconnect");
            return;
        }

        let generation = {
            let mut state = inner.state.lock();
            match state.connection {
                ConnectionState::Connecting | ConnectionState::Connected => return,
                ConnectionState::Failed => {
                    tracing::warn!(
                        endpoint = %inner.endpoint,
                        "connect() ignored: reconnect attempts exhausted"
                    );
                    return;
                }
                ConnectionState::Reconnecting => {
                    if let Some(timer) = state.reconnect_timer.take() {
                        timer.abort();
                    }
                }
                ConnectionState::Disconnected => {}
            }
            inner.begin_attempt(&mut state)
        };

        if let Some(generation) = generation {
            inner.launch(generation);
        }
    }

    /// Tears the client down for good.
    ///
    /// Sets the cleanup flag, cancels any reconnect timer, closes the
    /// connection and forces `Disconnected`. Later calls to `connect` are
    /// ignored.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        if inner.cleaning_up.swap(true, Ordering::SeqCst) {
            return;
        }

        let changed = {
            let mut state = inner.state.lock();
            state.generation += 1;
            if let Some(timer) = state.reconnect_timer.take() {
                timer.abort();
            }
            if let Some(driver) = state.driver.take() {
                driver.abort();
            }
            if let Some(outbound) = state.outbound.take() {
                let _ = outbound.send(OutboundFrame::Close);
            }
            let previous = std::mem::replace(&mut state.connection, ConnectionState::Disconnected);
            previous != ConnectionState::Disconnected
        };

        tracing::info!(endpoint = %inner.endpoint, "Socket client disconnected");
        if changed {
            inner.state_handlers.emit(&ConnectionState::Disconnected);
        }
    }

    /// Sends a text frame.
    ///
    /// # Errors
    ///
    /// `ConnectionError::NotConnected` unless the client is `Connected`.
    pub fn send(&self, text: impl Into<String>) -> Result<(), ConnectionError> {
        let state = self.inner.state.lock();
        let not_connected = || ConnectionError::NotConnected {
            endpoint: self.inner.endpoint.clone(),
            state: state.connection,
        };

        if state.connection != ConnectionState::Connected {
            return Err(not_connected());
        }
        let outbound = state.outbound.as_ref().ok_or_else(not_connected)?;
        outbound
            .send(OutboundFrame::Text(text.into()))
            .map_err(|_| ConnectionError::Transport("connection already closed".to_string()))
    }

    /// Registers a handler for decoded inbound messages.
    pub fn on_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&TelemetryMessage) + Send + Sync + 'static,
    {
        self.inner.message_handlers.add(handler)
    }

    /// Registers a handler for state transitions.
    pub fn on_state_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ConnectionState) + Send + Sync + 'static,
    {
        self.inner.state_handlers.add(handler)
    }
}

impl fmt::Debug for SocketClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketClient")
            .field("endpoint", &self.inner.endpoint)
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .finish()
    }
}

impl ClientInner {
    fn is_current(&self, state: &ClientState, generation: u64) -> bool {
        !self.cleaning_up.load(Ordering::SeqCst) && state.generation == generation
    }

    fn still_current(&self, generation: u64) -> bool {
        let state = self.state.lock();
        self.is_current(&state, generation)
    }

    /// Validated transition. Returns the new state when it changed.
    fn transition(&self, state: &mut ClientState, next: ConnectionState) -> Option<ConnectionState> {
        if state.connection == next {
            return None;
        }
        match state.connection.transition_to(next) {
            Ok(next) => {
                tracing::debug!(
                    endpoint = %self.endpoint,
                    from = %state.connection,
                    to = %next,
                    "Connection state changed"
                );
                state.connection = next;
                Some(next)
            }
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "Rejected state change");
                None
            }
        }
    }

    fn emit_if_current(&self, generation: u64, changed: Option<ConnectionState>) {
        if let Some(state) = changed {
            if self.still_current(generation) {
                self.state_handlers.emit(&state);
            }
        }
    }

    /// Moves to `Connecting` under a fresh generation.
    fn begin_attempt(&self, state: &mut ClientState) -> Option<u64> {
        self.transition(state, ConnectionState::Connecting)?;
        state.generation += 1;
        Some(state.generation)
    }

    /// Announces `Connecting`, then spawns the driver for `generation`.
    fn launch(self: &Arc<Self>, generation: u64) {
        self.emit_if_current(generation, Some(ConnectionState::Connecting));

        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move { inner.drive(generation).await });

        let mut state = self.state.lock();
        if self.is_current(&state, generation) {
            state.driver = Some(handle);
        } else {
            handle.abort();
        }
    }

    /// One connection attempt: open, pump frames until close, then hand
    /// over to the backoff logic.
    async fn drive(self: Arc<Self>, generation: u64) {
        let SocketChannel {
            outbound,
            mut inbound,
        } = match self.transport.open(&self.url).await {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "Connection attempt failed");
                self.connection_lost(generation);
                return;
            }
        };

        let changed = {
            let mut state = self.state.lock();
            if !self.is_current(&state, generation) {
                return;
            }
            state.backoff.reset();
            state.outbound = Some(outbound);
            self.transition(&mut state, ConnectionState::Connected)
        };
        tracing::info!(endpoint = %self.endpoint, url = %self.url, "Socket connected");
        self.emit_if_current(generation, changed);

        while let Some(frame) = inbound.recv().await {
            if !self.still_current(generation) {
                return;
            }
            match frame {
                InboundFrame::Text(text) => self.dispatch(&text),
                InboundFrame::Binary(data) => {
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        bytes = data.len(),
                        error = %ParseError::Binary,
                        "Dropping inbound frame"
                    );
                }
                InboundFrame::Closed { code, reason } => {
                    tracing::info!(endpoint = %self.endpoint, ?code, %reason, "Socket closed by peer");
                    break;
                }
                InboundFrame::Error(e) => {
                    tracing::warn!(endpoint = %self.endpoint, error = %e, "Socket error");
                    break;
                }
            }
        }

        self.connection_lost(generation);
    }

    fn dispatch(&self, text: &str) {
        match TelemetryMessage::parse(text) {
            Ok(message) => self.message_handlers.emit(&message),
            Err(e) => {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "Dropping inbound frame");
            }
        }
    }

    /// Close or failed open: count the attempt, then retry or give up.
    fn connection_lost(self: &Arc<Self>, generation: u64) {
        let (changed, retry_after) = {
            let mut state = self.state.lock();
            if !self.is_current(&state, generation) {
                return;
            }
            state.outbound = None;
            // Detach: this runs on the driver task itself.
            state.driver = None;

            match state.backoff.record_failure() {
                BackoffDecision::GiveUp => {
                    tracing::warn!(
                        endpoint = %self.endpoint,
                        attempts = state.backoff.attempts(),
                        "Reconnect attempts exhausted"
                    );
                    (self.transition(&mut state, ConnectionState::Failed), None)
                }
                BackoffDecision::Retry(delay) => {
                    tracing::debug!(
                        endpoint = %self.endpoint,
                        attempt = state.backoff.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Scheduling reconnect"
                    );
                    (
                        self.transition(&mut state, ConnectionState::Reconnecting),
                        Some(delay),
                    )
                }
            }
        };

        self.emit_if_current(generation, changed);
        if let Some(delay) = retry_after {
            self.schedule_reconnect(generation, delay);
        }
    }

    fn schedule_reconnect(self: &Arc<Self>, generation: u64, delay: Duration) {
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.reconnect_due(generation);
        });

        let mut state = self.state.lock();
        if self.is_current(&state, generation)
            && state.connection == ConnectionState::Reconnecting
        {
            state.reconnect_timer = Some(handle);
        } else {
            handle.abort();
        }
    }

    fn reconnect_due(self: &Arc<Self>, generation: u64) {
        let next = {
            let mut state = self.state.lock();
            if !self.is_current(&state, generation)
                || state.connection != ConnectionState::Reconnecting
            {
                return;
            }
            state.reconnect_timer = None;
            self.begin_attempt(&mut state)
        };
        if let Some(next) = next {
            self.launch(next);
        }
    }
}
