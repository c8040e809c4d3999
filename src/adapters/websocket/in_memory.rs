//! In-Memory Socket Transport
//!
//! Every successful `open` hands the test a [`PeerHandle`] acting as the
//! server side of the connection. Useful for testing and development.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::domain::connection::ConnectionError;
use crate::ports::{InboundFrame, OutboundFrame, SocketChannel, SocketTransport};

/// Server side of one in-memory connection.
#[derive(Debug)]
pub struct PeerHandle {
    pub url: String,
    to_client: mpsc::UnboundedSender<InboundFrame>,
    from_client: mpsc::UnboundedReceiver<OutboundFrame>,
}

impl PeerHandle {
    /// Sends a text frame to the client. Returns false once the client is gone.
    pub fn send_text(&self, text: impl Into<String>) -> bool {
        self.to_client.send(InboundFrame::Text(text.into())).is_ok()
    }

    pub fn send_binary(&self, data: Vec<u8>) -> bool {
        self.to_client.send(InboundFrame::Binary(data)).is_ok()
    }

    /// Closes the connection from the server side.
    pub fn close(self) {
        let _ = self.to_client.send(InboundFrame::Closed {
            code: Some(1000),
            reason: "server closed".to_string(),
        });
    }

    /// Next frame sent by the client; `None` once the client dropped its end.
    pub async fn recv(&mut self) -> Option<OutboundFrame> {
        self.from_client.recv().await
    }

    /// True once the client has released its end of the connection.
    pub fn is_client_gone(&self) -> bool {
        self.to_client.is_closed()
    }
}

#[derive(Debug, Default)]
struct TransportState {
    attempts: usize,
    refusing: bool,
    opened_urls: Vec<String>,
}

/// In-memory transport with scripted refusals
#[derive(Clone)]
pub struct InMemoryTransport {
    state: Arc<Mutex<TransportState>>,
    peer_tx: mpsc::UnboundedSender<PeerHandle>,
    peer_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<PeerHandle>>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(Mutex::new(TransportState::default())),
            peer_tx,
            peer_rx: Arc::new(tokio::sync::Mutex::new(peer_rx)),
        }
    }

    /// While refusing, every `open` fails with a handshake error.
    pub fn set_refusing(&self, refusing: bool) {
        self.state.lock().refusing = refusing;
    }

    /// Number of `open` calls so far, successful or not.
    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }

    /// URLs of successfully opened connections, in order.
    pub fn opened_urls(&self) -> Vec<String> {
        self.state.lock().opened_urls.clone()
    }

    /// Waits for the next accepted connection.
    pub async fn next_peer(&self) -> Option<PeerHandle> {
        self.peer_rx.lock().await.recv().await
    }

    /// Returns an already accepted connection without waiting.
    pub fn try_next_peer(&self) -> Option<PeerHandle> {
        self.peer_rx.try_lock().ok()?.try_recv().ok()
    }
}

impl Default for InMemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SocketTransport for InMemoryTransport {
    async fn open(&self, url: &str) -> Result<SocketChannel, ConnectionError> {
        {
            let mut state = self.state.lock();
            state.attempts += 1;
            if state.refusing {
                return Err(ConnectionError::Handshake(format!("{url}: refused")));
            }
            state.opened_urls.push(url.to_string());
        }

        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();

        let _ = self.peer_tx.send(PeerHandle {
            url: url.to_string(),
            to_client,
            from_client,
        });

        Ok(SocketChannel { outbound, inbound })
    }
}
