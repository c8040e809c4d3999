//! SocketTransport port - opens one physical streaming connection.
//!
//! The transport hides the wire library behind a pair of channels. The
//! socket client owns both ends for the lifetime of one connection attempt;
//! dropping them closes the connection.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::connection::ConnectionError;

/// Frame received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Binary(Vec<u8>),
    /// The peer closed the connection. No further frames follow.
    Closed { code: Option<u16>, reason: String },
    /// Transport error. No further frames follow.
    Error(String),
}

impl InboundFrame {
    /// True for frames that end the connection.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InboundFrame::Closed { .. } | InboundFrame::Error(_))
    }
}

/// Frame sent to the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Close,
}

/// Both directions of an open connection.
#[derive(Debug)]
pub struct SocketChannel {
    pub outbound: mpsc::UnboundedSender<OutboundFrame>,
    pub inbound: mpsc::UnboundedReceiver<InboundFrame>,
}

/// Port for opening streaming connections.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    /// Opens a connection to `url`.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::InvalidUrl` for malformed addresses and
    /// `ConnectionError::Handshake` when the peer refuses or is unreachable.
    async fn open(&self, url: &str) -> Result<SocketChannel, ConnectionError>;
}
