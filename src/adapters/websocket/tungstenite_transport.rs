//! WebSocket transport over `tokio-tungstenite`.
//!
//! Each opened connection gets one pump task that forwards frames between
//! the socket and the channel pair handed to the client. The task ends when
//! either side closes.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::domain::connection::ConnectionError;
use crate::ports::{InboundFrame, OutboundFrame, SocketChannel, SocketTransport};

/// Opens `ws://` and `wss://` connections.
#[derive(Debug, Clone, Default)]
pub struct TungsteniteTransport;

impl TungsteniteTransport {
    pub fn new() -> Self {
        Self
    }

    fn validate_url(url: &str) -> Result<(), ConnectionError> {
        if url.starts_with("ws://") || url.starts_with("wss://") {
            Ok(())
        } else {
            Err(ConnectionError::InvalidUrl(format!(
                "{url}: scheme must be ws:// or wss://"
            )))
        }
    }
}

#[async_trait]
impl SocketTransport for TungsteniteTransport {
    async fn open(&self, url: &str) -> Result<SocketChannel, ConnectionError> {
        Self::validate_url(url)?;

        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ConnectionError::Handshake(e.to_string()))?;

        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundFrame>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<InboundFrame>();
        let (mut write, mut read) = stream.split();
        let url = url.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    frame = outbound_rx.recv() => match frame {
                        Some(OutboundFrame::Text(text)) => {
                            if let Err(e) = write.send(Message::Text(text)).await {
                                let _ = inbound_tx.send(InboundFrame::Error(e.to_string()));
                                break;
                            }
                        }
                        Some(OutboundFrame::Close) | None => {
                            let _ = write.send(Message::Close(None)).await;
                            break;
                        }
                    },
                    incoming = read.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            if inbound_tx.send(InboundFrame::Text(text)).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            if inbound_tx.send(InboundFrame::Binary(data)).is_err() {
                                break;
                            }
                        }
                        Some(Ok(Message::Ping(payload))) => {
                            let _ = write.send(Message::Pong(payload)).await;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let (code, reason) = close_details(frame);
                            let _ = inbound_tx.send(InboundFrame::Closed { code, reason });
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            let _ = inbound_tx.send(InboundFrame::Error(e.to_string()));
                            break;
                        }
                        None => {
                            let _ = inbound_tx.send(InboundFrame::Closed {
                                code: None,
                                reason: "stream ended".to_string(),
                            });
                            break;
                        }
                    },
                }
            }
            tracing::debug!(url = %url, "Socket pump stopped");
        });

        Ok(SocketChannel {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

fn close_details(frame: Option<CloseFrame<'_>>) -> (Option<u16>, String) {
    match frame {
        Some(frame) => (Some(u16::from(frame.code)), frame.reason.into_owned()),
        None => (None, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_non_websocket_scheme() {
        let transport = TungsteniteTransport::new();
        let err = transport.open("http://localhost/ws/meters").await.unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_handshake_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = TungsteniteTransport::new();
        let err = transport
            .open(&format!("ws://{addr}/ws/meters"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Handshake(_)));
    }

    #[tokio::test]
    async fn relays_frames_through_a_real_socket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
            ws.send(Message::Text(r#"{"type":"meters","channels":[]}"#.into()))
                .await
                .unwrap();
            if let Some(Ok(Message::Text(echo))) = ws.next().await {
                ws.send(Message::Text(echo)).await.unwrap();
            }
            ws.close(None).await.unwrap();
        });

        let transport = TungsteniteTransport::new();
        let mut channel = transport
            .open(&format!("ws://{addr}/ws/meters"))
            .await
            .unwrap();

        assert_eq!(
            channel.inbound.recv().await,
            Some(InboundFrame::Text(r#"{"type":"meters","channels":[]}"#.into()))
        );

        channel
            .outbound
            .send(OutboundFrame::Text("ping".into()))
            .unwrap();
        assert_eq!(
            channel.inbound.recv().await,
            Some(InboundFrame::Text("ping".into()))
        );

        assert!(matches!(
            channel.inbound.recv().await,
            Some(InboundFrame::Closed { .. })
        ));
    }
}
