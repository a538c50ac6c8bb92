// WebSocket транспорт
// Обёртка над tokio-tungstenite: один сокет = пара каналов (исходящие / входящие фреймы)

use crate::protocol::messages::ABNORMAL_CLOSURE;
use crate::utils::error::{ChatError, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};

/// Состояние соединения push-канала
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Closed,
}

/// Фрейм от клиента к сокету
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Close { code: u16, reason: String },
}

/// Фрейм от сокета к клиенту
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    /// Ошибка транспорта; за ней обычно следует `Closed`
    Error(String),
    Closed { code: u16, reason: String },
}

/// Открытое соединение
pub struct TransportChannel {
    pub outbound: UnboundedSender<OutboundFrame>,
    pub inbound: UnboundedReceiver<InboundFrame>,
}

/// Способ открыть push-канал по URL
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn open(&self, url: &str) -> Result<TransportChannel>;
}

/// WebSocket транспорт поверх tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushTransport for WebSocketTransport {
    async fn open(&self, url: &str) -> Result<TransportChannel> {
        let (ws_stream, _response) = connect_async(url)
            .await
            .map_err(|e| ChatError::Connection(format!("Failed to open WebSocket {}: {}", url, e)))?;

        let (mut write_half, mut read_half) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundFrame>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<InboundFrame>();

        // Писатель: живёт, пока жив хотя бы один отправитель или пока не ушёл Close
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                let result = match frame {
                    OutboundFrame::Text(text) => write_half.send(Message::Text(text.into())).await,
                    OutboundFrame::Close { code, reason } => {
                        let close = CloseFrame {
                            code: CloseCode::from(code),
                            reason: reason.into(),
                        };
                        let sent = write_half.send(Message::Close(Some(close))).await;
                        if let Err(e) = sent {
                            tracing::debug!(error = %e, "close frame was not delivered");
                        }
                        break;
                    }
                };

                if let Err(e) = result {
                    tracing::warn!(error = %e, "WebSocket write failed");
                    break;
                }
            }
            let _ = write_half.close().await;
        });

        // Читатель
        tokio::spawn(async move {
            loop {
                match read_half.next().await {
                    Some(Ok(Message::Text(text))) => {
                        if inbound_tx.send(InboundFrame::Text(text.to_string())).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        tracing::debug!(len = bytes.len(), "ignoring binary push frame");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (u16::from(f.code), f.reason.to_string()))
                            .unwrap_or((ABNORMAL_CLOSURE, String::new()));
                        let _ = inbound_tx.send(InboundFrame::Closed { code, reason });
                        break;
                    }
                    Some(Ok(_)) => {
                        // ping/pong обрабатывает tungstenite
                    }
                    Some(Err(e)) => {
                        let _ = inbound_tx.send(InboundFrame::Error(e.to_string()));
                        let _ = inbound_tx.send(InboundFrame::Closed {
                            code: ABNORMAL_CLOSURE,
                            reason: e.to_string(),
                        });
                        break;
                    }
                    None => {
                        let _ = inbound_tx.send(InboundFrame::Closed {
                            code: ABNORMAL_CLOSURE,
                            reason: "stream ended".to_string(),
                        });
                        break;
                    }
                }
            }
        });

        Ok(TransportChannel {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

/// Адрес push-канала для чата: `<ws_base>/ws/<chat_id>`
pub fn channel_url(ws_base: &str, chat_id: &str) -> String {
    format!("{}/ws/{}", ws_base.trim_end_matches('/'), chat_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_url() {
        assert_eq!(channel_url("ws://localhost:8000", "chat_1"), "ws://localhost:8000/ws/chat_1");
        assert_eq!(channel_url("wss://chat.example/", "c2"), "wss://chat.example/ws/c2");
    }
}
