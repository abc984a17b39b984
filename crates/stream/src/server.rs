//! Subscriber-facing WebSocket server.
//!
//! Binds loopback by default (remote access is an explicit configuration
//! choice), accepts any number of subscribers, answers status requests,
//! and fans out event pushes. Every connection gets its own bounded send
//! queue; a subscriber that stops reading loses pushes, not the server.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::accept_async_with_config;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use squadrone_protocol::JournalEvent;
use squadrone_protocol::constants::{MessageType, WS_MAX_MESSAGE_SIZE};
use squadrone_protocol::envelope::Message;

use crate::state::StatusSnapshot;
use crate::{SEND_BUFFER_SIZE, ServerError};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind. Loopback unless explicitly configured otherwise.
    pub bind_addr: IpAddr,
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        }
    }
}

/// The subscriber-facing WebSocket server.
pub struct StreamServer {
    config: ServerConfig,
    subscribers: Mutex<HashMap<Uuid, mpsc::Sender<tungstenite::Message>>>,
    status: Mutex<StatusSnapshot>,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl StreamServer {
    pub fn new(config: ServerConfig, cancel: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            config,
            subscribers: Mutex::new(HashMap::new()),
            status: Mutex::new(StatusSnapshot::new()),
            cancel,
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address once [`bind`](Self::bind) has run.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Number of currently connected subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// A copy of the current status snapshot.
    pub async fn status(&self) -> StatusSnapshot {
        self.status.lock().await.clone()
    }

    /// Binds the listener.
    ///
    /// Separate from [`run`](Self::run) so the caller can signal readiness
    /// on the internal channel only once the socket actually exists.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = SocketAddr::new(self.config.bind_addr, self.config.port);
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local);
        tracing::info!("stream server listening on {local}");
        Ok(listener)
    }

    /// Accepts subscriber connections until cancellation.
    pub async fn run(self: &Arc<Self>, listener: TcpListener) -> Result<(), ServerError> {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("stream server shutting down");
                    self.subscribers.lock().await.clear();
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, peer_addr).await {
                                    tracing::debug!(%peer_addr, "subscriber connection ended: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Folds an event into the status snapshot and pushes it to every
    /// subscriber. Slow subscribers lose the push; dead ones are removed.
    pub async fn apply_event(&self, event: &JournalEvent) {
        self.status.lock().await.apply(event);

        let text = match Message::push(MessageType::Event, Some(event))
            .and_then(|msg| serde_json::to_string(&msg))
        {
            Ok(json) => tungstenite::Message::Text(json.into()),
            Err(e) => {
                tracing::warn!("failed to encode event push: {e}");
                return;
            }
        };

        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|id, tx| match tx.try_send(text.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(subscriber = %id, "send buffer full, dropping push");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(subscriber = %id, "subscriber gone, removing");
                false
            }
        });
    }

    /// Upgrades one TCP connection and runs its read loop.
    async fn handle_connection(
        self: &Arc<Self>,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), ServerError> {
        let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
        let ws_stream = accept_async_with_config(stream, Some(ws_config)).await?;

        let id = Uuid::new_v4();
        let (send_tx, send_rx) = mpsc::channel(SEND_BUFFER_SIZE);
        self.subscribers.lock().await.insert(id, send_tx.clone());
        tracing::info!(subscriber = %id, %peer_addr, "subscriber connected");

        let (write, mut read) = ws_stream.split();
        let conn_cancel = self.cancel.child_token();
        let pump = tokio::spawn(write_pump(write, send_rx, conn_cancel.clone()));

        loop {
            tokio::select! {
                _ = conn_cancel.cancelled() => break,

                msg = read.next() => match msg {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        self.handle_request(&text, &send_tx).await;
                    }
                    Some(Ok(tungstenite::Message::Ping(data))) => {
                        let _ = send_tx.try_send(tungstenite::Message::Pong(data));
                    }
                    Some(Ok(tungstenite::Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Binary and pong frames are ignored.
                    Some(Err(e)) => {
                        tracing::debug!(subscriber = %id, "read error: {e}");
                        break;
                    }
                }
            }
        }

        self.subscribers.lock().await.remove(&id);
        conn_cancel.cancel();
        let _ = pump.await;
        tracing::info!(subscriber = %id, "subscriber disconnected");
        Ok(())
    }

    /// Answers one subscriber request.
    async fn handle_request(&self, text: &str, send_tx: &mpsc::Sender<tungstenite::Message>) {
        let request: Message = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!("unparseable subscriber message: {e}");
                return;
            }
        };

        let reply = match request.msg_type {
            MessageType::GetStatus => {
                let snapshot = self.status.lock().await.clone();
                request.reply(MessageType::Status, Some(&snapshot))
            }
            MessageType::Ping => request.reply::<()>(MessageType::Pong, None),
            _ => Ok(request.reply_error(400, "unsupported request")),
        };

        let text = match reply.and_then(|msg| serde_json::to_string(&msg)) {
            Ok(json) => tungstenite::Message::Text(json.into()),
            Err(e) => {
                tracing::warn!("failed to encode reply: {e}");
                return;
            }
        };
        let _ = send_tx.try_send(text);
    }
}

/// Writes queued messages to the WebSocket until cancellation or error.
async fn write_pump<S>(
    mut write: S,
    mut send_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = send_rx.recv() => {
                match msg {
                    Some(m) => {
                        if let Err(e) = write.send(m).await {
                            tracing::debug!("WebSocket write error: {e}");
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    let _ = write.send(tungstenite::Message::Close(None)).await;
}
