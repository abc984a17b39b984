//! The stream service unit.
//!
//! Independently scheduled from the tailing pipeline: it owns the
//! WebSocket server and drains the internal channel, so a fault here
//! surfaces as dropped channel messages on the main side, never as a
//! stalled tailer. Readiness is acknowledged only after the listener is
//! bound, so a subscriber told "ready" can actually connect.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use squadrone_protocol::ChannelMessage;

use crate::ServerError;
use crate::channel::StreamInbox;
use crate::server::{ServerConfig, StreamServer};

/// The stream service: a WebSocket server fed from the internal channel.
pub struct StreamService {
    server: Arc<StreamServer>,
    cancel: CancellationToken,
}

impl StreamService {
    pub fn new(config: ServerConfig, cancel: CancellationToken) -> Self {
        let server = StreamServer::new(config, cancel.clone());
        Self { server, cancel }
    }

    /// The underlying server, for port and status queries.
    pub fn server(&self) -> &Arc<StreamServer> {
        &self.server
    }

    /// Runs the service until cancellation or channel closure.
    pub async fn run(&self, mut inbox: StreamInbox) -> Result<(), ServerError> {
        let listener = self.server.bind().await?;

        let accept_server = Arc::clone(&self.server);
        let accept_task = tokio::spawn(async move { accept_server.run(listener).await });

        inbox.mark_ready();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,

                msg = inbox.recv() => match msg {
                    Some(ChannelMessage::Hello) => {
                        tracing::debug!("hello from main process");
                        inbox.mark_ready();
                    }
                    Some(ChannelMessage::Event(event)) => {
                        self.server.apply_event(&event).await;
                    }
                    Some(ChannelMessage::Ready) => {
                        // Ready flows the other way; harmless if echoed.
                    }
                    None => {
                        tracing::debug!("channel closed, stopping stream service");
                        break;
                    }
                }
            }
        }

        self.cancel.cancel();
        let _ = accept_task.await;
        Ok(())
    }
}
