//! Stream service for Squadrone Tracker.
//!
//! Lets stream overlays and dashboards subscribe to the live event feed
//! and query the latest known state over a loopback WebSocket. The service
//! runs as its own unit, connected to the dispatch pipeline only through
//! the bounded channel in [`channel`], so a fault here can never stall the
//! journal tailer.

pub mod channel;
pub mod server;
pub mod service;
pub mod state;

pub use channel::{CHANNEL_CAPACITY, StreamHandle, StreamInbox};
pub use server::{ServerConfig, StreamServer};
pub use service::StreamService;
pub use state::StatusSnapshot;

/// Per-subscriber send buffer capacity.
///
/// Event pushes are small and frequent; a subscriber that stops reading
/// gets its pushes dropped rather than stalling the broadcast loop.
pub const SEND_BUFFER_SIZE: usize = 256;

/// Errors produced by the stream service.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
