//! Protocol constants and message type tags.

use serde::{Deserialize, Serialize};

/// Maximum WebSocket message size in bytes. Journal events are small;
/// anything larger than this is malformed or hostile and gets dropped.
pub const WS_MAX_MESSAGE_SIZE: usize = 256 * 1024;

/// Message types carried in the envelope `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Liveness greeting from the main process to the stream service.
    Hello,
    /// Liveness acknowledgement from the stream service.
    Ready,
    /// A journal event push to subscribers.
    Event,
    /// Subscriber request for the current status snapshot.
    GetStatus,
    /// Response carrying the status snapshot.
    Status,
    Ping,
    Pong,
    Error,
}
