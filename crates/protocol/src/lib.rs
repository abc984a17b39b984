//! Wire protocol types shared across the Squadrone Tracker pipeline.
//!
//! Defines the journal event record, the WebSocket envelope used by the
//! stream surface, the internal channel messages between the dispatch
//! pipeline and the stream service, and the notification data contract.

pub mod channel;
pub mod constants;
pub mod envelope;
pub mod journal;
pub mod notification;

pub use channel::ChannelMessage;
pub use constants::{MessageType, WS_MAX_MESSAGE_SIZE};
pub use envelope::{Message, WsError};
pub use journal::JournalEvent;
pub use notification::{NotificationAction, NotificationRequest};
