//! Event dispatch for Squadrone Tracker.
//!
//! Delivers each decoded journal event, in arrival order, to every
//! registered consumer, isolating consumer failures from one another, and
//! applies the notification side-effect rule for designated event kinds.

mod dispatcher;
pub mod notification;

pub use dispatcher::{Consumer, ConsumerError, ConsumerFailure, ConsumerId, Dispatcher};
pub use notification::NotificationSink;
