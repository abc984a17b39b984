//! Consumers and collaborator seams owned by the app shell.

use tokio::sync::mpsc;

use squadrone_dispatch::{Consumer, ConsumerError, NotificationSink};
use squadrone_journal::DecodeError;
use squadrone_protocol::{JournalEvent, NotificationRequest};
use squadrone_stream::StreamHandle;

/// Forwards every event to the window layer over a channel.
///
/// The window chrome itself lives outside this crate; whatever owns the
/// receiving end renders the feed. If the UI stops draining, delivery
/// fails and the dispatcher reports it without affecting other consumers.
pub struct UiBridge {
    tx: mpsc::Sender<JournalEvent>,
}

impl UiBridge {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JournalEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl Consumer for UiBridge {
    fn on_event(&self, event: &JournalEvent) -> Result<(), ConsumerError> {
        self.tx
            .try_send(event.clone())
            .map_err(|e| format!("ui channel: {e}").into())
    }

    fn on_decode_error(&self, error: &DecodeError) {
        tracing::debug!(line = error.raw_line(), "ui skipping undecodable line");
    }
}

/// Pushes every event onto the stream service channel.
///
/// Backpressure is the handle's concern: a full or dead channel drops the
/// message with a counter, so this consumer never fails delivery.
pub struct StreamForwarder {
    handle: StreamHandle,
}

impl StreamForwarder {
    pub fn new(handle: StreamHandle) -> Self {
        Self { handle }
    }
}

impl Consumer for StreamForwarder {
    fn on_event(&self, event: &JournalEvent) -> Result<(), ConsumerError> {
        self.handle.push_event(event.clone());
        Ok(())
    }
}

/// Logs notification requests.
///
/// Stands in for the OS toast presenter, which is platform glue outside
/// this crate. The full request is logged so the data contract is visible
/// end to end.
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn present(&self, request: NotificationRequest) {
        tracing::info!(
            title = %request.title,
            body = %request.body,
            correlation = %request.correlation_id,
            actions = request.actions.len(),
            "notification"
        );
    }
}
