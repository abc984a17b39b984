//! Internal message channel between the dispatch pipeline and the stream
//! service.
//!
//! The queue is bounded: pushes while the service is slow or not yet
//! ready are buffered up to capacity, and overflow is dropped with a
//! recorded counter. The tail loop never blocks on this channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::mpsc;

use squadrone_protocol::{ChannelMessage, JournalEvent};

/// Default capacity of the dispatcher → service queue.
pub const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct Shared {
    ready: AtomicBool,
    dropped: AtomicU64,
}

/// Main-process side of the channel: pushes messages toward the service.
#[derive(Clone)]
pub struct StreamHandle {
    tx: mpsc::Sender<ChannelMessage>,
    control_rx: Arc<std::sync::Mutex<mpsc::Receiver<ChannelMessage>>>,
    shared: Arc<Shared>,
}

/// Service side of the channel: drains messages pushed by the main
/// process and acknowledges liveness.
pub struct StreamInbox {
    rx: mpsc::Receiver<ChannelMessage>,
    control_tx: mpsc::Sender<ChannelMessage>,
    shared: Arc<Shared>,
}

/// Creates a connected handle/inbox pair.
pub fn channel(capacity: usize) -> (StreamHandle, StreamInbox) {
    let (tx, rx) = mpsc::channel(capacity);
    let (control_tx, control_rx) = mpsc::channel(4);
    let shared = Arc::new(Shared::default());
    (
        StreamHandle {
            tx,
            control_rx: Arc::new(std::sync::Mutex::new(control_rx)),
            shared: Arc::clone(&shared),
        },
        StreamInbox {
            rx,
            control_tx,
            shared,
        },
    )
}

impl StreamHandle {
    /// Sends the liveness greeting.
    pub fn hello(&self) {
        self.push(ChannelMessage::Hello);
    }

    /// Pushes a journal event toward the service.
    pub fn push_event(&self, event: JournalEvent) {
        self.push(ChannelMessage::Event(event));
    }

    fn push(&self, message: ChannelMessage) {
        // Full queue and dead service look the same from here: the message
        // is dropped and counted, never awaited.
        if self.tx.try_send(message).is_err() {
            let dropped = self.shared.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(dropped, "stream channel full or closed, dropping message");
        }
    }

    /// Whether the service has acknowledged readiness.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Relaxed)
    }

    /// Messages dropped because the queue was full or closed.
    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Drains pending control messages from the service (e.g. `ready`).
    pub fn poll_control(&self) -> Vec<ChannelMessage> {
        let mut rx = match self.control_rx.lock() {
            Ok(rx) => rx,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

impl StreamInbox {
    /// Receives the next message, or `None` once the handle side is gone.
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        self.rx.recv().await
    }

    /// Marks the service ready and acknowledges with a `ready` control
    /// message. Idempotent; also used to re-ack a late `hello`.
    pub fn mark_ready(&self) {
        self.shared.ready.store(true, Ordering::Relaxed);
        let _ = self.control_tx.try_send(ChannelMessage::Ready);
    }
}
