//! Synchronous fan-out of decoded events to registered consumers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use squadrone_journal::DecodeError;
use squadrone_protocol::JournalEvent;

use crate::notification::{self, NotificationSink};

/// Boxed error a consumer may return from its callback.
pub type ConsumerError = Box<dyn std::error::Error + Send + Sync>;

/// Identifies a registered consumer. Handed out by [`Dispatcher::register`]
/// and required to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConsumerId(u64);

/// Receives journal events in arrival order.
pub trait Consumer: Send + Sync {
    /// Handles one event. An error here is collected and reported by the
    /// dispatcher; it never stops delivery to other consumers.
    fn on_event(&self, event: &JournalEvent) -> Result<(), ConsumerError>;

    /// Handles a line that failed to decode. Optional; most consumers only
    /// care about well-formed events.
    fn on_decode_error(&self, error: &DecodeError) {
        let _ = error;
    }
}

/// A consumer's failed delivery, reported but never propagated.
#[derive(Debug)]
pub struct ConsumerFailure {
    pub consumer: ConsumerId,
    pub message: String,
}

/// Delivers each event to every registered consumer before the next event
/// is dispatched, then applies the notification rule for designated kinds.
///
/// The registry is mutated only by [`register`](Self::register) and
/// [`unregister`](Self::unregister); the dispatch path works on a snapshot,
/// so a consumer callback may safely (un)register consumers without
/// deadlocking delivery.
pub struct Dispatcher {
    consumers: Mutex<Vec<(ConsumerId, Arc<dyn Consumer>)>>,
    notification_sink: Option<Arc<dyn NotificationSink>>,
    next_id: AtomicU64,
    events_dispatched: AtomicU64,
}

impl Dispatcher {
    /// Creates a dispatcher. `notification_sink` receives the one-shot
    /// requests produced by the notification rules; `None` disables them.
    pub fn new(notification_sink: Option<Arc<dyn NotificationSink>>) -> Self {
        Self {
            consumers: Mutex::new(Vec::new()),
            notification_sink,
            next_id: AtomicU64::new(0),
            events_dispatched: AtomicU64::new(0),
        }
    }

    /// Registers a consumer and returns its id.
    pub fn register(&self, consumer: Arc<dyn Consumer>) -> ConsumerId {
        let id = ConsumerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_registry().push((id, consumer));
        tracing::debug!(consumer = id.0, "consumer registered");
        id
    }

    /// Unregisters a consumer by id. Returns `true` if it was registered.
    pub fn unregister(&self, id: ConsumerId) -> bool {
        let mut consumers = self.lock_registry();
        let before = consumers.len();
        consumers.retain(|(cid, _)| *cid != id);
        consumers.len() != before
    }

    /// Number of registered consumers.
    pub fn consumer_count(&self) -> usize {
        self.lock_registry().len()
    }

    /// Events dispatched since construction.
    pub fn events_dispatched(&self) -> u64 {
        self.events_dispatched.load(Ordering::Relaxed)
    }

    /// Delivers `event` to every registered consumer, then fires the
    /// notification side effect if the event kind calls for one. Returns
    /// the failures collected along the way.
    pub fn dispatch(&self, event: &JournalEvent) -> Vec<ConsumerFailure> {
        let snapshot = self.lock_registry().clone();

        let mut failures = Vec::new();
        for (id, consumer) in &snapshot {
            if let Err(e) = consumer.on_event(event) {
                tracing::warn!(consumer = id.0, kind = %event.kind, "consumer failed: {e}");
                failures.push(ConsumerFailure {
                    consumer: *id,
                    message: e.to_string(),
                });
            }
        }

        // Side effects run after delivery, still within this event's turn:
        // the next event cannot overtake the notification.
        if let Some(sink) = &self.notification_sink
            && let Some(request) = notification::request_for(event)
        {
            sink.present(request);
        }

        self.events_dispatched.fetch_add(1, Ordering::Relaxed);
        failures
    }

    /// Forwards a decode failure to every consumer that cares.
    pub fn dispatch_decode_error(&self, error: &DecodeError) {
        let snapshot = self.lock_registry().clone();
        for (_, consumer) in &snapshot {
            consumer.on_decode_error(error);
        }
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, Vec<(ConsumerId, Arc<dyn Consumer>)>> {
        // Consumer callbacks run outside the lock, so the only way to
        // poison it is a panic inside register/unregister itself.
        self.consumers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn event(kind: &str) -> JournalEvent {
        serde_json::from_value(serde_json::json!({
            "timestamp": "2026-01-01T00:00:00Z",
            "event": kind,
        }))
        .unwrap()
    }

    /// Records every event kind it sees; optionally fails on each call.
    struct Recorder {
        seen: StdMutex<Vec<String>>,
        fail: bool,
    }

    impl Recorder {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                seen: StdMutex::new(Vec::new()),
                fail,
            })
        }
    }

    impl Consumer for Recorder {
        fn on_event(&self, event: &JournalEvent) -> Result<(), ConsumerError> {
            self.seen.lock().unwrap().push(event.kind.clone());
            if self.fail {
                return Err("recorder configured to fail".into());
            }
            Ok(())
        }
    }

    #[test]
    fn delivers_to_all_consumers() {
        let dispatcher = Dispatcher::new(None);
        let a = Recorder::new(false);
        let b = Recorder::new(false);
        dispatcher.register(a.clone());
        dispatcher.register(b.clone());

        let failures = dispatcher.dispatch(&event("FSDJump"));
        assert!(failures.is_empty());
        assert_eq!(*a.seen.lock().unwrap(), vec!["FSDJump"]);
        assert_eq!(*b.seen.lock().unwrap(), vec!["FSDJump"]);
    }

    #[test]
    fn failing_consumer_does_not_block_the_rest() {
        let dispatcher = Dispatcher::new(None);
        let ok_before = Recorder::new(false);
        let failing = Recorder::new(true);
        let ok_after = Recorder::new(false);
        dispatcher.register(ok_before.clone());
        let failing_id = dispatcher.register(failing.clone());
        dispatcher.register(ok_after.clone());

        let failures = dispatcher.dispatch(&event("Docked"));

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].consumer, failing_id);
        assert_eq!(*ok_before.seen.lock().unwrap(), vec!["Docked"]);
        assert_eq!(*ok_after.seen.lock().unwrap(), vec!["Docked"]);
    }

    #[test]
    fn events_keep_arrival_order_per_consumer() {
        let dispatcher = Dispatcher::new(None);
        let recorder = Recorder::new(false);
        dispatcher.register(recorder.clone());

        dispatcher.dispatch(&event("LoadGame"));
        dispatcher.dispatch(&event("FSDJump"));
        dispatcher.dispatch(&event("Docked"));

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec!["LoadGame", "FSDJump", "Docked"]
        );
        assert_eq!(dispatcher.events_dispatched(), 3);
    }

    #[test]
    fn unregister_stops_delivery() {
        let dispatcher = Dispatcher::new(None);
        let recorder = Recorder::new(false);
        let id = dispatcher.register(recorder.clone());
        dispatcher.dispatch(&event("First"));

        assert!(dispatcher.unregister(id));
        assert!(!dispatcher.unregister(id));
        dispatcher.dispatch(&event("Second"));

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["First"]);
        assert_eq!(dispatcher.consumer_count(), 0);
    }

    #[test]
    fn decode_errors_fan_out() {
        struct ErrorCounter(AtomicU64);
        impl Consumer for ErrorCounter {
            fn on_event(&self, _: &JournalEvent) -> Result<(), ConsumerError> {
                Ok(())
            }
            fn on_decode_error(&self, _: &DecodeError) {
                self.0.fetch_add(1, Ordering::Relaxed);
            }
        }

        let dispatcher = Dispatcher::new(None);
        let counter = Arc::new(ErrorCounter(AtomicU64::new(0)));
        dispatcher.register(counter.clone());

        let err = squadrone_journal::decoder::decode("not json").unwrap_err();
        dispatcher.dispatch_decode_error(&err);
        assert_eq!(counter.0.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn docked_event_fires_exactly_one_notification() {
        struct CollectingSink(StdMutex<Vec<squadrone_protocol::NotificationRequest>>);
        impl NotificationSink for CollectingSink {
            fn present(&self, request: squadrone_protocol::NotificationRequest) {
                self.0.lock().unwrap().push(request);
            }
        }

        let sink = Arc::new(CollectingSink(StdMutex::new(Vec::new())));
        let dispatcher = Dispatcher::new(Some(sink.clone()));

        let docked: JournalEvent = serde_json::from_value(serde_json::json!({
            "timestamp": "2026-03-02T19:04:11Z",
            "event": "Docked",
            "StationName": "Jameson Memorial",
            "MarketID": 128666762u64,
        }))
        .unwrap();
        dispatcher.dispatch(&docked);
        dispatcher.dispatch(&event("FSDJump"));

        let requests = sink.0.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, "Docked at Jameson Memorial");
        assert_eq!(requests[0].correlation_id, "128666762");
    }
}
