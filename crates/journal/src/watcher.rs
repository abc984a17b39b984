//! Directory observer for journal rotation.
//!
//! Event-driven via `notify` so a rotation is picked up with low latency
//! even under load. The monitor pump keeps a periodic re-catalog fallback
//! for when the observer itself fails, so a dropped or lost signal here is
//! never fatal.

use std::path::Path;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::JournalError;
use crate::catalog::JOURNAL_PREFIX;

/// Signals sent by the rotation watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchSignal {
    /// A file matching the journal prefix appeared in the directory.
    /// The receiver must re-select through the catalog rather than trust
    /// this name to be newest: filesystem events can arrive out of order.
    Created(String),
    /// The observer failed; rotations may be missed until it is respawned.
    Lost(String),
}

/// Watches a journal directory for newly created journal files.
///
/// Dropping the watcher stops observation.
#[derive(Debug)]
pub struct RotationWatcher {
    _watcher: RecommendedWatcher,
}

impl RotationWatcher {
    /// Spawns an observer on `dir`, forwarding signals over `tx`.
    ///
    /// Signals are delivered with `try_send`; if the receiver lags, the
    /// signal is dropped, which the periodic re-catalog covers.
    pub fn spawn(dir: &Path, tx: mpsc::Sender<WatchSignal>) -> Result<Self, JournalError> {
        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Create(_)) {
                        return;
                    }
                    for path in &event.paths {
                        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                            continue;
                        };
                        if name.starts_with(JOURNAL_PREFIX)
                            && tx.try_send(WatchSignal::Created(name.to_string())).is_err()
                        {
                            tracing::warn!(file = name, "watch channel full, dropping signal");
                        }
                    }
                }
                Err(e) => {
                    let _ = tx.try_send(WatchSignal::Lost(e.to_string()));
                }
            })
            .map_err(|e| JournalError::WatchLost(e.to_string()))?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| JournalError::WatchLost(e.to_string()))?;

        tracing::debug!(dir = %dir.display(), "rotation watcher started");
        Ok(Self { _watcher: watcher })
    }
}
