//! The monitor pump: glues catalog, watcher, tailer, and decoder together
//! and hands decoded events to the caller in file order.
//!
//! One task owns the tailer and its cursor; nothing else touches the file
//! handle. Rotation always flushes the old file before the new one emits
//! anything, so consumers never see two files interleaved.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use squadrone_protocol::JournalEvent;

use crate::catalog;
use crate::decoder::{self, DecodeError};
use crate::tailer::Tailer;
use crate::watcher::{RotationWatcher, WatchSignal};

/// Callback invoked with each decoded event.
pub type OnEventFn = Box<dyn Fn(JournalEvent) + Send + Sync + 'static>;

/// Callback invoked with each line that failed to decode.
pub type OnDecodeErrorFn = Box<dyn Fn(DecodeError) + Send + Sync + 'static>;

/// Capacity of the watcher signal queue. Rotations are rare; an overflow
/// is covered by the rescan fallback.
const WATCH_CHANNEL_CAPACITY: usize = 16;

/// Monitor tuning knobs.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Directory containing the journal files.
    pub journal_dir: PathBuf,
    /// Interval between tail polls of the attached file.
    pub poll_interval: Duration,
    /// Interval for the fallback re-catalog pass. Also paces the retry
    /// loop while the directory is unavailable and watcher respawns.
    pub rescan_interval: Duration,
}

impl MonitorConfig {
    pub fn new(journal_dir: PathBuf) -> Self {
        Self {
            journal_dir,
            poll_interval: Duration::from_millis(250),
            rescan_interval: Duration::from_secs(10),
        }
    }
}

/// Runs the journal monitor until `cancel` fires.
///
/// Never returns an error: an unavailable directory is a retrying
/// "not tracking" state, a failed watcher degrades to periodic rescans,
/// and read errors stall the stream until the next rotation. On shutdown
/// the observer stops before the file handle is released.
pub async fn run(
    config: MonitorConfig,
    cancel: CancellationToken,
    on_event: OnEventFn,
    on_decode_error: OnDecodeErrorFn,
) {
    let mut tailer = Tailer::new();
    let (watch_tx, mut watch_rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
    let mut watcher: Option<RotationWatcher> = None;

    let mut poll_interval = tokio::time::interval(config.poll_interval);
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick fires immediately, which doubles as the initial attach.
    let mut rescan_interval = tokio::time::interval(config.rescan_interval);
    rescan_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            Some(signal) = watch_rx.recv() => match signal {
                WatchSignal::Created(name) => {
                    tracing::debug!(file = %name, "journal file created");
                    retarget(&config, &mut tailer, &on_event, &on_decode_error);
                }
                WatchSignal::Lost(reason) => {
                    tracing::warn!(%reason, "directory watch lost, falling back to rescans");
                    watcher = None;
                }
            },

            _ = poll_interval.tick() => {
                drain(&mut tailer, &on_event, &on_decode_error);
            }

            _ = rescan_interval.tick() => {
                retarget(&config, &mut tailer, &on_event, &on_decode_error);
                if watcher.is_none() {
                    match RotationWatcher::spawn(&config.journal_dir, watch_tx.clone()) {
                        Ok(w) => watcher = Some(w),
                        Err(e) => tracing::debug!("watcher unavailable: {e}"),
                    }
                }
            }
        }
    }

    // Stop the observer before releasing the file handle.
    drop(watcher);
    tailer.detach();
    tracing::debug!("journal monitor stopped");
}

/// Re-selects the newest journal file through the catalog and rotates the
/// tailer onto it if it changed.
fn retarget(
    config: &MonitorConfig,
    tailer: &mut Tailer,
    on_event: &OnEventFn,
    on_decode_error: &OnDecodeErrorFn,
) {
    let latest = match catalog::latest(&config.journal_dir) {
        Ok(Some(latest)) => latest,
        Ok(None) => {
            if !tailer.is_attached() {
                tracing::trace!(dir = %config.journal_dir.display(), "no journal files yet");
            }
            return;
        }
        Err(e) => {
            // "Not tracking" state; the next rescan tick retries.
            tracing::warn!("not tracking: {e}");
            return;
        }
    };

    let on_latest = tailer
        .active_file()
        .map(|current| current.file_name == latest.file_name);
    match on_latest {
        Some(true) => {}
        Some(false) => {
            // Flush what the old file still holds, then switch. The new
            // file starts at offset zero so none of its lines are missed.
            drain(tailer, on_event, on_decode_error);
            tailer.detach();
            match tailer.attach_from_start(latest.clone()) {
                Ok(()) => {
                    tracing::info!(file = %latest.file_name, "rotated to new journal file");
                    drain(tailer, on_event, on_decode_error);
                }
                Err(e) => tracing::warn!(file = %latest.file_name, "attach failed: {e}"),
            }
        }
        None => {
            // First attachment of the session: start at end of file so
            // content written before we arrived is not replayed.
            match tailer.attach(latest.clone()) {
                Ok(()) => tracing::info!(file = %latest.file_name, "tracking journal file"),
                Err(e) => tracing::warn!(file = %latest.file_name, "attach failed: {e}"),
            }
        }
    }
}

/// Polls the tailer once and pushes every complete line through the
/// decoder. Read errors stall the stream (kept attached, retried on the
/// next poll); decode errors skip the line and continue.
fn drain(tailer: &mut Tailer, on_event: &OnEventFn, on_decode_error: &OnDecodeErrorFn) {
    if !tailer.is_attached() {
        return;
    }
    let lines = match tailer.poll() {
        Ok(lines) => lines,
        Err(e) => {
            tracing::warn!("tail read failed, stream stalled: {e}");
            return;
        }
    };
    for line in lines {
        match decoder::decode(&line) {
            Ok(event) => on_event(event),
            Err(e) => {
                tracing::debug!("skipping journal line: {e}");
                on_decode_error(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    fn fast_config(dir: &Path) -> MonitorConfig {
        MonitorConfig {
            journal_dir: dir.to_path_buf(),
            poll_interval: Duration::from_millis(25),
            rescan_interval: Duration::from_millis(100),
        }
    }

    fn append(path: &Path, line: &str) {
        let mut f = std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .unwrap();
        writeln!(f, "{line}").unwrap();
    }

    struct Running {
        kinds: Arc<Mutex<Vec<String>>>,
        errors: Arc<Mutex<Vec<String>>>,
        cancel: CancellationToken,
        handle: tokio::task::JoinHandle<()>,
    }

    fn start(config: MonitorConfig) -> Running {
        let kinds = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();

        let kinds2 = Arc::clone(&kinds);
        let errors2 = Arc::clone(&errors);
        let handle = tokio::spawn(run(
            config,
            cancel.clone(),
            Box::new(move |event| kinds2.lock().unwrap().push(event.kind)),
            Box::new(move |err| errors2.lock().unwrap().push(err.to_string())),
        ));

        Running {
            kinds,
            errors,
            cancel,
            handle,
        }
    }

    async fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..100 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        panic!("condition not met within 5s");
    }

    #[tokio::test]
    async fn emits_only_lines_appended_after_start() {
        let tmp = tempfile::tempdir().unwrap();
        let journal = tmp.path().join("Journal.2026-01-01T000000.01.log");
        append(&journal, r#"{"timestamp":"t","event":"Historical"}"#);

        let running = start(fast_config(tmp.path()));

        // Wait until the monitor has attached, then append.
        tokio::time::sleep(Duration::from_millis(300)).await;
        append(&journal, r#"{"timestamp":"t","event":"FSDJump"}"#);
        append(&journal, r#"{"timestamp":"t","event":"Docked"}"#);

        wait_for(|| running.kinds.lock().unwrap().len() >= 2).await;
        running.cancel.cancel();
        running.handle.await.unwrap();

        let kinds = running.kinds.lock().unwrap();
        assert_eq!(*kinds, vec!["FSDJump", "Docked"]);
    }

    #[tokio::test]
    async fn rotation_preserves_order_without_duplication() {
        let tmp = tempfile::tempdir().unwrap();
        let file_a = tmp.path().join("Journal.2026-01-01T000000.01.log");
        append(&file_a, r#"{"timestamp":"t","event":"Old"}"#);

        let running = start(fast_config(tmp.path()));
        tokio::time::sleep(Duration::from_millis(300)).await;

        append(&file_a, r#"{"timestamp":"t","event":"L1"}"#);
        append(&file_a, r#"{"timestamp":"t","event":"L2"}"#);
        wait_for(|| running.kinds.lock().unwrap().len() >= 2).await;

        // Rotate: newer name, fresh content.
        let file_b = tmp.path().join("Journal.2026-01-02T000000.01.log");
        append(&file_b, r#"{"timestamp":"t","event":"L3"}"#);
        append(&file_b, r#"{"timestamp":"t","event":"L4"}"#);

        wait_for(|| running.kinds.lock().unwrap().len() >= 4).await;
        running.cancel.cancel();
        running.handle.await.unwrap();

        let kinds = running.kinds.lock().unwrap();
        assert_eq!(*kinds, vec!["L1", "L2", "L3", "L4"]);
    }

    #[tokio::test]
    async fn malformed_line_does_not_halt_stream() {
        let tmp = tempfile::tempdir().unwrap();
        let journal = tmp.path().join("Journal.2026-01-01T000000.01.log");
        append(&journal, "");

        let running = start(fast_config(tmp.path()));
        tokio::time::sleep(Duration::from_millis(300)).await;

        append(&journal, r#"{"timestamp":"t","event":"Good1"}"#);
        append(&journal, "this is not json");
        append(&journal, r#"{"timestamp":"t","event":"Good2"}"#);

        wait_for(|| running.kinds.lock().unwrap().len() >= 2).await;
        running.cancel.cancel();
        running.handle.await.unwrap();

        assert_eq!(*running.kinds.lock().unwrap(), vec!["Good1", "Good2"]);
        assert_eq!(running.errors.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_directory_keeps_retrying_until_it_appears() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("journals");

        let running = start(fast_config(&dir));
        tokio::time::sleep(Duration::from_millis(300)).await;

        // Directory appears later with a journal file; monitor picks it up.
        std::fs::create_dir_all(&dir).unwrap();
        let journal = dir.join("Journal.2026-01-01T000000.01.log");
        append(&journal, "");
        tokio::time::sleep(Duration::from_millis(300)).await;
        append(&journal, r#"{"timestamp":"t","event":"Recovered"}"#);

        wait_for(|| !running.kinds.lock().unwrap().is_empty()).await;
        running.cancel.cancel();
        running.handle.await.unwrap();

        assert_eq!(*running.kinds.lock().unwrap(), vec!["Recovered"]);
    }
}
