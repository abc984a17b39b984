//! Journal directory monitoring for Squadrone Tracker.
//!
//! The game appends one JSON record per line to the newest file in its
//! journal directory and rotates to a fresh file on session start or when
//! the current file grows too large. This crate finds the current file,
//! tails it incrementally, follows rotations without gaps or duplicates,
//! and decodes each line into a [`squadrone_protocol::JournalEvent`].
//!
//! [`monitor::run`] is the entry point; the submodules are usable on their
//! own for tests and tooling.

pub mod catalog;
pub mod decoder;
pub mod monitor;
pub mod tailer;
pub mod watcher;

pub use catalog::JournalFileRef;
pub use decoder::DecodeError;
pub use monitor::MonitorConfig;
pub use tailer::Tailer;

/// Errors produced by the journal pipeline.
///
/// All of these are contained at their scope: directory unavailability is
/// a retrying "not tracking" state, attach failures trigger a re-catalog,
/// and a lost watch falls back to periodic rescans. None of them should
/// ever terminate the host process.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    /// The journal directory cannot be listed (missing, permissions).
    #[error("journal directory unavailable: {0}")]
    DirectoryUnavailable(std::io::Error),

    /// A journal file could not be opened for tailing.
    #[error("journal source unavailable: {0}")]
    SourceUnavailable(std::io::Error),

    /// The directory observer failed; rotations may go unnoticed until it
    /// is respawned.
    #[error("directory watch lost: {0}")]
    WatchLost(String),

    /// A read against the attached file failed mid-stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An operation that needs an attached file was called without one.
    #[error("tailer is not attached to a journal file")]
    NotAttached,
}
