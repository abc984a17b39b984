//! Incremental journal tailer.
//!
//! Owns the cursor into the attached file: only the tailer's own read path
//! advances the offset, and the offset resets to zero only when the
//! attached file changes. A trailing partial line is buffered and prefixed
//! to the next read, so lines are emitted exactly once, complete, in file
//! order.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::JournalError;
use crate::catalog::JournalFileRef;

/// Bytes read per syscall.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Upper bound on bytes consumed by a single [`Tailer::poll`] call.
/// A large backlog is drained across several polls so one call cannot
/// stall the event loop.
const MAX_BYTES_PER_POLL: usize = 1024 * 1024;

struct ActiveTail {
    file_ref: JournalFileRef,
    file: File,
    offset: u64,
    /// Trailing bytes of an incomplete line, held until the terminator
    /// arrives.
    partial: Vec<u8>,
}

/// Tails at most one journal file at a time.
///
/// State machine: unattached → attached(file, offset) → detach →
/// attached(new file, 0). Detaching drops the handle immediately, so no
/// read can touch the old file afterwards even if a stale append
/// notification arrives.
#[derive(Default)]
pub struct Tailer {
    active: Option<ActiveTail>,
}

impl Tailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches to `file_ref` at its current end.
    ///
    /// Content written before attach time is never replayed; a file picked
    /// up mid-session yields only lines appended from now on. Any previous
    /// attachment is released first.
    pub fn attach(&mut self, file_ref: JournalFileRef) -> Result<(), JournalError> {
        self.attach_at(file_ref, SeekFrom::End(0))
    }

    /// Attaches to `file_ref` at offset zero.
    ///
    /// Used for rotation targets, where every line of the new file is
    /// wanted from the beginning.
    pub fn attach_from_start(&mut self, file_ref: JournalFileRef) -> Result<(), JournalError> {
        self.attach_at(file_ref, SeekFrom::Start(0))
    }

    fn attach_at(&mut self, file_ref: JournalFileRef, pos: SeekFrom) -> Result<(), JournalError> {
        self.detach();
        let mut file = File::open(file_ref.path()).map_err(JournalError::SourceUnavailable)?;
        let offset = file.seek(pos).map_err(JournalError::SourceUnavailable)?;
        tracing::debug!(file = %file_ref.file_name, offset, "attached to journal file");
        self.active = Some(ActiveTail {
            file_ref,
            file,
            offset,
            partial: Vec::new(),
        });
        Ok(())
    }

    /// Releases the attached file, if any.
    ///
    /// Effective immediately: the handle is dropped here, and any buffered
    /// partial line dies with it (a rotation mid-write loses at most that
    /// unterminated fragment).
    pub fn detach(&mut self) {
        if let Some(tail) = self.active.take() {
            tracing::debug!(file = %tail.file_ref.file_name, offset = tail.offset, "detached");
        }
    }

    /// Whether a file is currently attached.
    pub fn is_attached(&self) -> bool {
        self.active.is_some()
    }

    /// The currently attached file, if any.
    pub fn active_file(&self) -> Option<&JournalFileRef> {
        self.active.as_ref().map(|t| &t.file_ref)
    }

    /// Current byte offset into the attached file.
    pub fn offset(&self) -> Option<u64> {
        self.active.as_ref().map(|t| t.offset)
    }

    /// Reads newly appended bytes and returns the complete lines they
    /// form, in file order.
    ///
    /// A trailing unterminated line stays buffered until a later poll sees
    /// its terminator. At most [`MAX_BYTES_PER_POLL`] bytes are consumed
    /// per call; the remainder of a backlog is picked up next time.
    pub fn poll(&mut self) -> Result<Vec<String>, JournalError> {
        let tail = self.active.as_mut().ok_or(JournalError::NotAttached)?;

        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        let mut consumed = 0usize;
        while consumed < MAX_BYTES_PER_POLL {
            let n = tail.file.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            tail.offset += n as u64;
            consumed += n;
            tail.partial.extend_from_slice(&chunk[..n]);
        }

        Ok(split_complete_lines(&mut tail.partial))
    }
}

/// Splits buffered bytes into complete lines, leaving trailing
/// unterminated bytes in `buf`. Strips `\r` and skips empty lines.
fn split_complete_lines(buf: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut start = 0usize;

    while let Some(pos) = buf[start..].iter().position(|&b| b == b'\n') {
        let end = start + pos;
        let mut line = &buf[start..end];
        if line.last() == Some(&b'\r') {
            line = &line[..line.len() - 1];
        }
        if !line.is_empty() {
            lines.push(String::from_utf8_lossy(line).into_owned());
        }
        start = end + 1;
    }

    buf.drain(..start);
    lines
}
