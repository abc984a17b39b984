//! Journal file discovery and ranking.
//!
//! Journal file names share the `Journal.` prefix followed by a sortable
//! timestamp plus part suffix, so lexicographic-descending order over the
//! name puts the most recently created file first.

use std::path::{Path, PathBuf};

use crate::JournalError;

/// File name prefix shared by every journal file.
pub const JOURNAL_PREFIX: &str = "Journal.";

/// A discovered journal file.
///
/// Identity is the file name. Refs are superseded by newer ones when the
/// game rotates, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalFileRef {
    pub directory: PathBuf,
    pub file_name: String,
}

impl JournalFileRef {
    /// Full path to the file.
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

/// Lists journal files in `dir`, most recently created first.
///
/// Stateless and side-effect free; safe to call repeatedly. Only names
/// matching [`JOURNAL_PREFIX`] participate.
pub fn list_candidates(dir: &Path) -> Result<Vec<JournalFileRef>, JournalError> {
    let entries = std::fs::read_dir(dir).map_err(JournalError::DirectoryUnavailable)?;

    let mut candidates: Vec<JournalFileRef> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with(JOURNAL_PREFIX))
        .map(|file_name| JournalFileRef {
            directory: dir.to_path_buf(),
            file_name,
        })
        .collect();

    // The name encodes creation order; descending sort puts the newest
    // first. Holds for both journal name formats the game has shipped
    // (zero-padded timestamp and part number).
    candidates.sort_unstable_by(|a, b| b.file_name.cmp(&a.file_name));
    Ok(candidates)
}

/// Returns the most recent journal file, if any.
pub fn latest(dir: &Path) -> Result<Option<JournalFileRef>, JournalError> {
    Ok(list_candidates(dir)?.into_iter().next())
}
