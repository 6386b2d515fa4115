use serde::{Deserialize, Serialize};

/// A file handed to the change detector for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    /// Project-relative path
    pub path: String,

    /// Full file content
    pub content: String,
}

impl ScannedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Persisted fingerprint record for a tracked file.
///
/// The only entity with cross-run lifetime: created on first sight of a
/// path, updated on each reprocessed change, removed when the file
/// disappears from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    /// Project-relative path
    pub path: String,

    /// SHA-256 hex digest of the file content
    pub content_hash: String,

    /// Content size in bytes
    pub size: u64,

    /// Unix milliseconds of the last run that saw this path
    pub last_seen_unix_ms: u64,
}

/// Classification of the current file set against the persisted map.
///
/// Ephemeral, produced once per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeSet {
    /// Paths absent from the persisted map
    pub added: Vec<String>,

    /// Paths whose content hash differs from the persisted one
    pub modified: Vec<String>,

    /// Paths present in the persisted map but absent from the current scan
    pub deleted: Vec<String>,

    /// Count of files whose hash matched
    pub unchanged: usize,

    /// True when the hash store was unavailable and every file was
    /// reclassified as modified for this run
    #[serde(default)]
    pub full_rescan: bool,
}

impl ChangeSet {
    /// Paths that need reprocessing this run (added + modified).
    pub fn changed_paths(&self) -> impl Iterator<Item = &str> {
        self.added
            .iter()
            .chain(self.modified.iter())
            .map(String::as_str)
    }

    /// True when nothing was added, modified, or deleted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}
