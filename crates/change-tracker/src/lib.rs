//! # Dedup Change Tracker
//!
//! Content-addressed change detection for incremental analysis runs.
//!
//! ## Pipeline
//!
//! ```text
//! Current scan ──> fingerprint each file (SHA-256)
//!                      │
//!                      ├──> compare against persisted path→hash map
//!                      │       └─> added / modified / deleted / unchanged
//!                      │
//!                      └──> commit new hashes after reprocessing succeeds
//! ```
//!
//! Fingerprints are persisted through the [`HashStore`] port, so a crash
//! mid-run leaves the map stale and the next run simply reclassifies the
//! affected files as still-changed (at-least-once reprocessing).
//!
//! ## Example
//!
//! ```no_run
//! use dedup_change_tracker::{ChangeDetector, MemoryHashStore, ScannedFile};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let detector = ChangeDetector::new(Arc::new(MemoryHashStore::new()));
//!     let files = vec![ScannedFile::new("src/main.rs", "fn main() {}")];
//!     let changes = detector.detect("my-project", &files).await?;
//!
//!     println!("{} added, {} modified", changes.added.len(), changes.modified.len());
//!     Ok(())
//! }
//! ```

mod detector;
mod error;
mod store;
mod types;

pub use detector::{fingerprint, ChangeDetector, DEFAULT_RECORD_TTL};
pub use error::{ChangeTrackerError, Result};
pub use store::{HashStore, JsonHashStore, MemoryHashStore, StoreError};
pub use types::{ChangeSet, FileRecord, ScannedFile};
