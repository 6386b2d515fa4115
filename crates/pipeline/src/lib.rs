//! # Dedup Pipeline
//!
//! Orchestrates duplicate-code detection over a project, one run at a
//! time.
//!
//! ## Pipeline
//!
//! ```text
//! Project root
//!     │
//!     ├──> File Scanner (.gitignore aware)
//!     │      └─> Change Detector (persisted fingerprints)
//!     │
//!     ├──> Chunk Extractor (changed files only, or all on full rescan)
//!     │      └─> Embedding generation (cache-first)
//!     │
//!     └──> Similarity Engine ──> Duplicate Grouper ──> Advisor
//!            └─> DeduplicationReport
//! ```
//!
//! External collaborators — the embedding provider, hash store, content
//! source, and syntax boundary provider — are injected as ports, so
//! availability is a per-call result rather than process-wide state.
//!
//! ## Example
//!
//! ```no_run
//! use dedup_pipeline::{FsContentSource, Pipeline, PipelineConfig, Ports, RunOptions};
//! use dedup_change_tracker::MemoryHashStore;
//! use dedup_chunker::NoBoundaries;
//! use dedup_engine::{EmbeddingError, EmbeddingProvider};
//! use std::sync::Arc;
//!
//! struct Offline;
//!
//! #[async_trait::async_trait]
//! impl EmbeddingProvider for Offline {
//!     async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
//!         Err(EmbeddingError::Unavailable("no provider configured".into()))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ports = Ports {
//!         hash_store: Arc::new(MemoryHashStore::new()),
//!         boundaries: Arc::new(NoBoundaries),
//!         embeddings: Arc::new(Offline),
//!         content: Arc::new(FsContentSource::new("/path/to/project")),
//!     };
//!     let pipeline = Pipeline::new("/path/to/project", "my-project", ports, PipelineConfig::default())?;
//!     let report = pipeline.run(RunOptions::default()).await?;
//!
//!     println!(
//!         "{} chunks, {} duplicate groups",
//!         report.total_chunks_analyzed,
//!         report.duplicate_groups.len()
//!     );
//!     Ok(())
//! }
//! ```

mod content;
mod coordinator;
mod error;
mod report;
mod scanner;

pub use content::{ContentError, ContentSource, FsContentSource};
pub use coordinator::{Pipeline, PipelineConfig, PipelineState, Ports, RunMode, RunOptions};
pub use error::{PipelineError, Result};
pub use report::{DeduplicationReport, ReportSummary, RunErrors};
pub use scanner::FileScanner;
