//! # Dedup Chunker
//!
//! Splits source files into semantic units for duplicate analysis.
//!
//! Primary chunks follow syntax boundaries supplied by a language-aware
//! parser collaborator (the [`BoundaryProvider`] port); brace-delimited
//! blocks are scanned as a language-agnostic fallback for regions no
//! boundary covers. Every chunk carries a content hash computed after
//! stripping comments and collapsing whitespace, so reformatting alone
//! never changes chunk identity.

mod boundaries;
mod config;
mod error;
mod extractor;
mod normalize;
mod types;

pub use boundaries::{BoundaryProvider, NoBoundaries};
pub use config::ExtractorConfig;
pub use error::{ChunkerError, Result};
pub use extractor::ChunkExtractor;
pub use normalize::{normalize_content, normalized_hash};
pub use types::{ChunkKind, CodeChunk, SyntaxBoundary};
