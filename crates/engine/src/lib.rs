//! # Dedup Engine
//!
//! Pairwise similarity scoring, duplicate grouping, and consolidation
//! advice for code chunks.
//!
//! ## Pipeline
//!
//! ```text
//! Chunk arena
//!     │
//!     ├──> Similarity Engine (exact > semantic > structural)
//!     │      └─> SimilarityEdge per accepted pair
//!     │
//!     ├──> Duplicate Grouper (connected components)
//!     │      └─> DuplicateGroup per component with ≥2 members
//!     │
//!     └──> Consolidation Advisor
//!            └─> ConsolidationSuggestion per group
//! ```
//!
//! Exactly one signal is recorded per edge: the highest-confidence signal
//! that clears its own threshold. Transitivity is intentional — if A
//! matches B and B matches C, all three land in one group even when A and
//! C were never directly compared.

mod advisor;
mod embedding;
mod error;
mod grouper;
mod similarity;

pub use advisor::{advise, ConsolidationStrategy, ConsolidationSuggestion, RETENTION_FACTOR};
pub use embedding::{cosine_similarity, EmbeddingCache, EmbeddingError, EmbeddingProvider};
pub use error::{EngineError, Result};
pub use grouper::{group, DuplicateGroup};
pub use similarity::{
    candidate_pairs, compare, structural_similarity, structural_tokens, SimilarityConfig,
    SimilarityEdge, SimilaritySignal,
};
