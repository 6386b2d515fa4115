use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use thiserror::Error;

/// Errors surfaced by embedding providers.
#[derive(Error, Debug, Clone)]
pub enum EmbeddingError {
    /// The provider cannot be reached; the semantic signal is skipped for
    /// the affected chunks and structural comparison still applies.
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("embedding rejected: {0}")]
    Rejected(String),
}

/// Port for the embedding collaborator.
///
/// Vectors must be deterministic for identical normalized text within one
/// provider version; determinism across provider versions is explicitly
/// not required.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Cosine similarity between two embedding vectors.
///
/// Returns 0.0 for mismatched dimensions or zero-norm inputs.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

const DEFAULT_CACHE_CAPACITY: usize = 4096;

/// In-memory vector cache keyed by normalized content hash.
///
/// Identical chunks (same normalized hash) embed once per run instead of
/// once per occurrence; a long-lived cache also survives across runs of
/// the same process.
pub struct EmbeddingCache {
    vectors: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .unwrap_or_else(|| NonZeroUsize::new(DEFAULT_CACHE_CAPACITY).expect("nonzero"));
        Self {
            vectors: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, normalized_hash: &str) -> Option<Vec<f32>> {
        let mut vectors = self.vectors.lock().expect("embedding cache lock poisoned");
        vectors.get(normalized_hash).cloned()
    }

    pub fn put(&self, normalized_hash: &str, vector: Vec<f32>) {
        let mut vectors = self.vectors.lock().expect("embedding cache lock poisoned");
        vectors.put(normalized_hash.to_string(), vector);
    }

    pub fn len(&self) -> usize {
        self.vectors.lock().expect("embedding cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
