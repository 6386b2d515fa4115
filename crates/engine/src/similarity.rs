use crate::embedding::cosine_similarity;
use crate::error::{EngineError, Result};
use dedup_chunker::CodeChunk;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Similarity signal, ordered by confidence: `Exact > Semantic > Structural`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilaritySignal {
    /// Shared structural-token ratio cleared its threshold
    Structural,
    /// Embedding cosine similarity cleared its threshold
    Semantic,
    /// Normalized content hashes are equal
    Exact,
}

impl SimilaritySignal {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Semantic => "semantic",
            Self::Structural => "structural",
        }
    }
}

/// An accepted pairwise match between two chunks in the run arena.
///
/// Exactly one signal per edge: the highest-confidence signal that cleared
/// its own threshold. `signal == Exact` implies `score == 1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    /// Arena index of the first chunk
    pub a: usize,

    /// Arena index of the second chunk
    pub b: usize,

    /// Similarity score in [0, 1]
    pub score: f32,

    /// The signal that accepted this pair
    pub signal: SimilaritySignal,
}

/// Acceptance thresholds for the non-exact signals.
///
/// The exact-duplicate threshold is implicitly 1.0 and always a stricter
/// superset of the semantic one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Minimum cosine similarity for a semantic edge
    pub semantic_threshold: f32,

    /// Minimum shared-token ratio for a structural edge
    pub structural_threshold: f32,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            semantic_threshold: 0.75,
            structural_threshold: 0.60,
        }
    }
}

impl SimilarityConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("semantic_threshold", self.semantic_threshold),
            ("structural_threshold", self.structural_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Compare two chunks, strongest signal first.
///
/// Signals are evaluated in strict priority order and the first one to
/// clear its threshold wins; lower-priority signals are not evaluated once
/// a higher one accepts. A missing embedding on either side skips the
/// semantic signal only — structural comparison still applies.
#[must_use]
pub fn compare(a: &CodeChunk, b: &CodeChunk, config: &SimilarityConfig) -> Option<SimilarityEdge> {
    if a.id == b.id {
        return None;
    }

    if a.normalized_hash == b.normalized_hash {
        return Some(SimilarityEdge {
            a: a.id,
            b: b.id,
            score: 1.0,
            signal: SimilaritySignal::Exact,
        });
    }

    if let (Some(va), Some(vb)) = (a.embedding.as_deref(), b.embedding.as_deref()) {
        let score = cosine_similarity(va, vb).clamp(0.0, 1.0);
        if score >= config.semantic_threshold {
            return Some(SimilarityEdge {
                a: a.id,
                b: b.id,
                score,
                signal: SimilaritySignal::Semantic,
            });
        }
    }

    let score = structural_similarity(&a.content, &b.content);
    if score >= config.structural_threshold {
        return Some(SimilarityEdge {
            a: a.id,
            b: b.id,
            score,
            signal: SimilaritySignal::Structural,
        });
    }

    None
}

static WORD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("valid regex"));

/// Control-flow and declaration keywords across the mainstream languages
/// the chunker sees. Identifiers outside this set carry naming, not
/// structure, and are ignored.
const STRUCTURAL_KEYWORDS: &[&str] = &[
    // control flow
    "if", "else", "elif", "for", "while", "loop", "match", "switch", "case", "default", "return",
    "break", "continue", "try", "catch", "except", "finally", "throw", "raise", "yield", "await",
    "async", "defer", "goto",
    // declarations
    "fn", "func", "function", "def", "class", "struct", "enum", "trait", "interface", "impl",
    "let", "var", "const", "static", "type", "public", "private", "protected", "pub", "import",
    "use", "from", "new", "extends", "implements", "lambda",
];

const STRUCTURAL_PUNCTUATION: &[char] = &[
    '{', '}', '(', ')', '[', ']', ';', ',', '=', '<', '>', '+', '-', '*', '/', '%', '!', '&', '|',
    '?', ':', '.',
];

/// Structural token set of a chunk: control-flow keywords, declaration
/// keywords, and punctuation of syntactic significance.
#[must_use]
pub fn structural_tokens(content: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();

    for m in WORD_TOKEN.find_iter(content) {
        let word = m.as_str();
        if STRUCTURAL_KEYWORDS.contains(&word) {
            tokens.insert(word.to_string());
        }
    }

    for ch in content.chars() {
        if STRUCTURAL_PUNCTUATION.contains(&ch) {
            tokens.insert(ch.to_string());
        }
    }

    tokens
}

/// Ratio of shared structural tokens to the union of tokens from both
/// chunks (Jaccard). Two chunks with no structural tokens at all share
/// nothing measurable and score 0.
#[must_use]
pub fn structural_similarity(a: &str, b: &str) -> f32 {
    let tokens_a = structural_tokens(a);
    let tokens_b = structural_tokens(b);

    if tokens_a.is_empty() && tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let score = intersection as f32 / union as f32;
    score
}

/// Candidate pairs for pairwise comparison.
///
/// Skips only pairs that provably cannot produce any edge: hashes differ,
/// no embedding on at least one side, and token-set sizes so far apart
/// that the structural ratio cannot reach its threshold (the intersection
/// is at most the smaller set, the union at least the larger). The
/// surviving pairs therefore yield results identical to full O(n²)
/// comparison.
#[must_use]
pub fn candidate_pairs(chunks: &[CodeChunk], config: &SimilarityConfig) -> Vec<(usize, usize)> {
    let token_counts: Vec<usize> = chunks
        .iter()
        .map(|c| structural_tokens(&c.content).len())
        .collect();

    let mut pairs = Vec::new();
    for i in 0..chunks.len() {
        for j in (i + 1)..chunks.len() {
            if chunks[i].normalized_hash == chunks[j].normalized_hash {
                pairs.push((i, j));
                continue;
            }
            if chunks[i].embedding.is_some() && chunks[j].embedding.is_some() {
                pairs.push((i, j));
                continue;
            }
            let min = token_counts[i].min(token_counts[j]);
            let max = token_counts[i].max(token_counts[j]);
            #[allow(clippy::cast_precision_loss)]
            if max > 0 && (min as f32 / max as f32) < config.structural_threshold {
                continue;
            }
            pairs.push((i, j));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use dedup_chunker::{normalized_hash, ChunkKind};
    use pretty_assertions::assert_eq;

    fn chunk(id: usize, content: &str, embedding: Option<Vec<f32>>) -> CodeChunk {
        CodeChunk {
            id,
            file_path: format!("file{id}.rs"),
            start_line: 1,
            end_line: content.lines().count().max(1),
            content: content.to_string(),
            normalized_hash: normalized_hash(content),
            kind: ChunkKind::Function,
            embedding,
        }
    }

    #[test]
    fn signal_ordering_ranks_exact_highest() {
        assert!(SimilaritySignal::Exact > SimilaritySignal::Semantic);
        assert!(SimilaritySignal::Semantic > SimilaritySignal::Structural);
    }

    #[test]
    fn identical_normalized_content_is_exact_with_score_one() {
        let a = chunk(0, "function sum(a,b){return a+b;}", None);
        let b = chunk(1, "function sum(a, b) {\n  // add\n  return a + b;\n}", None);
        let edge = compare(&a, &b, &SimilarityConfig::default()).unwrap();
        assert_eq!(edge.signal, SimilaritySignal::Exact);
        assert_eq!(edge.score, 1.0);
    }

    #[test]
    fn exact_wins_over_semantic_even_with_embeddings() {
        let a = chunk(0, "fn f() { 1 }", Some(vec![1.0, 0.0]));
        let b = chunk(1, "fn f() { 1 }", Some(vec![0.0, 1.0]));
        let edge = compare(&a, &b, &SimilarityConfig::default()).unwrap();
        assert_eq!(edge.signal, SimilaritySignal::Exact);
    }

    #[test]
    fn semantic_edge_requires_threshold() {
        let config = SimilarityConfig::default();
        let a = chunk(0, "fn alpha() { compute(); }", Some(vec![1.0, 0.0, 0.0]));
        let near = chunk(1, "def alpha(): compute_all()", Some(vec![0.9, 0.1, 0.0]));
        let far = chunk(2, "SELECT 1", Some(vec![0.0, 1.0, 0.0]));

        let edge = compare(&a, &near, &config).unwrap();
        assert_eq!(edge.signal, SimilaritySignal::Semantic);
        assert!(edge.score >= config.semantic_threshold);

        // orthogonal vectors and no structural overlap worth accepting
        assert!(compare(&a, &far, &config).is_none());
    }

    #[test]
    fn missing_embedding_falls_back_to_structural() {
        let config = SimilarityConfig::default();
        let a = chunk(0, "if (x) { return y; } else { return z; }", None);
        let b = chunk(1, "if (a) { return b; } else { return c; }", Some(vec![1.0]));
        let edge = compare(&a, &b, &config).unwrap();
        assert_eq!(edge.signal, SimilaritySignal::Structural);
        assert!(edge.score >= config.structural_threshold);
    }

    #[test]
    fn structural_similarity_is_jaccard_on_token_sets() {
        // identical structural shape, different identifiers
        let score = structural_similarity(
            "if (count) { total = total + count; }",
            "if (items) { sum = sum + items; }",
        );
        assert!((score - 1.0).abs() < 1e-6);

        // no shared tokens at all
        assert_eq!(structural_similarity("hello world", "foo bar"), 0.0);
    }

    #[test]
    fn structural_similarity_is_symmetric() {
        let a = "for x in items { push(x); }";
        let b = "while y < n { y += 1; }";
        assert_eq!(structural_similarity(a, b), structural_similarity(b, a));
    }

    #[test]
    fn no_edge_below_both_thresholds() {
        let config = SimilarityConfig::default();
        let a = chunk(0, "let x = 1;", None);
        let b = chunk(1, "while true { spin() }", None);
        assert!(compare(&a, &b, &config).is_none());
    }

    #[test]
    fn self_comparison_yields_no_edge() {
        let a = chunk(0, "fn f() {}", None);
        assert!(compare(&a, &a, &SimilarityConfig::default()).is_none());
    }

    #[test]
    fn score_always_within_unit_interval() {
        let config = SimilarityConfig::default();
        let a = chunk(0, "if (x) { return 1; }", Some(vec![3.0, 4.0]));
        let b = chunk(1, "if (y) { return 2; }", Some(vec![6.0, 8.0]));
        let edge = compare(&a, &b, &config).unwrap();
        assert!(edge.score >= 0.0 && edge.score <= 1.0);
    }

    #[test]
    fn candidate_pairs_match_exhaustive_comparison() {
        let config = SimilarityConfig::default();
        let chunks = vec![
            chunk(0, "function sum(a,b){return a+b;}", None),
            chunk(1, "function sum(a, b) { return a + b; }", None),
            chunk(2, "if (x) { return y; } else { return z; }", None),
            chunk(3, "x", None),
            chunk(4, "class Foo { constructor() { this.x = 1; } }", Some(vec![1.0, 0.0])),
            chunk(5, "class Bar { constructor() { this.y = 2; } }", Some(vec![0.95, 0.05])),
        ];

        let mut exhaustive = Vec::new();
        for i in 0..chunks.len() {
            for j in (i + 1)..chunks.len() {
                if let Some(edge) = compare(&chunks[i], &chunks[j], &config) {
                    exhaustive.push(edge);
                }
            }
        }

        let mut via_candidates = Vec::new();
        for (i, j) in candidate_pairs(&chunks, &config) {
            if let Some(edge) = compare(&chunks[i], &chunks[j], &config) {
                via_candidates.push(edge);
            }
        }

        assert_eq!(exhaustive, via_candidates);
        assert!(!exhaustive.is_empty());
    }

    #[test]
    fn config_validation_rejects_out_of_range() {
        let bad = SimilarityConfig {
            semantic_threshold: 1.5,
            structural_threshold: 0.6,
        };
        assert!(bad.validate().is_err());
        assert!(SimilarityConfig::default().validate().is_ok());
    }
}
