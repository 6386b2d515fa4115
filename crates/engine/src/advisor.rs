use crate::grouper::DuplicateGroup;
use crate::similarity::SimilaritySignal;
use dedup_chunker::CodeChunk;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Share of duplicated lines a refactor actually recovers. Residual glue
/// and boilerplate keep the rest.
pub const RETENTION_FACTOR: f64 = 0.7;

/// Refactor strategy recommended for a duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConsolidationStrategy {
    /// Identical code; extract into one shared definition
    ExtractFunction,
    /// Near-identical; parameterize the differences into a utility
    CreateUtility,
    /// Class-level duplication; merge the overlapping classes
    MergeClasses,
    /// Similar shape with diverging details; define a shared interface
    CreateInterface,
}

impl ConsolidationStrategy {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExtractFunction => "extract-function",
            Self::CreateUtility => "create-utility",
            Self::MergeClasses => "merge-classes",
            Self::CreateInterface => "create-interface",
        }
    }
}

/// Consolidation advice for one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationSuggestion {
    /// Group this suggestion applies to
    pub group_id: usize,

    /// Recommended refactor
    pub strategy: ConsolidationStrategy,

    /// Heuristic line-savings estimate, never negative
    pub estimated_lines_reduced: usize,

    /// Human-readable recommendation
    pub description: String,
}

static CLASS_CONSTRUCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(class|struct|interface|trait)\s+[A-Za-z_]").expect("valid regex")
});

/// Map a duplicate group to a refactor strategy and a savings estimate.
///
/// Rules are evaluated in a fixed order so the same group always gets the
/// same advice. The estimate assumes all members but the largest collapse
/// into one definition, scaled by [`RETENTION_FACTOR`].
#[must_use]
pub fn advise(group: &DuplicateGroup, members: &[CodeChunk]) -> ConsolidationSuggestion {
    let strategy = if group.signal == SimilaritySignal::Exact {
        ConsolidationStrategy::ExtractFunction
    } else if group.signal == SimilaritySignal::Semantic && group.max_similarity > 0.9 {
        ConsolidationStrategy::CreateUtility
    } else if members.iter().any(|m| CLASS_CONSTRUCT.is_match(&m.content)) {
        ConsolidationStrategy::MergeClasses
    } else {
        ConsolidationStrategy::CreateInterface
    };

    ConsolidationSuggestion {
        group_id: group.id,
        strategy,
        estimated_lines_reduced: estimate_lines_reduced(members),
        description: describe(strategy, members),
    }
}

fn estimate_lines_reduced(members: &[CodeChunk]) -> usize {
    let total: usize = members.iter().map(CodeChunk::line_count).sum();
    let largest = members.iter().map(CodeChunk::line_count).max().unwrap_or(0);
    let removable = total.saturating_sub(largest);
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let estimate = (removable as f64 * RETENTION_FACTOR).floor() as usize;
    estimate
}

fn describe(strategy: ConsolidationStrategy, members: &[CodeChunk]) -> String {
    let representative = members
        .first()
        .map(CodeChunk::location)
        .unwrap_or_else(|| "<unknown>".to_string());
    match strategy {
        ConsolidationStrategy::ExtractFunction => format!(
            "{} identical implementations; extract one shared definition (see {representative})",
            members.len()
        ),
        ConsolidationStrategy::CreateUtility => format!(
            "{} near-identical implementations; parameterize the differences into a utility (see {representative})",
            members.len()
        ),
        ConsolidationStrategy::MergeClasses => format!(
            "{} overlapping class definitions; merge them behind a single type (see {representative})",
            members.len()
        ),
        ConsolidationStrategy::CreateInterface => format!(
            "{} structurally similar units; define a shared interface and keep the variants behind it (see {representative})",
            members.len()
        ),
    }
}
