use dedup_engine::{ConsolidationSuggestion, DuplicateGroup, SimilaritySignal};
use serde::{Deserialize, Serialize};

/// Non-fatal failures aggregated over one run.
///
/// Run-scoped by construction: the struct is created per run, threaded
/// through the pipeline, and returned to the caller inside the report —
/// there is no process-wide availability flag anywhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunErrors {
    /// Files skipped because reading them failed
    pub io_errors: usize,

    /// Chunks whose embedding could not be generated
    pub embedding_failures: usize,

    /// True when the hash store was unavailable and change detection
    /// degraded to a full rescan
    pub store_degraded: bool,
}

impl RunErrors {
    pub fn add_io_error(&mut self, path: &str, reason: &str) {
        self.io_errors += 1;
        log::warn!("Skipping {path}: {reason}");
    }

    pub fn add_embedding_failure(&mut self) {
        self.embedding_failures += 1;
    }
}

/// Aggregate counts for the duplicate groups found in one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportSummary {
    /// Groups whose strongest signal is exact
    pub exact_count: usize,

    /// Groups whose strongest signal is semantic
    pub semantic_count: usize,

    /// Groups whose strongest signal is structural
    pub structural_count: usize,

    /// Total lines across all group members
    pub total_lines_affected: usize,

    /// Sum of the per-group line-savings estimates
    pub potential_savings: usize,

    /// Lines across every chunk analyzed this run
    pub total_lines_analyzed: usize,
}

impl ReportSummary {
    /// Percentage of analyzed lines that sit inside some duplicate group.
    #[must_use]
    pub fn duplicate_line_percent(&self) -> f64 {
        if self.total_lines_analyzed == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                self.total_lines_affected as f64 / self.total_lines_analyzed as f64 * 100.0
            }
        }
    }

    pub(crate) fn count_group(&mut self, signal: SimilaritySignal) {
        match signal {
            SimilaritySignal::Exact => self.exact_count += 1,
            SimilaritySignal::Semantic => self.semantic_count += 1,
            SimilaritySignal::Structural => self.structural_count += 1,
        }
    }
}

/// Final output of one deduplication run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeduplicationReport {
    /// Number of chunks that entered pairwise comparison
    pub total_chunks_analyzed: usize,

    /// Duplicate groups, largest first
    pub duplicate_groups: Vec<DuplicateGroup>,

    /// One consolidation suggestion per group
    pub suggestions: Vec<ConsolidationSuggestion>,

    /// Aggregate counts
    pub summary: ReportSummary,

    /// Human-readable recommendations, one per group
    pub recommendations: Vec<String>,

    /// Non-fatal failures aggregated over the run
    pub errors: RunErrors,

    /// True if the run hit its deadline before completing
    pub partial: bool,
}

impl DeduplicationReport {
    /// Build the report from the grouped-and-advised run results.
    #[must_use]
    pub fn from_run(
        total_chunks_analyzed: usize,
        total_lines_analyzed: usize,
        groups: Vec<DuplicateGroup>,
        suggestions: Vec<ConsolidationSuggestion>,
        group_lines: &[usize],
        errors: RunErrors,
        partial: bool,
    ) -> Self {
        let mut summary = ReportSummary {
            total_lines_analyzed,
            ..Default::default()
        };
        for (group, lines) in groups.iter().zip(group_lines) {
            summary.count_group(group.signal);
            summary.total_lines_affected += lines;
        }
        summary.potential_savings = suggestions.iter().map(|s| s.estimated_lines_reduced).sum();

        let recommendations = suggestions.iter().map(|s| s.description.clone()).collect();

        Self {
            total_chunks_analyzed,
            duplicate_groups: groups,
            suggestions,
            summary,
            recommendations,
            errors,
            partial,
        }
    }
}
