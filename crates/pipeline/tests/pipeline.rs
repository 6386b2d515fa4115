//! End-to-end pipeline runs against a real temp directory, with fake
//! collaborators standing in for the parser, embedding, and store ports.

use async_trait::async_trait;
use dedup_change_tracker::MemoryHashStore;
use dedup_chunker::{BoundaryProvider, ChunkKind, SyntaxBoundary};
use dedup_engine::{
    ConsolidationStrategy, EmbeddingError, EmbeddingProvider, SimilaritySignal,
};
use dedup_pipeline::{
    FsContentSource, Pipeline, PipelineConfig, Ports, RunMode, RunOptions,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Parser stand-in: every file is one function spanning all its lines.
struct WholeFileBoundaries;

impl BoundaryProvider for WholeFileBoundaries {
    fn boundaries(&self, file_path: &str, content: &str) -> Vec<SyntaxBoundary> {
        let lines = content.lines().count();
        if lines == 0 {
            return Vec::new();
        }
        let name = Path::new(file_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.to_string());
        vec![SyntaxBoundary::new(name, ChunkKind::Function, 1, lines)]
    }
}

/// Embedding stand-in keyed by content markers.
struct MarkerEmbedder;

#[async_trait]
impl EmbeddingProvider for MarkerEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.contains("alpha") {
            Ok(vec![1.0, 0.0])
        } else if text.contains("beta") {
            Ok(vec![0.8, 0.6])
        } else {
            Ok(vec![0.0, 1.0])
        }
    }
}

/// Embedding stand-in for an unreachable provider.
struct OfflineEmbedder;

#[async_trait]
impl EmbeddingProvider for OfflineEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Unavailable("connection refused".into()))
    }
}

/// Embedding stand-in that takes long enough to blow any short deadline.
struct SlowEmbedder;

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(vec![1.0])
    }
}

fn make_pipeline(
    root: &Path,
    embeddings: Arc<dyn EmbeddingProvider>,
) -> Pipeline {
    let _ = env_logger::builder().is_test(true).try_init();
    let ports = Ports {
        hash_store: Arc::new(MemoryHashStore::new()),
        boundaries: Arc::new(WholeFileBoundaries),
        embeddings,
        content: Arc::new(FsContentSource::new(root)),
    };
    Pipeline::new(root, "integration-test", ports, PipelineConfig::default()).unwrap()
}

const SUM_COMPACT: &str = "function sum(a, b) {\n  // add the numbers\n  const total = a + b;\n  return total;\n}\n";
const SUM_SPACED: &str = "function sum(a,b)\n{\n    /* add */\n    const total = a+b;\n    return total;\n}\n";
const UNRELATED: &str = "first = 1\nsecond = 2\nresult = first\nprint(result)\ndone = result\n";

#[tokio::test]
async fn whitespace_variants_form_one_exact_group() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("sum_a.js"), SUM_COMPACT).unwrap();
    std::fs::write(temp.path().join("sum_b.js"), SUM_SPACED).unwrap();
    std::fs::write(temp.path().join("other.py"), UNRELATED).unwrap();

    let pipeline = make_pipeline(temp.path(), Arc::new(OfflineEmbedder));
    let report = pipeline.run(RunOptions::default()).await.unwrap();

    assert_eq!(report.total_chunks_analyzed, 3);
    assert_eq!(report.duplicate_groups.len(), 1);

    let group = &report.duplicate_groups[0];
    assert_eq!(group.signal, SimilaritySignal::Exact);
    assert_eq!(group.max_similarity, 1.0);
    assert_eq!(group.members.len(), 2);

    assert_eq!(report.suggestions.len(), 1);
    assert_eq!(
        report.suggestions[0].strategy,
        ConsolidationStrategy::ExtractFunction
    );
    assert_eq!(report.summary.exact_count, 1);
    assert!(!report.partial);
}

#[tokio::test]
async fn offline_embedder_still_produces_a_report() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("a.js"), SUM_COMPACT).unwrap();
    std::fs::write(temp.path().join("b.py"), UNRELATED).unwrap();

    let pipeline = make_pipeline(temp.path(), Arc::new(OfflineEmbedder));
    let report = pipeline.run(RunOptions::default()).await.unwrap();

    // every chunk tried to embed and failed; the run still completed
    assert_eq!(report.errors.embedding_failures, report.total_chunks_analyzed);
    assert_eq!(report.summary.semantic_count, 0);
    assert!(!report.partial);
}

#[tokio::test]
async fn semantically_close_chunks_group_without_matching_hashes() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(
        temp.path().join("alpha.js"),
        "function alpha(a, b) {\n  const total = a + b;\n  log(total);\n  audit(total);\n  return total;\n}\n",
    )
    .unwrap();
    std::fs::write(
        temp.path().join("beta.js"),
        "function beta(items) {\n  let sum = 0;\n  for (const x of items) { sum += x; }\n  audit(sum);\n  return sum;\n}\n",
    )
    .unwrap();
    std::fs::write(temp.path().join("other.py"), UNRELATED).unwrap();

    let pipeline = make_pipeline(temp.path(), Arc::new(MarkerEmbedder));
    let report = pipeline.run(RunOptions::default()).await.unwrap();

    assert_eq!(report.duplicate_groups.len(), 1);
    let group = &report.duplicate_groups[0];
    assert_eq!(group.signal, SimilaritySignal::Semantic);
    assert!(group.max_similarity >= 0.75);
    assert_eq!(group.members.len(), 2);
    assert_eq!(report.summary.semantic_count, 1);
}

#[tokio::test]
async fn incremental_rerun_skips_unchanged_files() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("sum_a.js"), SUM_COMPACT).unwrap();
    std::fs::write(temp.path().join("sum_b.js"), SUM_SPACED).unwrap();

    let pipeline = make_pipeline(temp.path(), Arc::new(OfflineEmbedder));

    let first = pipeline.run(RunOptions::default()).await.unwrap();
    assert_eq!(first.total_chunks_analyzed, 2);
    assert_eq!(first.duplicate_groups.len(), 1);

    // nothing changed: no chunk work at all on the second run
    let second = pipeline.run(RunOptions::default()).await.unwrap();
    assert_eq!(second.total_chunks_analyzed, 0);
    assert!(second.duplicate_groups.is_empty());

    // a one-variable edit reprocesses exactly that file
    std::fs::write(
        temp.path().join("sum_a.js"),
        SUM_COMPACT.replace("total", "result"),
    )
    .unwrap();
    let third = pipeline.run(RunOptions::default()).await.unwrap();
    assert_eq!(third.total_chunks_analyzed, 1);
}

#[tokio::test]
async fn full_mode_reanalyzes_unchanged_files() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("sum_a.js"), SUM_COMPACT).unwrap();
    std::fs::write(temp.path().join("sum_b.js"), SUM_SPACED).unwrap();

    let pipeline = make_pipeline(temp.path(), Arc::new(OfflineEmbedder));
    pipeline.run(RunOptions::default()).await.unwrap();

    let opts = RunOptions {
        mode: RunMode::Full,
        deadline: None,
    };
    let full = pipeline.run(opts).await.unwrap();
    assert_eq!(full.total_chunks_analyzed, 2);
    assert_eq!(full.duplicate_groups.len(), 1);
}

#[tokio::test]
async fn deadline_expiry_yields_partial_report() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("sum_a.js"), SUM_COMPACT).unwrap();
    std::fs::write(temp.path().join("sum_b.js"), SUM_SPACED).unwrap();

    let pipeline = make_pipeline(temp.path(), Arc::new(SlowEmbedder));
    let opts = RunOptions {
        mode: RunMode::Incremental,
        deadline: Some(Instant::now() + Duration::from_millis(250)),
    };
    let report = pipeline.run(opts).await.unwrap();

    assert!(report.partial);

    // an interrupted run must not commit: the next run sees the same
    // files as still-changed
    let followup = pipeline.run(RunOptions::default()).await.unwrap();
    assert_eq!(followup.total_chunks_analyzed, 2);
}

#[tokio::test]
async fn savings_estimate_stays_within_bounds() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("sum_a.js"), SUM_COMPACT).unwrap();
    std::fs::write(temp.path().join("sum_b.js"), SUM_SPACED).unwrap();

    let pipeline = make_pipeline(temp.path(), Arc::new(OfflineEmbedder));
    let report = pipeline.run(RunOptions::default()).await.unwrap();

    let group = &report.duplicate_groups[0];
    let suggestion = &report.suggestions[0];
    let line_counts: Vec<usize> = [SUM_COMPACT, SUM_SPACED]
        .iter()
        .map(|s| s.lines().count())
        .collect();
    let total: usize = line_counts.iter().sum();
    let min = *line_counts.iter().min().unwrap();

    assert_eq!(group.members.len(), 2);
    assert!(suggestion.estimated_lines_reduced <= total - min);
}
