use crate::content::ContentSource;
use crate::error::{PipelineError, Result};
use crate::report::{DeduplicationReport, RunErrors};
use crate::scanner::FileScanner;
use dedup_change_tracker::{fingerprint, ChangeDetector, HashStore, ScannedFile};
use dedup_chunker::{normalize_content, BoundaryProvider, ChunkExtractor, CodeChunk, ExtractorConfig};
use dedup_engine::{
    advise, candidate_pairs, compare, group, EmbeddingCache, EmbeddingProvider, SimilarityConfig,
    SimilarityEdge,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Pairwise comparisons dispatched per worker task.
const COMPARE_BATCH: usize = 2048;

/// Pipeline phase, observable for tests and progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Scanning,
    Extracting,
    Comparing,
    Grouping,
    Advising,
    Reporting,
}

/// Whether change detection narrows the analyzed file set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Analyze only files classified as added or modified
    #[default]
    Incremental,
    /// Analyze every scanned file
    Full,
}

/// Per-run options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub mode: RunMode,

    /// Overall deadline. In-flight work finishes, no new work is
    /// scheduled after expiry, and the report is marked partial.
    pub deadline: Option<Instant>,
}

/// The external collaborators the pipeline is wired to.
pub struct Ports {
    pub hash_store: Arc<dyn HashStore>,
    pub boundaries: Arc<dyn BoundaryProvider>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub content: Arc<dyn ContentSource>,
}

/// Tuning knobs for one pipeline instance.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub similarity: SimilarityConfig,
    pub extractor: ExtractorConfig,
}

/// Orchestrates one deduplication run per call: scan, detect changes,
/// extract chunks, embed, compare, group, advise, report.
///
/// Per-unit failures are isolated and aggregated into the report's error
/// counters; only an unreadable project root or an already-elapsed
/// deadline aborts a run. Concurrent runs against the same project are
/// not supported internally — callers must enforce at most one run per
/// project at a time.
pub struct Pipeline {
    root: PathBuf,
    project_id: String,
    detector: ChangeDetector,
    extractor: Arc<ChunkExtractor>,
    embeddings: Arc<dyn EmbeddingProvider>,
    content: Arc<dyn ContentSource>,
    similarity: SimilarityConfig,
    cache: EmbeddingCache,
    state: Mutex<PipelineState>,
}

impl Pipeline {
    pub fn new(
        root: impl AsRef<Path>,
        project_id: impl Into<String>,
        ports: Ports,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.similarity.validate()?;
        let extractor = ChunkExtractor::new(ports.boundaries, config.extractor)?;

        Ok(Self {
            root: root.as_ref().to_path_buf(),
            project_id: project_id.into(),
            detector: ChangeDetector::new(ports.hash_store),
            extractor: Arc::new(extractor),
            embeddings: ports.embeddings,
            content: ports.content,
            similarity: config.similarity,
            cache: EmbeddingCache::default(),
            state: Mutex::new(PipelineState::Idle),
        })
    }

    /// Current pipeline phase.
    pub fn state(&self) -> PipelineState {
        *self.state.lock().expect("pipeline state lock poisoned")
    }

    fn set_state(&self, state: PipelineState) {
        log::debug!("Pipeline state: {state:?}");
        *self.state.lock().expect("pipeline state lock poisoned") = state;
    }

    /// Run one deduplication pass and produce a report.
    #[allow(clippy::too_many_lines)]
    pub async fn run(&self, opts: RunOptions) -> Result<DeduplicationReport> {
        let deadline = opts.deadline;
        if deadline_hit(deadline) {
            return Err(PipelineError::DeadlineElapsed);
        }

        let meta = tokio::fs::metadata(&self.root).await.map_err(|e| {
            PipelineError::ProjectRootUnreadable(format!("{}: {e}", self.root.display()))
        })?;
        if !meta.is_dir() {
            return Err(PipelineError::ProjectRootUnreadable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        let mut errors = RunErrors::default();
        let mut partial = false;

        // 1. Scan for files and read their content
        self.set_state(PipelineState::Scanning);
        let paths = FileScanner::new(&self.root).scan();
        let scanned = self
            .read_files(&paths, deadline, &mut errors, &mut partial)
            .await;

        // 2. Classify against the persisted hash map
        let changes = self.detector.detect(&self.project_id, &scanned).await?;
        errors.store_degraded = changes.full_rescan;

        let process_all = opts.mode == RunMode::Full || changes.full_rescan;
        let changed: HashSet<&str> = changes.changed_paths().collect();
        let to_process: Vec<&ScannedFile> = scanned
            .iter()
            .filter(|f| process_all || changed.contains(f.path.as_str()))
            .collect();

        // 3. Extract chunks into the run arena
        self.set_state(PipelineState::Extracting);
        let mut arena = self
            .extract_chunks(&to_process, deadline, &mut partial)
            .await;
        let total_lines_analyzed: usize = arena.iter().map(CodeChunk::line_count).sum();

        // 4. Embed chunks (cache-first, failures isolated per chunk)
        self.embed_chunks(&mut arena, deadline, &mut errors, &mut partial)
            .await;

        // 5. Pairwise comparison across the worker pool
        self.set_state(PipelineState::Comparing);
        let arena = Arc::new(arena);
        let edges = self
            .compare_chunks(Arc::clone(&arena), deadline, &mut partial)
            .await;

        // 6. Grouping starts only after every comparison has completed
        self.set_state(PipelineState::Grouping);
        let groups = group(&edges);

        // 7. Consolidation advice
        self.set_state(PipelineState::Advising);
        let mut suggestions = Vec::with_capacity(groups.len());
        let mut group_lines = Vec::with_capacity(groups.len());
        for g in &groups {
            let members: Vec<CodeChunk> = g.members.iter().map(|&id| arena[id].clone()).collect();
            group_lines.push(members.iter().map(CodeChunk::line_count).sum::<usize>());
            suggestions.push(advise(g, &members));
        }

        // 8. Commit new hashes only after a complete, non-degraded run:
        // a skipped commit just means the next run reclassifies the same
        // files as still-changed.
        if !errors.store_degraded && !partial {
            let new_hashes: HashMap<String, (String, u64)> = scanned
                .iter()
                .map(|f| {
                    (
                        f.path.clone(),
                        (fingerprint(&f.content), f.content.len() as u64),
                    )
                })
                .collect();
            if let Err(e) = self.detector.commit(&self.project_id, &new_hashes).await {
                log::warn!("Hash commit failed for {}: {e}", self.project_id);
                errors.store_degraded = true;
            }
        }

        self.set_state(PipelineState::Reporting);
        let report = DeduplicationReport::from_run(
            arena.len(),
            total_lines_analyzed,
            groups,
            suggestions,
            &group_lines,
            errors,
            partial,
        );

        self.set_state(PipelineState::Idle);
        log::info!(
            "Run complete for {}: {} chunks, {} groups{}",
            self.project_id,
            report.total_chunks_analyzed,
            report.duplicate_groups.len(),
            if report.partial { " (partial)" } else { "" }
        );
        Ok(report)
    }

    /// Read file contents through the content port in bounded batches.
    async fn read_files(
        &self,
        paths: &[String],
        deadline: Option<Instant>,
        errors: &mut RunErrors,
        partial: &mut bool,
    ) -> Vec<ScannedFile> {
        let mut scanned = Vec::with_capacity(paths.len());

        for batch in paths.chunks(max_concurrency()) {
            if deadline_hit(deadline) {
                *partial = true;
                break;
            }
            let mut tasks = Vec::with_capacity(batch.len());
            for path in batch {
                let content = Arc::clone(&self.content);
                let path = path.clone();
                tasks.push(tokio::spawn(async move {
                    let result = content.read(&path).await;
                    (path, result)
                }));
            }
            for task in tasks {
                match task.await {
                    Ok((path, Ok(content))) => scanned.push(ScannedFile::new(path, content)),
                    Ok((path, Err(e))) => errors.add_io_error(&path, &e.to_string()),
                    Err(e) => log::warn!("Read task panicked: {e}"),
                }
            }
        }

        scanned
    }

    /// Extract chunks for the selected files in bounded batches and
    /// renumber them into one arena indexed by chunk id.
    async fn extract_chunks(
        &self,
        files: &[&ScannedFile],
        deadline: Option<Instant>,
        partial: &mut bool,
    ) -> Vec<CodeChunk> {
        let mut arena: Vec<CodeChunk> = Vec::new();

        for batch in files.chunks(max_concurrency()) {
            if deadline_hit(deadline) {
                *partial = true;
                break;
            }
            let mut tasks = Vec::with_capacity(batch.len());
            for file in batch {
                let extractor = Arc::clone(&self.extractor);
                let path = file.path.clone();
                let content = file.content.clone();
                tasks.push(tokio::spawn(async move {
                    extractor.extract(&path, &content)
                }));
            }
            for task in tasks {
                match task.await {
                    Ok(chunks) => {
                        for mut chunk in chunks {
                            chunk.id = arena.len();
                            arena.push(chunk);
                        }
                    }
                    Err(e) => log::warn!("Extraction task panicked: {e}"),
                }
            }
        }

        arena
    }

    /// Generate embeddings, cache-first by normalized hash. An
    /// unavailable provider skips the semantic signal for the affected
    /// chunk only; structural comparison still applies to its pairs.
    async fn embed_chunks(
        &self,
        arena: &mut [CodeChunk],
        deadline: Option<Instant>,
        errors: &mut RunErrors,
        partial: &mut bool,
    ) {
        let indices: Vec<usize> = (0..arena.len()).collect();

        for batch in indices.chunks(max_concurrency()) {
            if deadline_hit(deadline) {
                *partial = true;
                break;
            }
            let mut tasks = Vec::with_capacity(batch.len());
            for &idx in batch {
                if let Some(vector) = self.cache.get(&arena[idx].normalized_hash) {
                    arena[idx].embedding = Some(vector);
                    continue;
                }
                let embeddings = Arc::clone(&self.embeddings);
                let text = normalize_content(&arena[idx].content);
                tasks.push(tokio::spawn(async move {
                    let result = embeddings.embed(&text).await;
                    (idx, result)
                }));
            }
            for task in tasks {
                match task.await {
                    Ok((idx, Ok(vector))) => {
                        self.cache.put(&arena[idx].normalized_hash, vector.clone());
                        arena[idx].embedding = Some(vector);
                    }
                    Ok((idx, Err(e))) => {
                        log::debug!(
                            "Embedding failed for {}: {e}",
                            arena[idx].location()
                        );
                        errors.add_embedding_failure();
                    }
                    Err(e) => log::warn!("Embedding task panicked: {e}"),
                }
            }
        }
    }

    /// Run pairwise comparison as independent worker tasks. Each task
    /// reads two already-computed chunks; edges are appended at a single
    /// accumulation point after each batch joins.
    async fn compare_chunks(
        &self,
        arena: Arc<Vec<CodeChunk>>,
        deadline: Option<Instant>,
        partial: &mut bool,
    ) -> Vec<SimilarityEdge> {
        let pairs = candidate_pairs(&arena, &self.similarity);
        let mut edges = Vec::new();

        for batch in pairs.chunks(COMPARE_BATCH * max_concurrency()) {
            if deadline_hit(deadline) {
                *partial = true;
                break;
            }
            let mut tasks = Vec::new();
            for task_pairs in batch.chunks(COMPARE_BATCH) {
                let arena = Arc::clone(&arena);
                let config = self.similarity;
                let task_pairs = task_pairs.to_vec();
                tasks.push(tokio::spawn(async move {
                    let mut found = Vec::new();
                    for (i, j) in task_pairs {
                        if let Some(edge) = compare(&arena[i], &arena[j], &config) {
                            found.push(edge);
                        }
                    }
                    found
                }));
            }
            for task in tasks {
                match task.await {
                    Ok(found) => edges.extend(found),
                    Err(e) => log::warn!("Comparison task panicked: {e}"),
                }
            }
        }

        edges
    }
}

fn deadline_hit(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// File processing mixes IO and CPU; an unbounded fan-out spikes CPU and
/// RAM on large runs, so the pool is kept small and adaptive.
fn max_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(2, 8)
}
