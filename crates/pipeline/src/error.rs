use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Fatal, run-aborting failures. Everything else is aggregated into the
/// report's error counters and the run still produces a report.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Project root unreadable: {0}")]
    ProjectRootUnreadable(String),

    #[error("Deadline elapsed before any work started")]
    DeadlineElapsed,

    #[error("Change tracker error: {0}")]
    ChangeTrackerError(#[from] dedup_change_tracker::ChangeTrackerError),

    #[error("Chunker error: {0}")]
    ChunkerError(#[from] dedup_chunker::ChunkerError),

    #[error("Engine error: {0}")]
    EngineError(#[from] dedup_engine::EngineError),
}
