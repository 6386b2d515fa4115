use thiserror::Error;

/// Result type for chunk extraction operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while extracting chunks
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// A boundary references lines outside the file
    #[error("Invalid chunk boundaries: start={start}, end={end}")]
    InvalidBoundaries { start: usize, end: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChunkerError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
