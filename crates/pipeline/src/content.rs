use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors surfaced by content sources. Neither variant aborts a run: the
/// affected file is skipped and counted.
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Port for reading file content.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Read the text of one project-relative path.
    async fn read(&self, path: &str) -> Result<String, ContentError>;
}

/// Content source backed by the local filesystem under a project root.
pub struct FsContentSource {
    root: PathBuf,
}

impl FsContentSource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ContentSource for FsContentSource {
    async fn read(&self, path: &str) -> Result<String, ContentError> {
        let full = self.root.join(path);
        match tokio::fs::read_to_string(&full).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ContentError::NotFound(path.to_string()))
            }
            Err(e) => Err(ContentError::Io {
                path: path.to_string(),
                source: e,
            }),
        }
    }
}
