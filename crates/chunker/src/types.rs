use serde::{Deserialize, Serialize};

/// Kind of semantic code unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// Standalone function
    Function,
    /// Method inside a class
    Method,
    /// Class definition
    Class,
    /// Brace-delimited fallback block
    Block,
}

impl ChunkKind {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Block => "block",
        }
    }
}

/// A syntax boundary reported by the language-aware parser collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxBoundary {
    /// Symbol name (function name, class name, etc.)
    pub name: String,

    /// Kind of unit this boundary delimits
    pub kind: ChunkKind,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,
}

impl SyntaxBoundary {
    pub fn new(name: impl Into<String>, kind: ChunkKind, start_line: usize, end_line: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            start_line,
            end_line,
        }
    }
}

/// A semantic code chunk with line-range provenance
///
/// Ephemeral per run; identity for exact-duplicate purposes is the
/// normalized content hash, not the raw bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeChunk {
    /// Arena index assigned per run
    pub id: usize,

    /// Source file path
    pub file_path: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// The actual code content
    pub content: String,

    /// SHA-256 hex of the comment-stripped, whitespace-collapsed content
    pub normalized_hash: String,

    /// Kind of unit
    pub kind: ChunkKind,

    /// Embedding vector, when the provider produced one this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl CodeChunk {
    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Stable display label for reports ("file.rs:10-24")
    #[must_use]
    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.start_line, self.end_line)
    }
}
