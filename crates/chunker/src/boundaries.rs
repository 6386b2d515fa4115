use crate::types::SyntaxBoundary;

/// Port for the language-aware parser collaborator.
///
/// Implementations walk a file's syntax tree and report the ranges of
/// functions, methods, and classes. The extractor trusts the reported
/// line ranges but clamps them to the file, so a slightly stale parse
/// cannot produce out-of-range chunks.
pub trait BoundaryProvider: Send + Sync {
    /// Syntax boundaries for one file, in any order.
    fn boundaries(&self, file_path: &str, content: &str) -> Vec<SyntaxBoundary>;
}

/// Provider that reports no boundaries; extraction then relies entirely
/// on fallback block scanning. Useful for unsupported languages.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBoundaries;

impl BoundaryProvider for NoBoundaries {
    fn boundaries(&self, _file_path: &str, _content: &str) -> Vec<SyntaxBoundary> {
        Vec::new()
    }
}
