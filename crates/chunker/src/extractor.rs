use crate::boundaries::BoundaryProvider;
use crate::config::ExtractorConfig;
use crate::error::{ChunkerError, Result};
use crate::normalize::normalized_hash;
use crate::types::{ChunkKind, CodeChunk, SyntaxBoundary};
use std::sync::Arc;

/// Splits a file into semantic chunks.
///
/// Primary chunks come from the boundary provider; brace-delimited blocks
/// not covered by any boundary are scanned as a language-agnostic
/// fallback. Chunks below the configured minimum line count are dropped.
pub struct ChunkExtractor {
    provider: Arc<dyn BoundaryProvider>,
    config: ExtractorConfig,
}

impl ChunkExtractor {
    pub fn new(provider: Arc<dyn BoundaryProvider>, config: ExtractorConfig) -> Result<Self> {
        config
            .validate()
            .map_err(ChunkerError::invalid_config)?;
        Ok(Self { provider, config })
    }

    /// Extract chunks for one file. Chunk ids are file-local; the caller
    /// renumbers them into its per-run arena.
    pub fn extract(&self, file_path: &str, content: &str) -> Vec<CodeChunk> {
        let lines: Vec<&str> = content.lines().collect();
        if lines.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut covered: Vec<(usize, usize)> = Vec::new();

        let mut boundaries = self.provider.boundaries(file_path, content);
        boundaries.sort_by_key(|b| (b.start_line, b.end_line));

        for boundary in &boundaries {
            match self.chunk_from_boundary(file_path, &lines, boundary) {
                Ok(Some(chunk)) => {
                    covered.push((chunk.start_line, chunk.end_line));
                    chunks.push(chunk);
                }
                Ok(None) => {}
                Err(e) => {
                    log::debug!("Skipping boundary {} in {file_path}: {e}", boundary.name);
                }
            }
        }

        if self.config.fallback_blocks {
            for (start, end) in scan_brace_blocks(content, self.config.max_block_depth) {
                let overlaps = covered
                    .iter()
                    .any(|&(cs, ce)| start <= ce && end >= cs);
                if overlaps {
                    continue;
                }
                if end.saturating_sub(start) + 1 < self.config.min_chunk_lines {
                    continue;
                }
                if let Ok(Some(chunk)) = self.slice(file_path, &lines, start, end, ChunkKind::Block) {
                    covered.push((chunk.start_line, chunk.end_line));
                    chunks.push(chunk);
                }
            }
        }

        for (idx, chunk) in chunks.iter_mut().enumerate() {
            chunk.id = idx;
        }
        chunks
    }

    fn chunk_from_boundary(
        &self,
        file_path: &str,
        lines: &[&str],
        boundary: &SyntaxBoundary,
    ) -> Result<Option<CodeChunk>> {
        self.slice(
            file_path,
            lines,
            boundary.start_line,
            boundary.end_line,
            boundary.kind,
        )
    }

    fn slice(
        &self,
        file_path: &str,
        lines: &[&str],
        start_line: usize,
        end_line: usize,
        kind: ChunkKind,
    ) -> Result<Option<CodeChunk>> {
        if start_line == 0 || end_line < start_line {
            return Err(ChunkerError::InvalidBoundaries {
                start: start_line,
                end: end_line,
            });
        }
        let end_line = end_line.min(lines.len());
        if start_line > lines.len() {
            return Err(ChunkerError::InvalidBoundaries {
                start: start_line,
                end: end_line,
            });
        }
        if end_line.saturating_sub(start_line) + 1 < self.config.min_chunk_lines {
            return Ok(None);
        }

        let content = lines[start_line - 1..end_line].join("\n");
        let hash = normalized_hash(&content);
        Ok(Some(CodeChunk {
            id: 0,
            file_path: file_path.to_string(),
            start_line,
            end_line,
            content,
            normalized_hash: hash,
            kind,
            embedding: None,
        }))
    }
}

/// Scan brace-delimited blocks up to `max_depth`, string- and
/// comment-aware. Returns (start_line, end_line) pairs, 1-indexed
/// inclusive, outermost blocks first.
fn scan_brace_blocks(content: &str, max_depth: usize) -> Vec<(usize, usize)> {
    let mut blocks = Vec::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut line = 1usize;

    let bytes = content.as_bytes();
    let mut i = 0;
    let mut in_string: Option<u8> = None;
    let mut in_block_comment = false;
    let mut in_line_comment = false;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        if b == b'\n' {
            line += 1;
            in_line_comment = false;
            i += 1;
            continue;
        }

        if in_line_comment {
            i += 1;
            continue;
        }
        if in_block_comment {
            if b == b'*' && next == Some(b'/') {
                in_block_comment = false;
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }
        if let Some(quote) = in_string {
            if b == b'\\' {
                i += 2;
                continue;
            }
            if b == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' | b'\'' | b'`' => {
                in_string = Some(b);
                i += 1;
            }
            b'/' if next == Some(b'/') => {
                in_line_comment = true;
                i += 2;
            }
            b'/' if next == Some(b'*') => {
                in_block_comment = true;
                i += 2;
            }
            b'#' => {
                in_line_comment = true;
                i += 1;
            }
            b'{' => {
                stack.push(line);
                i += 1;
            }
            b'}' => {
                if let Some(start) = stack.pop() {
                    // depth after pop == nesting level of this block
                    if stack.len() < max_depth {
                        blocks.push((start, line));
                    }
                }
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    blocks.sort();
    blocks.dedup();
    blocks
}
