use sha2::{Digest, Sha256};

/// Strip comments and collapse whitespace so that reformatting alone never
/// changes a chunk's identity.
///
/// Handles line comments (`//`, `#`) and block comments (`/* ... */`),
/// and leaves string literals intact: a `//` inside quotes is content, not
/// a comment. Whitespace is kept only where it separates two identifier
/// characters, so `sum(a, b)` and `sum(a,b)` normalize identically while
/// `let x` never degrades to `letx`.
#[must_use]
pub fn normalize_content(content: &str) -> String {
    let stripped = strip_comments(content);
    collapse_whitespace(&stripped)
}

/// SHA-256 hex digest of the normalized content.
///
/// This is the single canonical definition of exact-duplicate identity;
/// every exact-duplicate check in the system uses it.
#[must_use]
pub fn normalized_hash(content: &str) -> String {
    let normalized = normalize_content(content);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let bytes = content.as_bytes();
    let mut i = 0;
    let mut in_string: Option<u8> = None;
    let mut in_block_comment = false;
    let mut in_line_comment = false;

    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();

        if in_line_comment {
            if b == b'\n' {
                in_line_comment = false;
                out.push('\n');
            }
            i += 1;
            continue;
        }

        if in_block_comment {
            if b == b'*' && next == Some(b'/') {
                in_block_comment = false;
                i += 2;
            } else {
                if b == b'\n' {
                    out.push('\n');
                }
                i += 1;
            }
            continue;
        }

        if let Some(quote) = in_string {
            out.push(b as char);
            if b == b'\\' {
                if let Some(escaped) = next {
                    out.push(escaped as char);
                    i += 2;
                    continue;
                }
            } else if b == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' | b'\'' | b'`' => {
                in_string = Some(b);
                out.push(b as char);
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
            _ => {
                out.push(b as char);
                i += 1;
            }
        }
    }

    out
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

fn collapse_whitespace(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if !ch.is_whitespace() {
            out.push(ch);
            continue;
        }
        // swallow the whole whitespace run
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        // keep a single space only between two identifier characters
        let prev_ident = out.chars().last().is_some_and(is_ident_char);
        let next_ident = chars.peek().copied().is_some_and(is_ident_char);
        if prev_ident && next_ident {
            out.push(' ');
        }
    }

    out
}
