//! Markdown heading splitter.
//!
//! Splits document text into [`Chunk`]s along registered heading
//! boundaries. Each chunk is the contiguous span from one heading line to
//! the next heading of equal or higher level, and carries the heading
//! stack that was current when it started. A document with no matching
//! headings yields exactly one chunk with empty heading metadata.
//!
//! Heading detection is line-based and does not exclude fenced code
//! blocks, so a literal `# comment` line inside a fence opens a new chunk.
//! Fence awareness is a pending behavior decision; see DESIGN.md.

use crate::models::{Chunk, ChunkMetadata, Heading};

/// A registered heading boundary: a line starting with `marker` followed
/// by whitespace opens a new chunk at `level`.
#[derive(Debug, Clone)]
pub struct HeadingRule {
    pub marker: String,
    pub level: u8,
}

/// The two highest Markdown heading levels, `#` and `##`.
pub fn default_rules() -> Vec<HeadingRule> {
    vec![
        HeadingRule {
            marker: "#".to_string(),
            level: 1,
        },
        HeadingRule {
            marker: "##".to_string(),
            level: 2,
        },
    ]
}

/// Split `text` into chunks at heading boundaries, attaching `source` and
/// the current heading stack to each chunk. Chunk content is sliced from
/// the original text, so concatenating all chunks of a fully-chunked
/// document reproduces it byte for byte.
pub fn split_markdown(source: &str, text: &str, rules: &[HeadingRule]) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut stack: Vec<Heading> = Vec::new();
    let mut span_meta: Vec<Heading> = Vec::new();
    let mut span_start = 0usize;

    let bytes = text.as_bytes();
    let mut pos = 0usize;

    for line in text.lines() {
        let line_start = pos;
        pos += line.len();
        // lines() strips the terminator; advance past \r\n or \n if present
        if pos < bytes.len() && bytes[pos] == b'\r' {
            pos += 1;
        }
        if pos < bytes.len() && bytes[pos] == b'\n' {
            pos += 1;
        }

        let Some(rule) = match_rule(line, rules) else {
            continue;
        };

        // Close the span that ends at this boundary
        let span = &text[span_start..line_start];
        if !span.trim().is_empty() {
            chunks.push(make_chunk(source, span, &span_meta));
        }

        // An equal-or-higher heading clears deeper stack entries
        stack.retain(|h| h.level < rule.level);
        stack.push(Heading {
            level: rule.level,
            text: line[rule.marker.len()..].trim().to_string(),
        });

        span_start = line_start;
        span_meta = stack.clone();
    }

    let tail = &text[span_start..];
    if !tail.trim().is_empty() {
        chunks.push(make_chunk(source, tail, &span_meta));
    }

    // A document with no headings is one chunk with empty metadata
    if chunks.is_empty() {
        chunks.push(make_chunk(source, text, &[]));
    }

    chunks
}

/// Match a line against the registered rules. The longest marker wins so
/// `##` lines are not claimed by the `#` rule; the marker must be
/// followed by whitespace, so `#hashtag` is not a heading and `### x`
/// matches no two-level rule set.
fn match_rule<'a>(line: &str, rules: &'a [HeadingRule]) -> Option<&'a HeadingRule> {
    rules
        .iter()
        .filter(|rule| {
            line.starts_with(rule.marker.as_str())
                && line[rule.marker.len()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c == ' ' || c == '\t')
        })
        .max_by_key(|rule| rule.marker.len())
}

fn make_chunk(source: &str, content: &str, headings: &[Heading]) -> Chunk {
    Chunk {
        content: content.to_string(),
        metadata: ChunkMetadata {
            source: source.to_string(),
            headings: headings.to_vec(),
        },
    }
}
