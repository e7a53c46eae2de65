//! Core data models used throughout docs-copilot.
//!
//! These types represent the chunks flowing through the indexing pipeline
//! and the per-file results the indexing orchestrator aggregates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One heading on the path leading to a chunk, e.g. `(1, "Storage")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Metadata attached to every chunk: the file it came from and the
/// heading stack (outermost first, at most the two registered levels)
/// that was current when the chunk started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Path of the scanned source file.
    pub source: String,
    /// Heading path for the chunk; empty for documents without headings.
    pub headings: Vec<Heading>,
}

/// A contiguous span of document text bounded by heading markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub metadata: ChunkMetadata,
}

/// Outcome of ingesting a single file. A failed file never aborts the
/// batch; its reason is carried here instead.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<usize, String>,
}

impl FileOutcome {
    pub fn ok(path: PathBuf, chunks: usize) -> Self {
        Self {
            path,
            result: Ok(chunks),
        }
    }

    pub fn failed(path: PathBuf, reason: String) -> Self {
        Self {
            path,
            result: Err(reason),
        }
    }
}

/// Aggregated result of one full index rebuild.
#[derive(Debug, Clone, Default)]
pub struct IndexReport {
    pub outcomes: Vec<FileOutcome>,
}

impl IndexReport {
    /// Number of files the scanner produced.
    pub fn scanned(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of files whose chunks all reached the index.
    pub fn indexed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Total chunks written across all successful files.
    pub fn chunks_written(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }

    /// The files that failed, with their reasons.
    pub fn failures(&self) -> Vec<(&PathBuf, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Ok(_) => None,
                Err(reason) => Some((&o.path, reason.as_str())),
            })
            .collect()
    }
}
