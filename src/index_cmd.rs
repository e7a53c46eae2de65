//! Indexing orchestration.
//!
//! Drives the full rebuild flow: existing-index confirmation → delete →
//! scan → per-file chunk + index. This design performs full reindex
//! only; the persisted index is deleted in its entirety before
//! repopulating. A failure reading, chunking, or indexing one file is
//! captured as a [`FileOutcome`] and the batch continues — one bad file
//! never aborts the run.

use anyhow::Result;
use std::path::Path;

use crate::chunker::{default_rules, split_markdown, HeadingRule};
use crate::config::Config;
use crate::embedding::Embedder;
use crate::models::{FileOutcome, IndexReport};
use crate::scan::scan_corpus;
use crate::store::VectorIndex;

/// Rebuild the index from scratch. When a persisted index already exists
/// at the configured location, `confirm` is consulted before anything is
/// deleted; declining returns `Ok(None)` with no side effects.
pub async fn run_index(
    config: &Config,
    embedder: Box<dyn Embedder>,
    confirm: &mut dyn FnMut() -> Result<bool>,
) -> Result<Option<IndexReport>> {
    let index_path = &config.index.path;

    if VectorIndex::exists(index_path) {
        if !confirm()? {
            return Ok(None);
        }
        VectorIndex::destroy(index_path)?;
    }

    let index = VectorIndex::open(index_path, embedder).await?;
    let files = scan_corpus(&config.corpus.root, &config.corpus.extension)?;
    let rules = default_rules();

    let mut report = IndexReport::default();

    for file in files {
        match ingest_file(&index, &file, &rules).await {
            Ok(chunks) => {
                println!("file: {} added to index ({} chunks)", file.display(), chunks);
                report.outcomes.push(FileOutcome::ok(file, chunks));
            }
            Err(e) => {
                eprintln!("error occurred while processing {}: {}", file.display(), e);
                report.outcomes.push(FileOutcome::failed(file, e.to_string()));
            }
        }
    }

    index.close().await;
    Ok(Some(report))
}

/// Read, chunk, and index a single file; returns the chunk count.
async fn ingest_file(index: &VectorIndex, path: &Path, rules: &[HeadingRule]) -> Result<usize> {
    let text = std::fs::read_to_string(path)?;
    let chunks = split_markdown(&path.to_string_lossy(), &text, rules);
    index.add(&chunks).await
}

/// Scan and chunk without touching providers or the persisted index.
/// Returns `(files, chunks)` counts.
pub fn run_index_dry(config: &Config) -> Result<(usize, usize)> {
    let files = scan_corpus(&config.corpus.root, &config.corpus.extension)?;
    let rules = default_rules();

    let mut total_chunks = 0usize;
    for file in &files {
        if let Ok(text) = std::fs::read_to_string(file) {
            total_chunks += split_markdown(&file.to_string_lossy(), &text, &rules).len();
        }
    }

    Ok((files.len(), total_chunks))
}
