//! Persisted vector index.
//!
//! A thin wrapper holding the storage and selection policy for indexed
//! chunks: a single SQLite file at the configured location, one row per
//! chunk with its metadata and embedding BLOB. Embedding computation is
//! delegated to the configured [`Embedder`]; similarity ranking and the
//! MMR diversification policy live here.
//!
//! The index is a pure derived artifact of the last full rebuild — there
//! is no incremental update or delete. It is destroyed only by
//! [`VectorIndex::destroy`].

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob, Embedder};
use crate::models::{Chunk, ChunkMetadata};
use crate::rank::{mmr_select, Candidate};

pub struct VectorIndex {
    pool: SqlitePool,
    embedder: Box<dyn Embedder>,
}

impl VectorIndex {
    /// Open (creating if missing) the index file at `path` and ensure the
    /// schema exists.
    pub async fn open(path: &Path, embedder: Box<dyn Embedder>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entries (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                metadata_json TEXT NOT NULL,
                content TEXT NOT NULL,
                hash TEXT NOT NULL,
                embedding BLOB NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_source ON entries(source)")
            .execute(&pool)
            .await?;

        Ok(Self { pool, embedder })
    }

    /// Whether a persisted index exists at `path`.
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Delete the persisted index in full, including WAL/SHM siblings.
    /// Missing files are not an error.
    pub fn destroy(path: &Path) -> Result<()> {
        for candidate in [path.to_path_buf(), sibling(path, "-wal"), sibling(path, "-shm")] {
            match std::fs::remove_file(&candidate) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("Failed to delete {}", candidate.display()))
                }
            }
        }
        Ok(())
    }

    /// Embed and persist a batch of chunks. Blank chunks are skipped
    /// rather than rejected; an embedding-provider failure aborts the
    /// whole call. Returns the number of entries written.
    pub async fn add(&self, chunks: &[Chunk]) -> Result<usize> {
        let chunks: Vec<&Chunk> = chunks
            .iter()
            .filter(|c| !c.content.trim().is_empty())
            .collect();
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        let mut tx = self.pool.begin().await?;
        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            let id = uuid::Uuid::new_v4().to_string();
            let metadata_json = serde_json::to_string(&chunk.metadata)?;
            let hash = content_hash(&chunk.content);
            let blob = vec_to_blob(vector);

            sqlx::query(
                "INSERT INTO entries (id, source, metadata_json, content, hash, embedding) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(&chunk.metadata.source)
            .bind(&metadata_json)
            .bind(&chunk.content)
            .bind(&hash)
            .bind(&blob)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(chunks.len())
    }

    /// Retrieve up to `k` chunks for a query. All entries are cosine-
    /// ranked against the query embedding and truncated to a `fetch_k`
    /// candidate pool; with `diversify` the final `k` are MMR-selected
    /// from that pool, otherwise they are the plain top `k`. Scores are
    /// not exposed.
    pub async fn query(
        &self,
        text: &str,
        k: usize,
        diversify: bool,
        fetch_k: usize,
        lambda: f32,
    ) -> Result<Vec<Chunk>> {
        let query_vec = self.embedder.embed_query(text).await?;

        let rows = sqlx::query("SELECT metadata_json, content, embedding FROM entries")
            .fetch_all(&self.pool)
            .await?;

        struct Scored {
            chunk: Chunk,
            vector: Vec<f32>,
            similarity: f32,
        }

        let mut scored = Vec::with_capacity(rows.len());
        for row in &rows {
            let metadata_json: String = row.get("metadata_json");
            let metadata: ChunkMetadata = serde_json::from_str(&metadata_json)
                .with_context(|| "Corrupt metadata in index entry")?;
            let blob: Vec<u8> = row.get("embedding");
            let vector = blob_to_vec(&blob);
            let similarity = cosine_similarity(&query_vec, &vector);
            scored.push(Scored {
                chunk: Chunk {
                    content: row.get("content"),
                    metadata,
                },
                vector,
                similarity,
            });
        }

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(fetch_k);

        if !diversify {
            return Ok(scored.into_iter().take(k).map(|s| s.chunk).collect());
        }

        let candidates: Vec<Candidate> = scored
            .iter()
            .enumerate()
            .map(|(index, s)| Candidate {
                index,
                vector: s.vector.clone(),
            })
            .collect();
        let picked = mmr_select(&query_vec, &candidates, k, lambda);

        let mut chunks: Vec<Option<Chunk>> = scored.into_iter().map(|s| Some(s.chunk)).collect();
        Ok(picked
            .into_iter()
            .filter_map(|idx| chunks[idx].take())
            .collect())
    }

    /// Number of persisted entries.
    pub async fn len(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// SHA-256 hex digest of chunk content; stable chunk identity across
/// rebuilds of an unchanged corpus.
pub fn content_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `index.sqlite` + `-wal` → `index.sqlite-wal` (SQLite appends the
/// suffix to the whole file name).
fn sibling(path: &Path, suffix: &str) -> std::path::PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}
