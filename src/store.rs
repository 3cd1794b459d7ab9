//! SQLite-backed vector store adapter.
//!
//! Persists (id, text, metadata, vector) records under a named collection
//! and answers nearest-neighbor queries by cosine similarity. The store is
//! a thin adapter: vectors are opaque payloads encoded as little-endian f32
//! BLOBs, and ranking happens in Rust over the fetched candidates.
//!
//! A [`VectorStore`] is the collection handle described by the system
//! contract: opened once per process with get-or-create semantics and
//! passed explicitly to whoever needs it, so tests can substitute an
//! isolated store under a temporary directory.
//!
//! Query failures are deliberately swallowed into an empty result — the
//! caller treats "nothing found" and "store errored" identically, and the
//! distinction is kept visible through logging only.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::cmp::Ordering;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::PipelineError;
use crate::models::{ChunkMetadata, RetrievedContext};

/// Hard cap on results returned by a single query, whatever the caller asks.
pub const MAX_QUERY_RESULTS: usize = 20;

/// Handle to one collection in the on-disk store.
pub struct VectorStore {
    pool: SqlitePool,
    collection: String,
}

impl VectorStore {
    /// Open (or create) the store under `persist_dir` and bind to
    /// `collection`. Idempotent: the directory, database file, and schema
    /// are created only when missing.
    pub async fn open(persist_dir: &Path, collection: &str) -> Result<Self, PipelineError> {
        std::fs::create_dir_all(persist_dir)?;
        let db_path = persist_dir.join("quarry.sqlite");

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                text TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT '{}',
                embedding BLOB NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            collection: collection.to_string(),
        })
    }

    /// Upsert a batch of records by id.
    ///
    /// All four slices must have equal, non-zero length or the call fails
    /// with [`PipelineError::RecordShapeMismatch`]. The batch is written in
    /// one transaction: either every record lands or none do. The last
    /// write for a given id wins; there are no merge semantics.
    pub async fn add(
        &self,
        ids: &[String],
        texts: &[String],
        metadatas: &[ChunkMetadata],
        vectors: &[Vec<f32>],
    ) -> Result<(), PipelineError> {
        if ids.is_empty()
            || ids.len() != texts.len()
            || ids.len() != metadatas.len()
            || ids.len() != vectors.len()
        {
            return Err(PipelineError::RecordShapeMismatch {
                ids: ids.len(),
                texts: texts.len(),
                metadatas: metadatas.len(),
                vectors: vectors.len(),
            });
        }

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for i in 0..ids.len() {
            let metadata_json =
                serde_json::to_string(&metadatas[i]).unwrap_or_else(|_| "{}".to_string());

            sqlx::query(
                r#"
                INSERT INTO records (collection, id, text, metadata, embedding, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(collection, id) DO UPDATE SET
                    text = excluded.text,
                    metadata = excluded.metadata,
                    embedding = excluded.embedding,
                    created_at = excluded.created_at
                "#,
            )
            .bind(&self.collection)
            .bind(&ids[i])
            .bind(&texts[i])
            .bind(&metadata_json)
            .bind(vec_to_blob(&vectors[i]))
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Return up to `k` stored contexts ranked by cosine similarity to
    /// `query_vector`, closest first.
    ///
    /// `k` is clamped to `1..=20` here regardless of what was requested.
    /// An empty store and a failed query both yield an empty vector; the
    /// failure is logged, never propagated.
    pub async fn query(&self, query_vector: &[f32], k: usize) -> Vec<RetrievedContext> {
        let k = k.clamp(1, MAX_QUERY_RESULTS);

        match self.ranked_candidates(query_vector, k).await {
            Ok(contexts) => contexts,
            Err(e) => {
                warn!(error = %e, "vector store query failed, returning no results");
                Vec::new()
            }
        }
    }

    async fn ranked_candidates(
        &self,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedContext>, PipelineError> {
        let rows = sqlx::query("SELECT text, metadata, embedding FROM records WHERE collection = ?")
            .bind(&self.collection)
            .fetch_all(&self.pool)
            .await?;

        let mut scored: Vec<(f32, RetrievedContext)> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vector = blob_to_vec(&blob);
                let similarity = cosine_similarity(query_vector, &vector);

                let metadata_json: String = row.get("metadata");
                let metadata: ChunkMetadata =
                    serde_json::from_str(&metadata_json).unwrap_or_default();

                (
                    similarity,
                    RetrievedContext {
                        text: row.get("text"),
                        metadata,
                    },
                )
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, context)| context).collect())
    }

    /// Number of records in this collection.
    pub async fn count(&self) -> Result<i64, PipelineError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records WHERE collection = ?")
            .bind(&self.collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Per-source chunk counts, largest first.
    pub async fn source_breakdown(&self) -> Result<Vec<(String, i64)>, PipelineError> {
        let rows = sqlx::query(
            r#"
            SELECT COALESCE(json_extract(metadata, '$.source'), '(unknown)') AS source,
                   COUNT(*) AS chunk_count
            FROM records
            WHERE collection = ?
            GROUP BY source
            ORDER BY chunk_count DESC, source ASC
            "#,
        )
        .bind(&self.collection)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get("source"), row.get("chunk_count")))
            .collect())
    }

    /// Size of the backing database file in bytes, if it can be read.
    pub fn db_size(persist_dir: &Path) -> u64 {
        std::fs::metadata(persist_dir.join("quarry.sqlite"))
            .map(|m| m.len())
            .unwrap_or(0)
    }
}
