//! Typed errors for the ingestion and retrieval pipeline.
//!
//! Remote-service and store failures carry their transport error as the
//! source so callers can log the full chain. The orchestrator decides which
//! of these are soft outcomes (ingestion) and which propagate (answering).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The embedding endpoint could not be reached or returned a non-success
    /// status.
    #[error("embedding service unavailable: {source}")]
    EmbeddingServiceUnavailable {
        #[source]
        source: reqwest::Error,
    },

    /// The embedding endpoint answered, but the envelope held no vector
    /// under either accepted field. Carries a prefix of the offending text.
    #[error("no embedding returned for text: {prefix}...")]
    EmbeddingResponseInvalid { prefix: String },

    /// The chat endpoint could not be reached or returned a non-success
    /// status.
    #[error("chat service unavailable: {source}")]
    ChatServiceUnavailable {
        #[source]
        source: reqwest::Error,
    },

    /// A store write was attempted with mismatched or empty columns.
    #[error(
        "record batch shape mismatch: ids={ids}, texts={texts}, metadatas={metadatas}, vectors={vectors}"
    )]
    RecordShapeMismatch {
        ids: usize,
        texts: usize,
        metadatas: usize,
        vectors: usize,
    },

    #[error("vector store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
