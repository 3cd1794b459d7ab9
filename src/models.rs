//! Core data types used throughout Quarry.
//!
//! These types represent the chunk records, retrieved contexts, and answers
//! that flow through the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

/// Metadata persisted alongside each chunk record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Source file name (e.g. `notes.md`).
    pub source: String,
    /// 1-based chunk number within the source document.
    pub chunk: usize,
    /// Total chunk count for the source document at ingestion time.
    pub total_chunks: usize,
    /// Absolute path of the ingested file.
    pub file_path: String,
}

/// A (text, metadata) pair returned by a similarity query.
///
/// Constructed per query and discarded afterwards; never persisted.
#[derive(Debug, Clone)]
pub struct RetrievedContext {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// One entry in an answer's source list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCitation {
    pub source: String,
    pub chunk: usize,
    /// Preview of the cited chunk, truncated to 200 characters.
    pub text: String,
}

/// A grounded answer plus the contexts it was built from, in rank order.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceCitation>,
}

/// A single chat message in the role/content shape the chat endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}
