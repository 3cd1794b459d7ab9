//! End-to-end orchestration of the two pipeline operations.
//!
//! [`Pipeline::ingest`] runs file → text → chunks → embeddings → store
//! write; [`Pipeline::retrieve_and_answer`] runs question → query vector →
//! nearest contexts → grounded prompt → chat → answer with citations.
//!
//! Ingestion never fails on remote-service trouble: embedding is retried
//! with exponential backoff and exhaustion becomes a "0 chunks added"
//! outcome, as do unsupported files, empty extractions, and store-write
//! failures. Answering is the opposite — a chat failure has no sensible
//! silent fallback and propagates to the caller.

use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::chunk::Chunker;
use crate::config::Config;
use crate::embedding::TextEmbedder;
use crate::error::PipelineError;
use crate::extract::{extract_path, Extracted};
use crate::llm::ChatClient;
use crate::models::{Answer, ChunkMetadata, RetrievedContext, SourceCitation};
use crate::prompt;
use crate::store::VectorStore;

/// Fixed answer returned when retrieval produces no contexts.
pub const NO_RESULTS_ANSWER: &str = "No relevant information found in the knowledge base.";

/// Total embedding attempts per ingested file.
const EMBED_ATTEMPTS: u32 = 3;
/// Base delay between attempts; doubles after each failure (1 s, 2 s).
const BACKOFF_BASE: Duration = Duration::from_secs(1);
/// Citation previews are cut at this many characters.
const PREVIEW_CHARS: usize = 200;

/// The ingestion-and-retrieval pipeline, holding its collaborators.
///
/// The store handle is passed in rather than opened here so callers (and
/// tests) control which collection the pipeline works against.
pub struct Pipeline {
    chunker: Chunker,
    embedder: Box<dyn TextEmbedder>,
    chat: Box<dyn ChatClient>,
    store: VectorStore,
    max_chars: usize,
    overlap_chars: usize,
}

impl Pipeline {
    pub fn new(
        store: VectorStore,
        embedder: Box<dyn TextEmbedder>,
        chat: Box<dyn ChatClient>,
        config: &Config,
    ) -> Self {
        Self {
            chunker: Chunker::new(),
            embedder,
            chat,
            store,
            max_chars: config.chunking.max_chars,
            overlap_chars: config.chunking.overlap_chars,
        }
    }

    /// Ingest a single file and return the number of chunks added.
    ///
    /// Unsupported extensions, empty extractions, zero chunks, exhausted
    /// embedding retries, and store-write failures all short-circuit to
    /// `Ok(0)`. Only file read errors surface as `Err`.
    pub async fn ingest(&self, path: &Path) -> Result<usize, PipelineError> {
        let text = match extract_path(path)? {
            Extracted::Unsupported => {
                info!(path = %path.display(), "skipping unsupported file type");
                return Ok(0);
            }
            Extracted::Text(text) => text,
        };

        if text.trim().is_empty() {
            info!(path = %path.display(), "no text content found");
            return Ok(0);
        }

        let chunks = self.chunker.split(&text, self.max_chars, self.overlap_chars);
        if chunks.is_empty() {
            info!(path = %path.display(), "no chunks generated");
            return Ok(0);
        }

        info!(path = %path.display(), chunks = chunks.len(), "generating embeddings");
        let Some(vectors) = self.embed_with_retry(&chunks).await else {
            return Ok(0);
        };

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or(stem);
        let file_path = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf())
            .display()
            .to_string();

        let mut ids = Vec::with_capacity(chunks.len());
        let mut metadatas = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            ids.push(format!("{}_{:03}_{}", stem, i, content_fingerprint(chunk)));
            metadatas.push(ChunkMetadata {
                source: file_name.to_string(),
                chunk: i + 1,
                total_chunks: chunks.len(),
                file_path: file_path.clone(),
            });
        }

        if let Err(e) = self.store.add(&ids, &chunks, &metadatas, &vectors).await {
            warn!(path = %path.display(), error = %e, "failed to write chunk batch");
            return Ok(0);
        }

        Ok(chunks.len())
    }

    /// Answer a question from the indexed corpus.
    ///
    /// With no retrievable context the fixed no-results answer is returned
    /// and the chat service is never contacted. Citations mirror the ranked
    /// contexts one-to-one, regardless of which markers the model chose to
    /// use in its answer.
    pub async fn retrieve_and_answer(
        &self,
        question: &str,
        k: usize,
    ) -> Result<Answer, PipelineError> {
        let contexts = self.retrieve(question, k).await;

        if contexts.is_empty() {
            return Ok(Answer {
                answer: NO_RESULTS_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let user_prompt = prompt::build_user_prompt(question, &contexts);
        let messages = prompt::render_messages(prompt::SYSTEM_PROMPT, &user_prompt);
        let answer = self.chat.chat(&messages).await?;

        let sources = contexts
            .iter()
            .map(|context| SourceCitation {
                source: context.metadata.source.clone(),
                chunk: context.metadata.chunk,
                text: preview(&context.text),
            })
            .collect();

        Ok(Answer { answer, sources })
    }

    async fn retrieve(&self, question: &str, k: usize) -> Vec<RetrievedContext> {
        if question.trim().is_empty() {
            return Vec::new();
        }

        // A failed query embedding is folded into the empty-result path;
        // the log line is what keeps it distinguishable for operators.
        let query_vector = match self.embedder.embed(&[question.to_string()]).await {
            Ok(mut vectors) if !vectors.is_empty() => vectors.remove(0),
            Ok(_) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "query embedding failed, treating as no results");
                return Vec::new();
            }
        };

        self.store.query(&query_vector, k).await
    }

    async fn embed_with_retry(&self, chunks: &[String]) -> Option<Vec<Vec<f32>>> {
        for attempt in 1..=EMBED_ATTEMPTS {
            match self.embedder.embed(chunks).await {
                Ok(vectors) => return Some(vectors),
                Err(e) => {
                    warn!(attempt, error = %e, "embedding attempt failed");
                    if attempt < EMBED_ATTEMPTS {
                        let delay = BACKOFF_BASE * 2u32.pow(attempt - 1);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        warn!("embedding failed after {EMBED_ATTEMPTS} attempts, nothing ingested");
        None
    }
}

/// First 8 hex characters of the SHA-256 of the chunk text.
fn content_fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..8].to_string()
}

/// Citation preview: at most 200 characters, ellipsis-suffixed when cut.
fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let truncated: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
