//! Embedding generation via the remote embedding service.
//!
//! Defines the [`TextEmbedder`] trait that embedding backends implement and
//! the [`OllamaEmbedder`] HTTP client, plus pure helper functions for vector
//! serialization and similarity computation.
//!
//! The embedder is a single-attempt primitive: each text is one request, in
//! input order, and a failed call surfaces immediately as a typed error.
//! Retry and backoff policy belongs to the caller.
//!
//! # Response handling
//!
//! The endpoint answers with the vector under either a singular
//! (`embedding`) or plural (`embeddings`) field depending on version. Both
//! are accepted; an envelope with neither non-empty field fails with
//! [`PipelineError::EmbeddingResponseInvalid`], naming a prefix of the
//! offending text.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::PipelineError;

/// Trait for embedding backends.
///
/// Implementations must return one vector per input text, in input order.
/// Empty input returns an empty output without touching the network.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;
}

/// Embedding client for an Ollama-compatible `/api/embeddings` endpoint.
///
/// Each text is posted as `{model, prompt}` in its own request; the service
/// offers no batching. The request timeout covers the full call.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl TextEmbedder for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embeddings", self.base_url);
        let mut vectors = Vec::with_capacity(texts.len());

        for text in texts {
            let body = serde_json::json!({
                "model": self.model,
                "prompt": text,
            });

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|source| PipelineError::EmbeddingServiceUnavailable { source })?;

            let envelope: serde_json::Value = response
                .json()
                .await
                .map_err(|source| PipelineError::EmbeddingServiceUnavailable { source })?;

            let vector = parse_embedding(&envelope).ok_or_else(|| {
                PipelineError::EmbeddingResponseInvalid {
                    prefix: text_prefix(text, 50),
                }
            })?;

            vectors.push(vector);
        }

        Ok(vectors)
    }
}

/// Extract the vector from a response envelope, accepting both field names.
fn parse_embedding(envelope: &serde_json::Value) -> Option<Vec<f32>> {
    if let Some(vector) = number_array(envelope.get("embedding")) {
        return Some(vector);
    }

    match envelope.get("embeddings") {
        Some(serde_json::Value::Array(rows)) if !rows.is_empty() => {
            if rows[0].is_array() {
                // Multi-vector form; one prompt per request, so take row 0.
                number_array(rows.first())
            } else {
                number_array(envelope.get("embeddings"))
            }
        }
        _ => None,
    }
}

fn number_array(value: Option<&serde_json::Value>) -> Option<Vec<f32>> {
    let values = value?.as_array()?;
    if values.is_empty() {
        return None;
    }

    let mut out = Vec::with_capacity(values.len());
    for v in values {
        out.push(v.as_f64()? as f32);
    }
    Some(out)
}

/// First `n` characters of `s`, for naming a text in error messages.
fn text_prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Encode a float vector as a BLOB (little-endian f32 bytes).
///
/// Each `f32` is stored as 4 bytes in little-endian order, producing a BLOB
/// of `vec.len() × 4` bytes for SQLite storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vec.len() * 4);
    for &v in vec {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Decode a BLOB back into a float vector, reversing [`vec_to_blob`].
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` for empty vectors or vectors
/// of different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_singular_field() {
        let envelope = serde_json::json!({ "embedding": [0.1, 0.2, 0.3] });
        let vector = parse_embedding(&envelope).unwrap();
        assert_eq!(vector.len(), 3);
    }

    #[test]
    fn parses_plural_nested_field() {
        let envelope = serde_json::json!({ "embeddings": [[0.5, 0.25]] });
        let vector = parse_embedding(&envelope).unwrap();
        assert_eq!(vector, vec![0.5, 0.25]);
    }

    #[test]
    fn parses_plural_flat_field() {
        let envelope = serde_json::json!({ "embeddings": [0.5, 0.25, 0.125] });
        let vector = parse_embedding(&envelope).unwrap();
        assert_eq!(vector.len(), 3);
    }

    #[test]
    fn rejects_empty_and_missing_fields() {
        assert!(parse_embedding(&serde_json::json!({})).is_none());
        assert!(parse_embedding(&serde_json::json!({ "embedding": [] })).is_none());
        assert!(parse_embedding(&serde_json::json!({ "embeddings": [] })).is_none());
        assert!(parse_embedding(&serde_json::json!({ "error": "model not found" })).is_none());
    }

    #[test]
    fn prefix_is_char_safe() {
        assert_eq!(text_prefix("héllo wörld", 5), "héllo");
        assert_eq!(text_prefix("ab", 50), "ab");
    }

    #[test]
    fn vec_blob_roundtrip() {
        let vec = vec![1.0f32, -2.5, 3.125, 0.0, -0.001];
        let blob = vec_to_blob(&vec);
        assert_eq!(blob.len(), 20);
        assert_eq!(blob_to_vec(&blob), vec);
    }

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }
}
