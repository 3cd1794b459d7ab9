//! Chat completion via the remote language-model service.
//!
//! The chat endpoint is configured for incremental delivery: it streams
//! newline-delimited JSON fragments of the shape
//! `{"message":{"content":"..."},"done":false}` rather than returning one
//! blocking response. [`OllamaChat`] consumes that stream and concatenates
//! fragment content in arrival order until the `done` sentinel or the end
//! of the stream.
//!
//! Fragment handling is best-effort: lines that fail to parse are skipped,
//! and a stream that produces no content yields an empty string, not an
//! error. Only transport failures (connect, timeout, non-2xx) surface, as
//! [`PipelineError::ChatServiceUnavailable`].

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use std::time::Duration;

use crate::error::PipelineError;
use crate::models::ChatMessage;

/// Trait for chat-completion backends.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send an ordered message sequence and return the assembled response.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, PipelineError>;
}

/// Chat client for an Ollama-compatible `/api/chat` endpoint.
pub struct OllamaChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaChat {
    /// `timeout_secs` bounds the start of the call (connection setup); the
    /// stream itself is read to completion without a deadline.
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ChatClient for OllamaChat {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, PipelineError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| PipelineError::ChatServiceUnavailable { source })?;

        let mut stream = response.bytes_stream();
        let mut assembly = FragmentAssembly::new();
        let mut buffer = String::new();

        'outer: while let Some(item) = stream.next().await {
            let bytes =
                item.map_err(|source| PipelineError::ChatServiceUnavailable { source })?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].to_string();
                buffer.drain(..=newline);
                if assembly.push_line(&line) {
                    break 'outer;
                }
            }
        }

        // Whatever trails the last newline is still a candidate fragment.
        if !buffer.trim().is_empty() {
            assembly.push_line(&buffer);
        }

        Ok(assembly.into_content())
    }
}

/// One parsed stream fragment.
#[derive(Debug, Deserialize)]
struct ChatFragment {
    #[serde(default)]
    message: Option<FragmentMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Deserialize)]
struct FragmentMessage {
    #[serde(default)]
    content: String,
}

/// Accumulates fragment content from a line-delimited stream.
///
/// Kept separate from the HTTP layer so tests can feed it a finite line
/// sequence directly.
#[derive(Debug, Default)]
pub struct FragmentAssembly {
    content: String,
    done: bool,
}

impl FragmentAssembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one line of the stream. Malformed lines are skipped.
    /// Returns `true` once the terminal sentinel has been observed.
    pub fn push_line(&mut self, line: &str) -> bool {
        if self.done {
            return true;
        }

        let line = line.trim();
        if line.is_empty() {
            return false;
        }

        match serde_json::from_str::<ChatFragment>(line) {
            Ok(fragment) => {
                if let Some(message) = fragment.message {
                    self.content.push_str(&message.content);
                }
                if fragment.done {
                    self.done = true;
                }
            }
            Err(_) => {
                // Best effort: a garbled fragment is dropped, not fatal.
            }
        }

        self.done
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble(lines: &[&str]) -> String {
        let mut assembly = FragmentAssembly::new();
        for line in lines {
            if assembly.push_line(line) {
                break;
            }
        }
        assembly.into_content()
    }

    #[test]
    fn concatenates_fragments_in_order() {
        let answer = assemble(&[
            r#"{"message":{"content":"Hel"},"done":false}"#,
            r#"{"message":{"content":"lo"},"done":false}"#,
            r#"{"message":{"content":" world"},"done":true}"#,
        ]);
        assert_eq!(answer, "Hello world");
    }

    #[test]
    fn stops_at_done_sentinel() {
        let answer = assemble(&[
            r#"{"message":{"content":"kept"},"done":true}"#,
            r#"{"message":{"content":" dropped"},"done":false}"#,
        ]);
        assert_eq!(answer, "kept");
    }

    #[test]
    fn skips_malformed_fragments() {
        let answer = assemble(&[
            r#"{"message":{"content":"good "},"done":false}"#,
            "not json at all",
            r#"{"broken":"#,
            r#"{"message":{"content":"fragments"},"done":true}"#,
        ]);
        assert_eq!(answer, "good fragments");
    }

    #[test]
    fn tolerates_missing_message_field() {
        let answer = assemble(&[
            r#"{"done":false}"#,
            r#"{"message":{"content":"text"},"done":false}"#,
            r#"{"done":true}"#,
        ]);
        assert_eq!(answer, "text");
    }

    #[test]
    fn empty_stream_is_an_empty_answer() {
        assert_eq!(assemble(&[]), "");
        assert_eq!(assemble(&["", "   "]), "");
    }
}
