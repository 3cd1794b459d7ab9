//! Sentence-aware text chunker with overlap.
//!
//! Splits document text into bounded-length chunks for embedding. The
//! preferred path segments the input into sentences (UAX #29 boundaries)
//! and greedily accumulates them until the character budget is reached;
//! each new chunk is seeded with the trailing `overlap` characters of the
//! previous one so retrieval does not lose context at chunk edges.
//!
//! When sentence segmentation is unavailable the chunker slides a fixed
//! `max_chars` window across the text instead, advancing by
//! `max_chars - overlap` characters per step. Availability is probed once
//! at construction and held as a flag, not re-checked per call.
//!
//! # Algorithm (sentence path)
//!
//! 1. Segment the input into sentences.
//! 2. Accumulate sentences into a buffer (space-joined) while the buffer
//!    plus the next sentence stays within `max_chars`.
//! 3. On overflow, flush the trimmed buffer as a chunk and start the next
//!    buffer from the previous chunk's last `overlap` characters plus the
//!    overflowing sentence.
//! 4. Flush whatever remains as the final chunk.
//!
//! A single sentence longer than `max_chars` is emitted whole; the budget
//! is a target under the sentence path, not a hard cap.

use tracing::warn;
use unicode_segmentation::UnicodeSegmentation;

/// Text splitter with a fixed segmentation strategy, decided at creation.
#[derive(Debug, Clone)]
pub struct Chunker {
    sentence_mode: bool,
}

impl Chunker {
    /// Create a chunker, probing once whether sentence segmentation works.
    ///
    /// If the probe fails the chunker silently degrades to fixed-window
    /// splitting and emits a diagnostic; it never errors.
    pub fn new() -> Self {
        let sentence_mode = probe_sentence_segmentation();
        if !sentence_mode {
            warn!("sentence segmentation unavailable, falling back to fixed-window chunking");
        }
        Self { sentence_mode }
    }

    /// Create a chunker that always uses the fixed-window algorithm.
    pub fn fixed_window() -> Self {
        Self {
            sentence_mode: false,
        }
    }

    /// Split `text` into chunks of at most `max_chars` characters with
    /// `overlap` characters of overlap between consecutive chunks.
    ///
    /// Empty or whitespace-only input yields an empty vector. Lengths are
    /// measured in characters, and all slicing is char-boundary safe.
    pub fn split(&self, text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        if self.sentence_mode {
            split_sentence_aware(text, max_chars, overlap)
        } else {
            split_fixed_window(text, max_chars, overlap)
        }
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}

/// Check that the sentence segmenter produces sane output on a known sample.
fn probe_sentence_segmentation() -> bool {
    let sample = "The first sentence ends here. The second one follows it.";
    sample.unicode_sentences().count() >= 2
}

fn split_sentence_aware(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in text.unicode_sentences() {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }

        let current_len = current.chars().count();
        let sentence_len = sentence.chars().count();

        if current_len + sentence_len > max_chars && !current.is_empty() {
            let closed = current.trim().to_string();

            // Seed the next buffer with the tail of the chunk just closed.
            current = if overlap > 0 {
                format!("{} {}", tail_chars(&closed, overlap), sentence)
            } else {
                sentence.to_string()
            };

            chunks.push(closed);
        } else if current.is_empty() {
            current.push_str(sentence);
        } else {
            current.push(' ');
            current.push_str(sentence);
        }
    }

    let remainder = current.trim();
    if !remainder.is_empty() {
        chunks.push(remainder.to_string());
    }

    chunks
}

fn split_fixed_window(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    // Char-boundary byte offsets, so windows can be sliced directly.
    let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let total = offsets.len();

    // A degenerate overlap still makes progress, one character at a time.
    let step = max_chars.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < total {
        let end = (start + max_chars).min(total);
        let byte_start = offsets[start];
        let byte_end = if end == total { text.len() } else { offsets[end] };

        let window = text[byte_start..byte_end].trim();
        if !window.is_empty() {
            chunks.push(window.to_string());
        }

        if end == total {
            break;
        }
        start += step;
    }

    chunks
}

/// Return the last `n` characters of `s` (all of `s` if it is shorter).
fn tail_chars(s: &str, n: usize) -> &str {
    let total = s.chars().count();
    if n >= total {
        return s;
    }
    let start = s
        .char_indices()
        .nth(total - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    &s[start..]
}
