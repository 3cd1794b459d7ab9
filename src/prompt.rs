//! Grounded prompt construction.
//!
//! Pure, deterministic rendering of a question plus retrieved contexts into
//! the two-message sequence sent to the chat service. Identical inputs
//! always produce identical output, which keeps this layer trivially
//! testable and cacheable.

use crate::models::{ChatMessage, RetrievedContext};

/// Standing instruction: answer only from the supplied context, cite the
/// numbered markers, decline when the context is insufficient, never
/// fabricate.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that answers questions based only on the provided context.\n\
Always cite your sources using the numbered references provided in the context.\n\
If you cannot answer the question based on the given context, say so clearly.\n\
Do not make up information that is not present in the context.";

/// Render the question and the retrieved contexts, in input order, with
/// 1-based citation markers and a blank line between entries.
pub fn build_user_prompt(question: &str, contexts: &[RetrievedContext]) -> String {
    let mut parts = vec![format!("Question: {}", question), String::new(), "Context:".to_string()];

    for (i, context) in contexts.iter().enumerate() {
        parts.push(format!(
            "[{}] From: {} (chunk {})",
            i + 1,
            context.metadata.source,
            context.metadata.chunk
        ));
        parts.push(format!("    {}", context.text));
        parts.push(String::new());
    }

    parts.join("\n")
}

/// Combine the system instruction and the rendered prompt into the ordered
/// message sequence the chat endpoint expects.
pub fn render_messages(system: &str, user: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new("system", system),
        ChatMessage::new("user", user),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChunkMetadata;

    fn context(source: &str, chunk: usize, text: &str) -> RetrievedContext {
        RetrievedContext {
            text: text.to_string(),
            metadata: ChunkMetadata {
                source: source.to_string(),
                chunk,
                total_chunks: 3,
                file_path: format!("/docs/{}", source),
            },
        }
    }

    #[test]
    fn renders_numbered_citations_in_order() {
        let contexts = vec![
            context("alpha.md", 2, "First retrieved text."),
            context("beta.txt", 1, "Second retrieved text."),
        ];

        let prompt = build_user_prompt("What is the answer?", &contexts);

        assert!(prompt.starts_with("Question: What is the answer?\n\nContext:\n"));
        assert!(prompt.contains("[1] From: alpha.md (chunk 2)\n    First retrieved text.\n"));
        assert!(prompt.contains("[2] From: beta.txt (chunk 1)\n    Second retrieved text."));
        let first = prompt.find("[1]").unwrap();
        let second = prompt.find("[2]").unwrap();
        assert!(first < second);
    }

    #[test]
    fn entries_are_separated_by_blank_lines() {
        let contexts = vec![context("a.md", 1, "one"), context("b.md", 1, "two")];
        let prompt = build_user_prompt("q", &contexts);
        assert!(prompt.contains("    one\n\n[2]"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let contexts = vec![context("a.md", 1, "body text")];
        let first = build_user_prompt("same question", &contexts);
        let second = build_user_prompt("same question", &contexts);
        assert_eq!(first, second);
    }

    #[test]
    fn messages_carry_system_then_user() {
        let messages = render_messages(SYSTEM_PROMPT, "rendered prompt");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "rendered prompt");
    }

    #[test]
    fn system_prompt_demands_grounding() {
        assert!(SYSTEM_PROMPT.contains("only on the provided context"));
        assert!(SYSTEM_PROMPT.contains("numbered references"));
    }
}
