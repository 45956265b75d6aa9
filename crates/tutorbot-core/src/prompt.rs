//! Tutoring prompt assembly.
//!
//! Produces the two messages sent to the chat model: a fixed system
//! instruction describing the tutor persona and its four answer rules, and
//! a per-request user instruction carrying the student's style, the
//! question, and the retrieved source passages.

use serde::Serialize;

use crate::models::RetrievalCandidate;

/// Style label used when the student does not pick one.
pub const DEFAULT_STYLE: &str = "Concise";

/// Source section used when nothing was retrieved.
pub const NO_SOURCES: &str = "No documents ingested.";

/// Fixed tutor persona and answer contract.
pub const SYSTEM_PROMPT: &str = "\
You are TutorBot, a clear, patient tutor. Use ONLY the SOURCE CONTENT provided below to answer the student's question whenever possible.
Rules:
1) First give a short explanation in the student's chosen style. Keep it simple and stepwise.
2) Then give 1 short example (or illustration).
3) Then give 2 short quiz questions (one multiple-choice or short-answer).
4) If you cannot find the answer in the SOURCE CONTENT, say \"I don't see that in the provided material.\" Then offer a labeled best-effort answer.
Always be humble about uncertainty. Keep language beginner-friendly.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message in the provider's wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Format retrieved candidates, most relevant first, each tagged with its
/// score to three decimals.
pub fn format_sources(candidates: &[RetrievalCandidate]) -> String {
    if candidates.is_empty() {
        return NO_SOURCES.to_string();
    }

    let mut out = String::from("\n\n--- Retrieved Chunks (most relevant first) ---\n\n");
    for c in candidates {
        out.push_str(&format!("[score {:.3}] {}\n\n", c.score, c.chunk));
    }
    out
}

/// Build the per-request user instruction.
pub fn user_instruction(style: &str, question: &str, candidates: &[RetrievalCandidate]) -> String {
    format!(
        "\nSTUDENT PREFERRED STYLE: {style}\nQUESTION: {question}\n\n\
         Use the SOURCE below to answer. Follow the TutorBot rules in system prompt.\n\
         SOURCE:\n{sources}\n",
        sources = format_sources(candidates),
    )
}

/// Compose the `[system, user]` message pair for one question.
pub fn compose(style: &str, question: &str, candidates: &[RetrievalCandidate]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user_instruction(style, question, candidates)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(chunk: &str, score: f32) -> RetrievalCandidate {
        RetrievalCandidate {
            chunk: chunk.to_string(),
            score,
            doc_id: 0,
        }
    }

    #[test]
    fn test_system_prompt_has_four_rules() {
        for rule in ["1)", "2)", "3)", "4)"] {
            assert!(SYSTEM_PROMPT.contains(rule), "missing rule {}", rule);
        }
        assert!(SYSTEM_PROMPT.contains("I don't see that in the provided material."));
    }

    #[test]
    fn test_no_candidates_says_nothing_ingested() {
        let text = user_instruction("Concise", "What is ATP?", &[]);
        assert!(text.contains("SOURCE:\nNo documents ingested.\n"));
        assert!(!text.contains("Retrieved Chunks"));
    }

    #[test]
    fn test_sources_keep_order_and_three_decimals() {
        let sources = format_sources(&[
            candidate("Plants use chlorophyll.", 0.91234),
            candidate("Light is energy.", 0.5),
            candidate("Unrelated.", -1.0),
        ]);
        let first = sources.find("[score 0.912] Plants use chlorophyll.").unwrap();
        let second = sources.find("[score 0.500] Light is energy.").unwrap();
        let third = sources.find("[score -1.000] Unrelated.").unwrap();
        assert!(first < second && second < third);
        assert!(sources.starts_with("\n\n--- Retrieved Chunks (most relevant first) ---\n\n"));
    }

    #[test]
    fn test_user_instruction_embeds_style_and_question() {
        let text = user_instruction("Socratic", "Why is the sky blue?", &[candidate("x", 0.2)]);
        assert!(text.contains("STUDENT PREFERRED STYLE: Socratic\n"));
        assert!(text.contains("QUESTION: Why is the sky blue?\n"));
        assert!(text.contains("[score 0.200] x"));
    }

    #[test]
    fn test_compose_message_roles() {
        let messages = compose(DEFAULT_STYLE, "q", &[]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, Role::User);

        let json = serde_json::to_value(&messages[1]).unwrap();
        assert_eq!(json["role"], "user");
    }
}
