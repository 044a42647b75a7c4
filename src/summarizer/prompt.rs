//! Summarization prompt
//!
//! Renders a chat and a window of its messages into the system and user
//! turns sent to the provider.

use crate::chat::Chat;
use crate::messages::Message;
use crate::providers::Message as LlmMessage;

const SYSTEM_PROMPT: &str = "You summarize group chat conversations. \
Be concise and factual. Only report what participants actually said.";

const INSTRUCTIONS: &str = "Write a summary with these parts:
- Overview: how the discussion progressed, its main purpose or agenda, and any turning points or disagreements.
- Decisions: a bulleted list of final decisions (e.g. \"Decision: Deadline moved to Friday.\"). Write \"None\" if there were none.
- Action items: a bulleted list, each starting with the person responsible followed by the task (e.g. \"John: Finish the report by EOD.\"). Write \"None\" if there were none.";

/// `sender: content` lines in chronological order
///
/// # Examples
///
/// ```
/// use chatsum::messages::Message;
/// use chatsum::summarizer::prompt::format_transcript;
/// use chrono::Utc;
///
/// let msg = Message {
///     id: "01J0000000000000000000000".into(),
///     chat_id: "c1".into(),
///     sequence: 1,
///     sender_id: "u1".into(),
///     sender_username: "alice".into(),
///     content: "ship it".into(),
///     timestamp: Utc::now(),
/// };
/// assert_eq!(format_transcript(&[msg]), "alice: ship it");
/// ```
pub fn format_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.sender_username, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the provider conversation for one summary request
pub fn build_prompt(chat: &Chat, messages: &[Message]) -> Vec<LlmMessage> {
    let mut body = format!("Chat name: {}\n", chat.name);
    if let Some(description) = chat.description.as_deref().filter(|d| !d.is_empty()) {
        body.push_str(&format!("Chat description: {}\n", description));
    }
    body.push_str("\nTranscript:\n---\n");
    body.push_str(&format_transcript(messages));
    body.push_str("\n---\n\n");
    body.push_str(INSTRUCTIONS);

    vec![LlmMessage::system(SYSTEM_PROMPT), LlmMessage::user(body)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn chat(description: Option<&str>) -> Chat {
        let now = Utc::now();
        Chat {
            id: "c1".to_string(),
            name: "Release sync".to_string(),
            description: description.map(str::to_string),
            creator_id: "u1".to_string(),
            created_at: now,
            start_time: None,
            end_time: now + Duration::hours(1),
            closed_at: None,
            closed_reason: None,
        }
    }

    fn message(seq: u64, sender: &str, content: &str) -> Message {
        Message {
            id: format!("m{}", seq),
            chat_id: "c1".to_string(),
            sequence: seq,
            sender_id: format!("id-{}", sender),
            sender_username: sender.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_prompt_contains_transcript_in_order() {
        let messages = vec![
            message(1, "alice", "Can we ship Friday?"),
            message(2, "bob", "Yes, I'll tag the release."),
        ];
        let prompt = build_prompt(&chat(None), &messages);

        assert_eq!(prompt.len(), 2);
        assert_eq!(prompt[0].role, "system");
        let body = prompt[1].content.clone().unwrap();
        assert!(body.contains("Chat name: Release sync"));
        assert!(!body.contains("Chat description"));
        let alice = body.find("alice: Can we ship Friday?").unwrap();
        let bob = body.find("bob: Yes, I'll tag the release.").unwrap();
        assert!(alice < bob);
        assert!(body.contains("Decisions"));
        assert!(body.contains("Action items"));
    }

    #[test]
    fn test_prompt_includes_description_when_present() {
        let prompt = build_prompt(&chat(Some("Weekly release train")), &[message(1, "a", "hi")]);
        let body = prompt[1].content.clone().unwrap();
        assert!(body.contains("Chat description: Weekly release train"));
    }
}
