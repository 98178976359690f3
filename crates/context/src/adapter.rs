//! Lossy projection of session events onto a uniform role-tagged message
//! shape, plus the reverse index that lifts a selected-message set back to
//! the exact originating events.
//!
//! The projection guarantees: every message originates from exactly one
//! event; `event_indices[k]` is the position of that event in the input
//! list. All-whitespace events are dropped. The `System` role is never
//! produced here — system prompts enter the model through the runner, not
//! the event log.

use adk_domain::event::{stringify_value, Event, Part};
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message shape
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System = 0,
    User = 1,
    Assistant = 2,
}

/// One `{type, value}` content entry of a projected message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePart {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl MessagePart {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: "text".into(),
            value: value.into(),
        }
    }
}

/// The internal message projection handed to the priority ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: Vec<MessagePart>,
}

impl Message {
    /// Concatenated part values.
    pub fn text(&self) -> String {
        self.content.iter().map(|p| p.value.as_str()).collect()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Projection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Readable text of a part in the message projection. Unlike the token
/// estimator, binary parts surface as a literal marker here so the ranker
/// sees that an attachment exists.
fn part_value(part: &Part) -> String {
    match part {
        Part::Text(t) | Part::Thought(t) => t.clone(),
        Part::Value(v) => stringify_value(v),
        Part::Inline(_) => "[binary]".into(),
    }
}

fn role_for(event: &Event) -> MessageRole {
    if event.author.is_empty() || event.author_is("user") {
        MessageRole::User
    } else {
        MessageRole::Assistant
    }
}

/// Project events to `(messages, event_indices)`.
///
/// Events whose concatenated text is all-whitespace produce no message.
pub fn events_to_messages(events: &[Event]) -> (Vec<Message>, Vec<usize>) {
    let mut messages = Vec::new();
    let mut event_indices = Vec::new();

    for (idx, event) in events.iter().enumerate() {
        let content: Vec<MessagePart> = event
            .parts()
            .iter()
            .map(|p| MessagePart::text(part_value(p)))
            .collect();

        let combined: String = content.iter().map(|p| p.value.as_str()).collect();
        if combined.trim().is_empty() {
            continue;
        }

        messages.push(Message {
            role: role_for(event),
            content,
        });
        event_indices.push(idx);
    }

    (messages, event_indices)
}
