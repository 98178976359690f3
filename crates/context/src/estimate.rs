//! Character-based token estimation.
//!
//! The 4-chars-per-token approximation is the only token measure used for
//! budget decisions; the model's true tokenizer is consulted only
//! indirectly, through its overflow errors. The estimate over-admits on
//! dense scripts but it is monotone in text length, which is what the
//! budget math relies on.

use adk_domain::event::{stringify_value, Event, Part};

use crate::adapter::Message;

const CHARS_PER_TOKEN: usize = 4;

fn tokens_for_chars(chars: usize) -> u32 {
    chars.div_ceil(CHARS_PER_TOKEN) as u32
}

/// Character contribution of one part. Binary parts are free: they never
/// reach the model as text.
fn part_chars(part: &Part) -> usize {
    match part {
        Part::Text(t) | Part::Thought(t) => t.len(),
        Part::Value(v) => stringify_value(v).len(),
        Part::Inline(_) => 0,
    }
}

/// Estimated tokens for one event: `ceil(total_text_len / 4)`.
pub fn estimate_event_tokens(event: &Event) -> u32 {
    tokens_for_chars(event.parts().iter().map(part_chars).sum())
}

/// Estimated tokens for a whole event list.
pub fn estimate_session_tokens(events: &[Event]) -> u32 {
    events.iter().map(estimate_event_tokens).sum()
}

/// Estimated tokens for a projected message.
pub fn estimate_message_tokens(message: &Message) -> u32 {
    tokens_for_chars(message.content.iter().map(|p| p.value.len()).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adk_domain::event::{Content, InlineData};

    fn event(parts: Vec<Part>) -> Event {
        Event {
            id: "e".into(),
            invocation_id: "inv".into(),
            author: "user".into(),
            timestamp: 0.0,
            content: Some(Content {
                role: "user".into(),
                parts,
            }),
            actions: None,
            error_message: None,
        }
    }

    #[test]
    fn four_chars_per_token_rounds_up() {
        assert_eq!(estimate_event_tokens(&event(vec![Part::Text("abcd".into())])), 1);
        assert_eq!(estimate_event_tokens(&event(vec![Part::Text("abcde".into())])), 2);
        assert_eq!(estimate_event_tokens(&event(vec![])), 0);
    }

    #[test]
    fn value_parts_are_stringified() {
        let e = event(vec![Part::Value(serde_json::json!({"k": "val"}))]);
        // {"k":"val"} is 11 chars -> 3 tokens.
        assert_eq!(estimate_event_tokens(&e), 3);
    }

    #[test]
    fn binary_parts_contribute_zero() {
        let e = event(vec![
            Part::Inline(InlineData {
                mime_type: "image/png".into(),
                data: "A".repeat(4096),
            }),
            Part::Text("hi".into()),
        ]);
        assert_eq!(estimate_event_tokens(&e), 1);
    }

    #[test]
    fn thought_parts_count_like_text() {
        let e = event(vec![Part::Thought("12345678".into())]);
        assert_eq!(estimate_event_tokens(&e), 2);
    }

    #[test]
    fn session_estimate_sums_events() {
        let events = vec![
            event(vec![Part::Text("x".repeat(400))]),
            event(vec![Part::Text("y".repeat(200))]),
        ];
        assert_eq!(estimate_session_tokens(&events), 150);
    }
}
