//! SSE frame construction and per-channel delta extraction.
//!
//! Runners re-emit the full accumulated text of a turn on every event;
//! clients want only the unseen suffix. The prefix-delta rule: if the new
//! text extends the old, send the suffix; otherwise the runner restarted
//! the turn — send the new text in full. Thinking and content channels
//! track their prefixes independently.
//!
//! Reasoning segments are framed by a `thinking` event carrying text and
//! closed by a zero-length `thinking` event with
//! `metadata.vscodeReasoningDone = true`.

use adk_domain::Event;
use serde_json::{json, Value};
use uuid::Uuid;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Frame shapes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn content_frame(delta: &str) -> Value {
    json!({ "content": { "parts": [{ "text": delta }] } })
}

pub fn thinking_frame(delta: &str, id: &str) -> Value {
    json!({ "thinking": { "text": delta, "id": id } })
}

pub fn thinking_close_frame(id: &str) -> Value {
    json!({
        "thinking": {
            "text": "",
            "id": id,
            "metadata": { "vscodeReasoningDone": true }
        }
    })
}

pub fn error_frame(message: &str) -> Value {
    json!({ "error": message })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Prefix deltas
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Default)]
struct PrefixDelta {
    last: String,
}

impl PrefixDelta {
    /// Advance to `new_text` and return the part not yet emitted.
    fn advance(&mut self, new_text: &str) -> Option<String> {
        let delta = match new_text.strip_prefix(self.last.as_str()) {
            Some(suffix) => suffix.to_string(),
            // Not an extension: the runner restarted its streaming turn.
            None => new_text.to_string(),
        };
        self.last = new_text.to_string();
        (!delta.is_empty()).then_some(delta)
    }
}

/// Per-request delta state for one streaming attempt. The retry pass
/// starts a fresh tracker — deltas are reset, the client receives the
/// replayed turn in full.
#[derive(Default)]
pub struct DeltaTracker {
    thought: PrefixDelta,
    content: PrefixDelta,
    /// `Some` while a reasoning segment is open.
    thinking_id: Option<String>,
}

impl DeltaTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// SSE frames for one runner event, in emission order: thinking
    /// delta, thinking close (when content begins), content delta.
    pub fn frames_for(&mut self, event: &Event) -> Vec<Value> {
        let mut frames = Vec::new();

        let thought_text = event.thought_text();
        if !thought_text.is_empty() {
            if let Some(delta) = self.thought.advance(&thought_text) {
                let id = self
                    .thinking_id
                    .get_or_insert_with(|| Uuid::new_v4().to_string())
                    .clone();
                frames.push(thinking_frame(&delta, &id));
            }
        }

        let content_text = event.content_text();
        if !content_text.is_empty() {
            if let Some(delta) = self.content.advance(&content_text) {
                if let Some(close) = self.close_thinking() {
                    frames.push(close);
                }
                frames.push(content_frame(&delta));
            }
        }

        frames
    }

    /// Close an open reasoning segment, if any. Also called at stream end
    /// for turns that never produced content.
    pub fn close_thinking(&mut self) -> Option<Value> {
        self.thinking_id.take().map(|id| thinking_close_frame(&id))
    }

    /// The full content text accumulated so far (for the post-turn hook).
    pub fn final_content(&self) -> &str {
        &self.content.last
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
