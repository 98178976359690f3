//! The session event data model.
//!
//! Events are the append-only records of a conversation. The wire shape is
//! schema-loose (`{text?, value?, thought?, inlineData?}` parts); internally
//! every part is one of four tagged variants so that readers — the token
//! estimator, the message adapter, the delta extractor — are exhaustive
//! matches instead of chains of `if let`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Part
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Inline binary payload (base64 on the wire). Opaque to the context
/// pipeline; carried through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One part of an event's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PartWire", into = "PartWire")]
pub enum Part {
    /// Plain text visible to the model.
    Text(String),
    /// Arbitrary structured value; stringified on read.
    Value(Value),
    /// Binary attachment marker.
    Inline(InlineData),
    /// Reasoning text (`thought: true` on the wire).
    Thought(String),
}

/// The schema-loose wire shape of a part.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl From<PartWire> for Part {
    fn from(w: PartWire) -> Self {
        if let Some(data) = w.inline_data {
            return Part::Inline(data);
        }
        if w.thought == Some(true) {
            return Part::Thought(w.text.unwrap_or_default());
        }
        if let Some(text) = w.text {
            return Part::Text(text);
        }
        if let Some(value) = w.value {
            return Part::Value(value);
        }
        Part::Text(String::new())
    }
}

impl From<Part> for PartWire {
    fn from(p: Part) -> Self {
        match p {
            Part::Text(text) => PartWire {
                text: Some(text),
                ..Default::default()
            },
            Part::Value(value) => PartWire {
                value: Some(value),
                ..Default::default()
            },
            Part::Inline(data) => PartWire {
                inline_data: Some(data),
                ..Default::default()
            },
            Part::Thought(text) => PartWire {
                text: Some(text),
                thought: Some(true),
                ..Default::default()
            },
        }
    }
}

/// Stringify a structured part value the way it is shown to the model.
/// Bare JSON strings lose their quotes; everything else is compact JSON.
pub fn stringify_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Content / Event
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Role-tagged part list. `role` is `"user"` or `"model"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// A single append-only record in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub invocation_id: String,
    pub author: String,
    /// Seconds since epoch.
    pub timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Opaque runner metadata, preserved verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Value>,
    /// Error channel from the runner; set instead of content on failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Event {
    /// The canonical content stringification: every non-thought part,
    /// concatenated. Binary parts contribute nothing here.
    pub fn content_text(&self) -> String {
        let mut out = String::new();
        for part in self.parts() {
            match part {
                Part::Text(t) => out.push_str(t),
                Part::Value(v) => out.push_str(&stringify_value(v)),
                Part::Inline(_) | Part::Thought(_) => {}
            }
        }
        out
    }

    /// Concatenated reasoning text (`thought: true` parts).
    pub fn thought_text(&self) -> String {
        let mut out = String::new();
        for part in self.parts() {
            match part {
                Part::Thought(t) => out.push_str(t),
                Part::Text(_) | Part::Value(_) | Part::Inline(_) => {}
            }
        }
        out
    }

    pub fn parts(&self) -> &[Part] {
        self.content.as_ref().map(|c| c.parts.as_slice()).unwrap_or(&[])
    }

    /// Case-insensitive author comparison.
    pub fn author_is(&self, author: &str) -> bool {
        self.author.eq_ignore_ascii_case(author)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The identity triple of a session. Immutable for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.app_name, self.user_id, self.session_id)
    }
}

/// The event list and metadata for one `(app, user, session)` triple.
///
/// Events are kept in non-decreasing timestamp order; replacing the event
/// list never reorders the surviving events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub app_name: String,
    pub user_id: String,
    pub id: String,
    #[serde(default)]
    pub state: serde_json::Map<String, Value>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Session {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.app_name, &self.user_id, &self.id)
    }

    /// Shallow copy with a replacement event list. The identity triple and
    /// state map are preserved; used by the read-path decorators.
    pub fn with_events(&self, events: Vec<Event>) -> Session {
        Session {
            app_name: self.app_name.clone(),
            user_id: self.user_id.clone(),
            id: self.id.clone(),
            state: self.state.clone(),
            events,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
