//! OpenAI-compatible summarizer adapter.
//!
//! One non-streaming chat completion per window. Works with OpenAI, vLLM,
//! LM Studio, Ollama's OpenAI facade, and anything else speaking the chat
//! completions contract.

use adk_domain::config::SummarizerConfig;
use adk_domain::event::{Content, Event, Part};
use adk_domain::RequestScope;
use async_trait::async_trait;
use serde_json::Value;

use crate::traits::{Summarizer, SummaryResult};

const SUMMARY_PROMPT_TEMPLATE: &str = "\
The following is a conversation history between a user and an assistant. \
Summarize it into a concise paragraph that preserves the goals being worked \
on, decisions made, open questions, and any facts that later turns may rely \
on. Write in present tense; omit greetings and pleasantries.\n\n\
{conversation_history}";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Summarizer backed by an OpenAI-style `/chat/completions` endpoint.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiSummarizer {
    /// Build from config. Returns `None` when the transport is not
    /// configured (compaction is then disabled at wiring time).
    pub fn from_config(cfg: &SummarizerConfig) -> Option<Self> {
        let base_url = cfg.base_url.clone()?;
        let model = cfg.model.clone()?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(cfg.timeout_ms))
            .build()
            .ok()?;

        Some(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key: cfg.api_key.clone(),
        })
    }

    /// Endpoint and model for one call, honoring the per-request override.
    fn resolve_target(&self, scope: &RequestScope) -> (String, String) {
        match &scope.model_override {
            Some(ov) => {
                let base = ov
                    .base_url
                    .as_deref()
                    .unwrap_or(&self.base_url)
                    .trim_end_matches('/')
                    .to_string();
                (base, ov.model.clone())
            }
            None => (self.base_url.clone(), self.model.clone()),
        }
    }
}

/// Render the window as `<author>: <text>` lines; empty-text events are
/// skipped.
pub(crate) fn conversation_history(events: &[Event]) -> String {
    let mut lines = Vec::new();
    for event in events {
        let text = event.content_text();
        if text.trim().is_empty() {
            continue;
        }
        lines.push(format!("{}: {}", event.author, text));
    }
    lines.join("\n")
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, events: &[Event], scope: &RequestScope) -> Option<SummaryResult> {
        let (first, last) = match (events.first(), events.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return None,
        };

        let history = conversation_history(events);
        if history.is_empty() {
            return None;
        }
        let prompt = SUMMARY_PROMPT_TEMPLATE.replace("{conversation_history}", &history);

        let (base_url, model) = self.resolve_target(scope);
        let url = format!("{base_url}/chat/completions");
        let body = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, url = %url, "summarizer request failed");
                return None;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                body = %text,
                "summarizer returned non-2xx"
            );
            return None;
        }

        let json: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "summarizer response was not JSON");
                return None;
            }
        };

        let summary = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|a| a.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .trim()
            .to_string();

        if summary.is_empty() {
            tracing::warn!("summarizer produced empty content");
            return None;
        }

        Some(SummaryResult {
            content: Content {
                role: "user".into(),
                parts: vec![Part::Text(summary)],
            },
            start_timestamp: first.timestamp,
            end_timestamp: last.timestamp,
        })
    }
}
