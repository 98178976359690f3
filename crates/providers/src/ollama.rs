//! Ollama passthrough streaming.
//!
//! `/run_ollama_sse` forwards a chat body to an Ollama-style `/api/chat`
//! endpoint and re-frames its NDJSON stream. Each chunk splits into a
//! `thinking` delta and/or a `content` delta; `done` marks the end.

use adk_domain::error::{Error, Result};
use adk_domain::stream::BoxStream;
use serde_json::Value;

use crate::lines::drain_complete_lines;

/// One parsed chunk of an Ollama chat stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OllamaChunk {
    pub thinking: Option<String>,
    pub content: Option<String>,
    pub done: bool,
}

/// Parse one NDJSON line into a chunk. Lines without a recognizable
/// message shape yield `None` and are skipped.
pub(crate) fn parse_chunk(line: &str) -> Option<Result<OllamaChunk>> {
    let v: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return Some(Err(Error::Json(e))),
    };

    if let Some(err) = v.get("error").and_then(|e| e.as_str()) {
        return Some(Err(Error::Provider {
            provider: "ollama".into(),
            message: err.to_string(),
        }));
    }

    let message = v.get("message");
    let thinking = message
        .and_then(|m| m.get("thinking"))
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(String::from);
    let content = message
        .and_then(|m| m.get("content"))
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
        .map(String::from);
    let done = v.get("done").and_then(|d| d.as_bool()).unwrap_or(false);

    if thinking.is_none() && content.is_none() && !done {
        return None;
    }

    Some(Ok(OllamaChunk {
        thinking,
        content,
        done,
    }))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Thin streaming client for Ollama-style chat endpoints.
pub struct OllamaClient {
    client: reqwest::Client,
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OllamaClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// POST `body` to `{base_url}/api/chat` with `stream: true` forced on,
    /// and return the parsed chunk stream.
    pub async fn chat_stream(
        &self,
        base_url: &str,
        mut body: Value,
    ) -> Result<BoxStream<'static, Result<OllamaChunk>>> {
        body["stream"] = Value::Bool(true);
        let url = format!("{}/api/chat", base_url.trim_end_matches('/'));

        tracing::debug!(url = %url, "ollama passthrough request");

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Provider {
                provider: "ollama".into(),
                message: format!("HTTP {} - {}", status.as_u16(), text),
            });
        }

        let stream = async_stream::stream! {
            let mut resp = resp;
            let mut buffer = String::new();

            loop {
                match resp.chunk().await {
                    Ok(Some(bytes)) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                        for line in drain_complete_lines(&mut buffer) {
                            if let Some(chunk) = parse_chunk(&line) {
                                let finished = matches!(&chunk, Ok(c) if c.done);
                                yield chunk;
                                if finished {
                                    return;
                                }
                            }
                        }
                    }
                    Ok(None) => {
                        // Body closed — flush a trailing unterminated line.
                        let rest = buffer.trim().to_string();
                        if !rest.is_empty() {
                            if let Some(chunk) = parse_chunk(&rest) {
                                yield chunk;
                            }
                        }
                        return;
                    }
                    Err(e) => {
                        yield Err(Error::Http(e.to_string()));
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
