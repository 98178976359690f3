//! `POST /run_ollama_sse` — passthrough streaming.
//!
//! Forwards a chat body to an Ollama-style endpoint and re-frames its
//! NDJSON chunks as the gateway's SSE shapes: `thinking` deltas (with the
//! open/close segment protocol) and `content` deltas. Chunks arrive as
//! deltas already, so no prefix tracking is needed here.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::sse::{content_frame, error_frame, thinking_close_frame, thinking_frame};
use crate::state::AppState;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OllamaRunRequest {
    #[serde(default)]
    pub base_url: Option<String>,
    /// Forwarded verbatim (`model`, `messages`, `options`, ...); the
    /// gateway only forces `stream: true`.
    #[serde(flatten)]
    pub body: Value,
}

pub async fn run_ollama_sse(
    State(state): State<AppState>,
    Json(req): Json<OllamaRunRequest>,
) -> Response {
    let base_url = req
        .base_url
        .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());

    let chunks = match state.ollama.chat_stream(&base_url, req.body).await {
        Ok(stream) => stream,
        Err(e) => {
            // Upstream refused before any streaming began.
            let frame = error_frame(&e.to_string());
            let stream = futures_util::stream::once(async move {
                Ok::<_, Infallible>(SseEvent::default().data(frame.to_string()))
            });
            return Sse::new(stream).keep_alive(KeepAlive::default()).into_response();
        }
    };

    let frames = async_stream::stream! {
        let mut chunks = chunks;
        let mut thinking_id: Option<String> = None;

        while let Some(item) = chunks.next().await {
            match item {
                Ok(chunk) => {
                    if let Some(thinking) = chunk.thinking {
                        let id = thinking_id
                            .get_or_insert_with(|| Uuid::new_v4().to_string())
                            .clone();
                        yield thinking_frame(&thinking, &id);
                    }
                    if let Some(content) = chunk.content {
                        if let Some(id) = thinking_id.take() {
                            yield thinking_close_frame(&id);
                        }
                        yield content_frame(&content);
                    }
                    if chunk.done {
                        break;
                    }
                }
                Err(e) => {
                    yield error_frame(&e.to_string());
                    break;
                }
            }
        }

        if let Some(id) = thinking_id.take() {
            yield thinking_close_frame(&id);
        }
    };

    let stream =
        frames.map(|frame: Value| Ok::<_, Infallible>(SseEvent::default().data(frame.to_string())));

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}
