//! `POST /run_sse` — the core endpoint.
//!
//! Per request: validate, resolve the per-request scope, run the pre-turn
//! hook, append the user message, then stream the runner's events as SSE
//! frames with per-channel delta extraction. A token-limit error from the
//! runner triggers exactly one shrink-and-retry: the scope's retry factor
//! tightens the trimming budget, the delta trackers reset, and a fresh
//! runner producer replays the turn.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use adk_domain::event::{Content, Event};
use adk_domain::scope::DEFAULT_RETRY_TRIM_PERCENT;
use adk_domain::{Error, ModelOverride, RequestScope, SessionKey};
use adk_memory::ContextService;
use adk_sessions::SessionStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use futures_util::stream::Stream;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;

use crate::hooks::{enrich_new_message, message_text, spawn_post_turn};
use crate::runner::AgentRunner;
use crate::sse::{error_frame, DeltaTracker};
use crate::state::AppState;
use crate::token_limit::is_token_limit_error;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request shape
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub new_message: Content,
    #[serde(default)]
    pub streaming: bool,
    #[serde(default)]
    pub model_override: Option<ModelOverride>,
    #[serde(default)]
    pub tool_executor_url: Option<String>,
    #[serde(default)]
    pub context_limit: Option<u32>,
    #[serde(default)]
    pub retry_trim_percent: Option<f64>,
}

impl RunRequest {
    fn scope(&self, default_tool_executor: Option<&str>) -> RequestScope {
        let retry_trim_percent = self
            .retry_trim_percent
            .unwrap_or(DEFAULT_RETRY_TRIM_PERCENT)
            .clamp(1.0, 100.0);

        RequestScope {
            model_override: self.model_override.clone(),
            context_limit: self.context_limit,
            retry_trim_percent,
            retry_factor: None,
            tool_executor_url: self
                .tool_executor_url
                .clone()
                .or_else(|| default_tool_executor.map(String::from)),
            streaming: self.streaming,
        }
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn run_sse(
    State(state): State<AppState>,
    Json(body): Json<RunRequest>,
) -> Response {
    // An unloaded agent fails before the SSE stream opens.
    let runner = match &state.runner {
        Some(r) => r.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "agent is not loaded" })),
            )
                .into_response();
        }
    };

    let key = SessionKey::new(&body.app_name, &body.user_id, &body.session_id);
    let scope = body.scope(state.config.tool_executor_url.as_deref());

    // Session must exist before the stream opens; this read already goes
    // through the compaction/trimming stack.
    let session = match state.store.get_session(&key, &scope).await {
        Ok(s) => s,
        Err(Error::NotFound(k)) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": format!("session not found: {k}") })),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    // Pre-turn hook: stuck detection + sieve enrichment.
    let mut new_message = body.new_message;
    if state.config.strategies.enabled {
        if let Some(service) = &state.context {
            new_message =
                enrich_new_message(service.as_ref(), &state.config.strategies, &session, &new_message)
                    .await;
        }
    }

    // Append the user turn; the runner owns persistence of its own events.
    let user_event = Event {
        id: uuid::Uuid::new_v4().to_string(),
        invocation_id: uuid::Uuid::new_v4().to_string(),
        author: "user".into(),
        timestamp: now_secs(),
        content: Some(new_message.clone()),
        actions: None,
        error_message: None,
    };
    if let Err(e) = state.store.append_event(&key, user_event).await {
        tracing::warn!(session = %key, error = %e, "failed to append user event");
    }

    let context: Option<Arc<dyn ContextService>> = if state.config.strategies.enabled {
        state
            .context
            .clone()
            .map(|c| c as Arc<dyn ContextService>)
    } else {
        None
    };

    let frames = turn_frames(state.store.clone(), runner, context, key, new_message, scope);
    let stream = frames.map(|frame| {
        Ok::<_, Infallible>(SseEvent::default().data(frame.to_string()))
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// The streaming state machine
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Produce the SSE frame sequence for one `/run_sse` turn.
///
/// States: INIT → STREAM → (RETRY → STREAM)? → DONE. The retry is
/// single-shot: a second token-limit error surfaces raw. Dropping the
/// returned stream cancels the in-flight runner producer.
pub fn turn_frames(
    store: Arc<dyn SessionStore>,
    runner: Arc<dyn AgentRunner>,
    context: Option<Arc<dyn ContextService>>,
    key: SessionKey,
    new_message: Content,
    scope: RequestScope,
) -> impl Stream<Item = Value> + Send {
    async_stream::stream! {
        let user_text = message_text(&new_message);
        let mut scope = scope;
        let mut retried = false;

        'attempt: loop {
            // Fresh per-attempt delta state: on a retry the client
            // receives the replayed turn in full.
            let mut deltas = DeltaTracker::new();
            let mut had_error = false;

            let session = match store.get_session(&key, &scope).await {
                Ok(s) => s,
                Err(e) => {
                    yield error_frame(&e.to_string());
                    break;
                }
            };

            let mut events = match runner
                .run(session, new_message.clone(), scope.clone())
                .await
            {
                Ok(stream) => stream,
                Err(e) => {
                    yield error_frame(&e.to_string());
                    break;
                }
            };

            while let Some(item) = events.next().await {
                match item {
                    Ok(event) => {
                        if let Some(message) = event.error_message.clone() {
                            if !retried && is_token_limit_error(&message) {
                                retried = true;
                                scope.arm_retry();
                                tracing::info!(
                                    session = %key,
                                    retry_factor = scope.effective_retry_factor(),
                                    "token limit hit, replaying turn with tightened budget"
                                );
                                continue 'attempt;
                            }
                            had_error = true;
                            yield error_frame(&message);
                            continue;
                        }

                        for frame in deltas.frames_for(&event) {
                            yield frame;
                        }
                    }
                    Err(e) => {
                        had_error = true;
                        yield error_frame(&e.to_string());
                    }
                }
            }

            // DONE: close a dangling reasoning segment, then hand the
            // exchange to the post-turn hook.
            if let Some(close) = deltas.close_thinking() {
                yield close;
            }

            if let Some(service) = context.clone() {
                spawn_post_turn(
                    service,
                    key.session_id.clone(),
                    user_text.clone(),
                    deltas.final_content().to_string(),
                    had_error,
                );
            }
            break;
        }
    }
}
