//! `POST /context-tools` — direct dispatch to the external context
//! service, for clients (the VS Code extension, debugging CLIs) that want
//! the memory operations without running a turn.
//!
//! Answers 501 on deployments without a configured memory service.

use adk_context::{Message, MessageRanker};
use adk_memory::{ContextService, IngestRequest, StuckDetection, TaskOutcome};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::Value;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ContextToolRequest {
    pub tool: String,
    #[serde(default)]
    pub args: Value,
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn bad_args(tool: &str, err: impl std::fmt::Display) -> Response {
    api_error(
        StatusCode::BAD_REQUEST,
        format!("invalid args for {tool}: {err}"),
    )
}

fn arg<T: serde::de::DeserializeOwned>(args: &Value, field: &str) -> Result<T, String> {
    let value = args
        .get(field)
        .ok_or_else(|| format!("missing field `{field}`"))?;
    serde_json::from_value(value.clone()).map_err(|e| format!("field `{field}`: {e}"))
}

pub async fn context_tools(
    State(state): State<AppState>,
    Json(req): Json<ContextToolRequest>,
) -> Response {
    let service = match &state.context {
        Some(s) => s.clone(),
        None => {
            return api_error(
                StatusCode::NOT_IMPLEMENTED,
                "no context service configured on this deployment",
            );
        }
    };

    let result: Result<Value, Response> = match req.tool.as_str() {
        "sieve" => {
            let query: String = match arg(&req.args, "query") {
                Ok(v) => v,
                Err(e) => return bad_args(&req.tool, e),
            };
            let budget: u32 = arg(&req.args, "tokenBudget").unwrap_or(1000);
            service
                .sieve(&query, budget)
                .await
                .map(|r| serde_json::json!(r))
                .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
        "ingest" => match serde_json::from_value::<IngestRequest>(req.args.clone()) {
            Ok(ingest) => service
                .ingest(ingest)
                .await
                .map(|n| serde_json::json!(n))
                .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string())),
            Err(e) => return bad_args(&req.tool, e),
        },
        "record_task_outcome" => {
            let outcome: TaskOutcome = match arg(&req.args, "outcome") {
                Ok(v) => v,
                Err(e) => return bad_args(&req.tool, e),
            };
            service
                .record_task_outcome(outcome)
                .await
                .map(|()| serde_json::json!({ "ok": true }))
                .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
        "detect_stuck" => {
            let messages: Vec<Message> = match arg(&req.args, "messages") {
                Ok(v) => v,
                Err(e) => return bad_args(&req.tool, e),
            };
            service
                .detect_stuck(&messages)
                .await
                .map(|d| serde_json::json!(d))
                .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
        "generate_recovery_message" => {
            let detection: StuckDetection = match arg(&req.args, "detection") {
                Ok(v) => v,
                Err(e) => return bad_args(&req.tool, e),
            };
            service
                .generate_recovery_message(&detection)
                .await
                .map(|m| serde_json::json!(m))
                .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
        "sort_by_priority" => {
            let messages: Vec<Message> = match arg(&req.args, "messages") {
                Ok(v) => v,
                Err(e) => return bad_args(&req.tool, e),
            };
            service
                .sort_by_priority(&messages)
                .await
                .map(|r| serde_json::json!({ "ranked": r }))
                .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
        "select_by_token_budget" => {
            let messages: Vec<Message> = match arg(&req.args, "messages") {
                Ok(v) => v,
                Err(e) => return bad_args(&req.tool, e),
            };
            let budget: u32 = match arg(&req.args, "tokenBudget") {
                Ok(v) => v,
                Err(e) => return bad_args(&req.tool, e),
            };
            service
                .select_by_token_budget(&messages, budget)
                .await
                .map(|s| serde_json::json!({ "selected": s }))
                .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
        "select_top_messages" => {
            let messages: Vec<Message> = match arg(&req.args, "messages") {
                Ok(v) => v,
                Err(e) => return bad_args(&req.tool, e),
            };
            let n: usize = match arg(&req.args, "n") {
                Ok(v) => v,
                Err(e) => return bad_args(&req.tool, e),
            };
            service
                .select_top_messages(&messages, n)
                .await
                .map(|s| serde_json::json!({ "selected": s }))
                .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
        other => {
            return api_error(
                StatusCode::BAD_REQUEST,
                format!("unknown context tool: {other}"),
            )
        }
    };

    match result {
        Ok(value) => Json(value).into_response(),
        Err(resp) => resp,
    }
}
