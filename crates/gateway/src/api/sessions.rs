//! Session CRUD endpoints.
//!
//! - `POST   /apps/:app/users/:user/sessions/:session` — create; 400 if exists
//! - `GET    /apps/:app/users/:user/sessions/:session` — fetch; 404 if missing
//! - `GET    /apps/:app/users/:user/sessions`          — list
//! - `DELETE /apps/:app/users/:user/sessions/:session` — delete; 404 if missing

use adk_domain::{Error, RequestScope, SessionKey};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::Value;

use crate::state::AppState;

/// The single app this gateway serves.
pub const APP_NAME: &str = "adk_chat";

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn map_store_error(err: Error) -> Response {
    match err {
        Error::NotFound(k) => api_error(StatusCode::NOT_FOUND, format!("session not found: {k}")),
        Error::AlreadyExists(k) => {
            api_error(StatusCode::BAD_REQUEST, format!("session already exists: {k}"))
        }
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handlers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn list_apps() -> impl IntoResponse {
    Json(serde_json::json!([APP_NAME]))
}

pub async fn create_session(
    State(state): State<AppState>,
    Path((app, user, session)): Path<(String, String, String)>,
    body: Option<Json<Value>>,
) -> Response {
    let key = SessionKey::new(app, user, session);

    // Optional initial state map in the body.
    let initial_state = body
        .and_then(|Json(v)| v.get("state").cloned())
        .and_then(|v| match v {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .unwrap_or_default();

    match state.store.create_session(&key, initial_state).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => map_store_error(e),
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    Path((app, user, session)): Path<(String, String, String)>,
) -> Response {
    let key = SessionKey::new(app, user, session);
    match state.store.get_session(&key, &RequestScope::default()).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => map_store_error(e),
    }
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Path((app, user)): Path<(String, String)>,
) -> Response {
    match state.store.list_sessions(&app, &user).await {
        Ok(sessions) => Json(sessions).into_response(),
        Err(e) => map_store_error(e),
    }
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path((app, user, session)): Path<(String, String, String)>,
) -> Response {
    let key = SessionKey::new(app, user, session);
    match state.store.delete_session(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => map_store_error(e),
    }
}
