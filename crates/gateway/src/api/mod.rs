pub mod context_tools;
pub mod ollama;
pub mod run;
pub mod sessions;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use adk_domain::config::MAX_BODY_BYTES;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(sessions::healthz))
        .route("/list-apps", get(sessions::list_apps))
        .route(
            "/apps/:app/users/:user/sessions",
            get(sessions::list_sessions),
        )
        .route(
            "/apps/:app/users/:user/sessions/:session",
            post(sessions::create_session)
                .get(sessions::get_session)
                .delete(sessions::delete_session),
        )
        .route("/run_sse", post(run::run_sse))
        .route("/run_ollama_sse", post(ollama::run_ollama_sse))
        .route("/context-tools", post(context_tools::context_tools))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
}
