use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use adk_domain::config::{Config, ConfigSeverity};
use adk_gateway::api;
use adk_gateway::state::AppState;
use adk_memory::RestContextClient;
use adk_providers::{OllamaClient, OpenAiSummarizer, Summarizer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ──────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,adk_gateway=debug")),
        )
        .json()
        .init();

    tracing::info!("ADK gateway starting");

    // ── Config ───────────────────────────────────────────────────────
    let config = Config::from_env();
    let mut fatal = false;
    for issue in config.validate() {
        match issue.severity {
            ConfigSeverity::Error => {
                fatal = true;
                tracing::error!(field = %issue.field, "{}", issue.message);
            }
            ConfigSeverity::Warning => {
                tracing::warn!(field = %issue.field, "{}", issue.message);
            }
        }
    }
    if fatal {
        anyhow::bail!("configuration is invalid, refusing to start");
    }
    let config = Arc::new(config);

    // ── Summarizer transport ─────────────────────────────────────────
    let summarizer: Option<Arc<dyn Summarizer>> = OpenAiSummarizer::from_config(&config.summarizer)
        .map(|s| Arc::new(s) as Arc<dyn Summarizer>);
    match (&summarizer, config.compaction.enabled) {
        (Some(_), true) => tracing::info!(
            interval = config.compaction.interval,
            overlap = config.compaction.overlap,
            "compaction enabled"
        ),
        (None, true) => {} // already warned by validate()
        _ => tracing::info!("compaction disabled"),
    }

    // ── Context service ──────────────────────────────────────────────
    let context = RestContextClient::from_config(&config.strategies)
        .context("creating context service client")?
        .map(Arc::new);
    match (&context, config.strategies.enabled) {
        (Some(_), true) => tracing::info!("context strategies enabled"),
        (None, true) => {} // already warned by validate()
        _ => tracing::info!("context strategies disabled"),
    }

    // ── Session store stack ──────────────────────────────────────────
    let ranker = if config.strategies.enabled {
        context
            .clone()
            .map(|c| c as Arc<dyn adk_context::MessageRanker>)
    } else {
        None
    };
    let store = adk_gateway::build_session_store(&config, summarizer, ranker);

    // ── App state ────────────────────────────────────────────────────
    // The agent runner is registered by the embedding deployment; the
    // bare binary serves the session and context APIs and answers 500 on
    // /run_sse until one is attached.
    let state = AppState {
        config: config.clone(),
        store,
        runner: None,
        context,
        ollama: Arc::new(OllamaClient::new()),
    };
    if state.runner.is_none() {
        tracing::warn!("no agent runner registered; /run_sse will answer 500");
    }

    // ── Bind ─────────────────────────────────────────────────────────
    let app = api::router().with_state(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    let local_addr = listener.local_addr().context("reading bound address")?;
    if let Some(port_file) = &config.server.port_file {
        std::fs::write(port_file, local_addr.port().to_string())
            .with_context(|| format!("writing port file {}", port_file.display()))?;
    }

    tracing::info!(addr = %local_addr, "ADK gateway listening");

    axum::serve(listener, app)
        .await
        .context("axum server error")?;

    Ok(())
}
