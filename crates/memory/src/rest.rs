//! REST implementation of [`ContextService`] and the priority-ranking
//! contract.
//!
//! Wraps a `reqwest::Client` and translates every trait method into the
//! corresponding HTTP call against the context service, with automatic
//! retry + exponential back-off on transient (5xx / timeout) failures.

use std::time::Duration;

use adk_context::{Message, MessageRanker, RankedMessage};
use adk_domain::config::StrategiesConfig;
use adk_domain::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::provider::ContextService;
use crate::types::{
    IngestRequest, MemoryNode, RecoveryMessage, SieveResult, StuckDetection, TaskOutcome,
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A REST-based client for the context service.
///
/// Created once and reused for the lifetime of the gateway process; the
/// underlying `reqwest::Client` maintains a connection pool.
#[derive(Debug, Clone)]
pub struct RestContextClient {
    http: Client,
    base_url: String,
    max_retries: u32,
}

impl RestContextClient {
    /// Build a client from the strategies config. `None` when no base URL
    /// is configured — the gateway then runs without context strategies.
    pub fn from_config(cfg: &StrategiesConfig) -> Result<Option<Self>> {
        let base_url = match &cfg.memory_base_url {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => return Ok(None),
        };

        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Some(Self {
            http,
            base_url,
            max_retries: cfg.max_retries,
        }))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn decorate(&self, rb: RequestBuilder) -> RequestBuilder {
        rb.header("X-Client-Type", "adk-gateway")
            .header("X-Trace-Id", Uuid::new_v4().to_string())
    }

    // ── retry engine ─────────────────────────────────────────────────

    /// Execute a request with retry + exponential back-off.
    ///
    /// * Retries on 5xx status codes and transport errors.
    /// * Does **not** retry on 4xx (client errors are permanent).
    async fn execute_with_retry(
        &self,
        endpoint: &str,
        build_request: impl Fn() -> RequestBuilder,
    ) -> Result<Response> {
        let mut last_err: Option<Error> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = Duration::from_millis(100 * 2u64.pow(attempt - 1));
                tracing::debug!(endpoint, attempt, backoff_ms = backoff.as_millis() as u64, "retrying context service call");
                tokio::time::sleep(backoff).await;
            }

            match self.decorate(build_request()).send().await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        last_err = Some(Error::Memory(format!(
                            "{endpoint} returned {}: {body}",
                            status.as_u16()
                        )));
                        continue;
                    }

                    if status.is_client_error() {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(Error::Memory(format!(
                            "{endpoint} returned {}: {body}",
                            status.as_u16()
                        )));
                    }

                    return Ok(resp);
                }
                Err(e) => {
                    last_err = Some(Error::Http(format!("{endpoint}: {e}")));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Memory(format!("{endpoint}: retries exhausted"))))
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        let url = self.url(path);
        let resp = self
            .execute_with_retry(path, || self.http.post(&url).json(&body))
            .await?;
        resp.json::<T>()
            .await
            .map_err(|e| Error::Memory(format!("{path}: invalid response body: {e}")))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ContextService
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
impl ContextService for RestContextClient {
    async fn sieve(&self, query: &str, token_budget: u32) -> Result<SieveResult> {
        self.post_json(
            "/api/memory/sieve",
            serde_json::json!({ "query": query, "tokenBudget": token_budget }),
        )
        .await
    }

    async fn ingest(&self, req: IngestRequest) -> Result<MemoryNode> {
        self.post_json("/api/memory/ingest", serde_json::to_value(&req)?)
            .await
    }

    async fn record_task_outcome(&self, outcome: TaskOutcome) -> Result<()> {
        let _: Value = self
            .post_json(
                "/api/memory/task-outcome",
                serde_json::json!({ "outcome": outcome }),
            )
            .await?;
        Ok(())
    }

    async fn detect_stuck(&self, messages: &[Message]) -> Result<StuckDetection> {
        self.post_json(
            "/api/stuck/detect",
            serde_json::json!({ "messages": messages }),
        )
        .await
    }

    async fn generate_recovery_message(
        &self,
        detection: &StuckDetection,
    ) -> Result<RecoveryMessage> {
        self.post_json(
            "/api/stuck/recovery",
            serde_json::json!({ "detection": detection }),
        )
        .await
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MessageRanker
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Selection responses echo input indices so the trimmer can lift the
/// choice back to events without content matching.
#[derive(serde::Deserialize)]
struct SelectionResponse {
    #[serde(default)]
    selected: Vec<usize>,
}

#[async_trait]
impl MessageRanker for RestContextClient {
    async fn sort_by_priority(&self, messages: &[Message]) -> Result<Vec<RankedMessage>> {
        #[derive(serde::Deserialize)]
        struct SortResponse {
            #[serde(default)]
            ranked: Vec<RankedMessage>,
        }
        let resp: SortResponse = self
            .post_json(
                "/api/priority/sort",
                serde_json::json!({ "messages": messages }),
            )
            .await?;
        Ok(resp.ranked)
    }

    async fn select_by_token_budget(
        &self,
        messages: &[Message],
        token_budget: u32,
    ) -> Result<Vec<usize>> {
        let resp: SelectionResponse = self
            .post_json(
                "/api/priority/select",
                serde_json::json!({ "messages": messages, "tokenBudget": token_budget }),
            )
            .await?;
        Ok(resp.selected)
    }

    async fn select_top_messages(&self, messages: &[Message], n: usize) -> Result<Vec<usize>> {
        let resp: SelectionResponse = self
            .post_json(
                "/api/priority/top",
                serde_json::json!({ "messages": messages, "n": n }),
            )
            .await?;
        Ok(resp.selected)
    }
}
