//! The priority-ranking contract.
//!
//! Ranking is an external concern — the gateway ships a REST-backed
//! implementation, tests ship stubs. The trimming path only relies on the
//! selection contract: the returned indices point into the input slice and
//! preserve nothing about order (the caller re-sorts chronologically).

use adk_domain::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::adapter::Message;

/// A scored message, as returned by `sort_by_priority`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedMessage {
    pub score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    pub message: Message,
}

/// Scores messages and selects subsets under a token budget or top-N.
///
/// Selection methods return indices into the input slice so the caller can
/// lift the choice back to originating events exactly. Token accounting
/// uses the shared character estimator.
#[async_trait]
pub trait MessageRanker: Send + Sync {
    async fn sort_by_priority(&self, messages: &[Message]) -> Result<Vec<RankedMessage>>;

    async fn select_by_token_budget(
        &self,
        messages: &[Message],
        token_budget: u32,
    ) -> Result<Vec<usize>>;

    async fn select_top_messages(&self, messages: &[Message], n: usize) -> Result<Vec<usize>>;
}
