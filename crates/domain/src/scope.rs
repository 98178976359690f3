//! Per-request ambient scope.
//!
//! Everything a single `/run_sse` request may override — model, context
//! limit, retry trim percentage — travels in one explicit value that is
//! threaded through the session-store read path and the summarizer.
//! Process-global ambient state would race under concurrent requests.

use serde::Deserialize;

/// Per-request model override for the runner and the summarizer transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOverride {
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Request-local configuration for one gateway turn.
#[derive(Debug, Clone)]
pub struct RequestScope {
    pub model_override: Option<ModelOverride>,
    /// Overrides the configured trimming base budget when set and > 0.
    pub context_limit: Option<u32>,
    /// Percentage of the budget kept on a token-limit retry, in `[1, 100]`.
    pub retry_trim_percent: f64,
    /// Set to `retry_trim_percent / 100` on the retry pass; `None` otherwise.
    pub retry_factor: Option<f64>,
    pub tool_executor_url: Option<String>,
    /// Whether the runner should stream partial events or emit complete
    /// turns only.
    pub streaming: bool,
}

pub const DEFAULT_RETRY_TRIM_PERCENT: f64 = 12.5;

impl Default for RequestScope {
    fn default() -> Self {
        Self {
            model_override: None,
            context_limit: None,
            retry_trim_percent: DEFAULT_RETRY_TRIM_PERCENT,
            retry_factor: None,
            tool_executor_url: None,
            streaming: false,
        }
    }
}

impl RequestScope {
    /// The multiplier applied to the trimming budget: 1 on the first pass,
    /// `retry_trim_percent / 100` on the retry pass.
    pub fn effective_retry_factor(&self) -> f64 {
        self.retry_factor.unwrap_or(1.0)
    }

    /// Enter the retry pass: tighten the budget for the replayed turn.
    pub fn arm_retry(&mut self) {
        self.retry_factor = Some(self.retry_trim_percent / 100.0);
    }
}
