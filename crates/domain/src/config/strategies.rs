use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Context strategies (external memory service)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Wiring for the external associative-memory / stuck-detection service.
/// The service also provides priority ranking for the trimming decorator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategiesConfig {
    /// Enable the pre/post turn hooks (stuck detection, sieve enrichment,
    /// exchange ingestion).
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the memory service. Unset disables the REST client;
    /// `/context-tools` then answers 501.
    #[serde(default)]
    pub memory_base_url: Option<String>,
    /// Token budget handed to `sieve` during pre-turn enrichment.
    #[serde(default = "d_1000")]
    pub sieve_token_budget: u32,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "d_retries")]
    pub max_retries: u32,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            memory_base_url: None,
            sieve_token_budget: d_1000(),
            timeout_ms: d_timeout_ms(),
            max_retries: d_retries(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_1000() -> u32 {
    1000
}
fn d_timeout_ms() -> u64 {
    10_000
}
fn d_retries() -> u32 {
    2
}
