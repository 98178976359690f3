//! Wire types for the context service API.

use adk_context::MessagePart;
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Associative memory
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Result of a `sieve` query: assembled context that fits the budget.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SieveResult {
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub nodes_included: u32,
    #[serde(default)]
    pub token_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A stored memory node, echoed back on ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryNode {
    pub id: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskOutcome {
    Success,
    Failure,
    Partial,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Stuck detection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StuckDetection {
    #[serde(default)]
    pub is_stuck: bool,
    /// Loop category, e.g. `"repetition"` or `"oscillation"`.
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(default)]
    pub suggested_action: Option<String>,
}

/// Recovery message generated for a stuck conversation. Parts reuse the
/// projection's `{type, value}` shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecoveryMessage {
    #[serde(default)]
    pub content: Vec<MessagePart>,
}

impl RecoveryMessage {
    pub fn text(&self) -> String {
        self.content.iter().map(|p| p.value.as_str()).collect()
    }
}
