use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Compaction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Sliding-window compaction parameters.
///
/// Compaction collapses a contiguous window of older events into a single
/// summary event so the history stays inside the context window after many
/// turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompactionConfig {
    /// Enable compaction on the session read/append paths.
    #[serde(default)]
    pub enabled: bool,
    /// Window stride: a window closes every `interval` events.
    #[serde(default = "d_3")]
    pub interval: usize,
    /// Events re-summarized from the previous window for continuity.
    #[serde(default = "d_1")]
    pub overlap: usize,
    /// Smallest window worth an LLM round-trip.
    #[serde(default = "d_6")]
    pub min_events_to_compact: usize,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: 3,
            overlap: 1,
            min_events_to_compact: 6,
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_3() -> usize {
    3
}
fn d_1() -> usize {
    1
}
fn d_6() -> usize {
    6
}
