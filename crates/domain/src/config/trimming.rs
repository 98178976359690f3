use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Trimming
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Budget parameters for the per-request trimming decorator.
///
/// The effective budget for a read is
/// `max(1000, (base − buffer) × retry_factor)` where `base` is the
/// per-request context limit when set, otherwise `rank_token_budget`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimmingConfig {
    /// Default token budget handed to the priority ranker.
    #[serde(default = "d_4000")]
    pub rank_token_budget: u32,
    /// Headroom reserved for the system prompt, tool schemas, attachments,
    /// and the incoming message.
    #[serde(default = "d_2200")]
    pub buffer_tokens: u32,
}

impl Default for TrimmingConfig {
    fn default() -> Self {
        Self {
            rank_token_budget: 4000,
            buffer_tokens: 2200,
        }
    }
}

impl TrimmingConfig {
    /// Resolve the effective budget for one read. `base_override` is the
    /// per-request context limit (ignored unless > 0); `retry_factor` is
    /// the shrink multiplier on a token-limit retry pass.
    pub fn effective_budget(&self, base_override: Option<u32>, retry_factor: f64) -> u32 {
        let base = match base_override {
            Some(v) if v > 0 => v,
            _ => self.rank_token_budget,
        };
        let scaled = (base as f64 - self.buffer_tokens as f64) * retry_factor;
        scaled.max(1000.0) as u32
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_4000() -> u32 {
    4000
}
fn d_2200() -> u32 {
    2200
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_budget_subtracts_buffer() {
        let cfg = TrimmingConfig::default();
        assert_eq!(cfg.effective_budget(None, 1.0), 1800);
    }

    #[test]
    fn effective_budget_floor_is_1000() {
        let cfg = TrimmingConfig::default();
        // 1800 * 0.125 = 225, clamped up.
        assert_eq!(cfg.effective_budget(None, 0.125), 1000);
        // Buffer larger than base.
        assert_eq!(cfg.effective_budget(Some(100), 1.0), 1000);
    }

    #[test]
    fn per_request_override_replaces_base() {
        let cfg = TrimmingConfig::default();
        assert_eq!(cfg.effective_budget(Some(10_000), 1.0), 7800);
        // Zero override falls back to the configured default.
        assert_eq!(cfg.effective_budget(Some(0), 1.0), 1800);
    }
}
