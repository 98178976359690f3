mod compaction;
mod server;
mod strategies;
mod summarizer;
mod trimming;

pub use compaction::*;
pub use server::*;
pub use strategies::*;
pub use summarizer::*;
pub use trimming::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub trimming: TrimmingConfig,
    #[serde(default)]
    pub compaction: CompactionConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub strategies: StrategiesConfig,
    /// Default tool executor URL handed to the runner; per-request bodies
    /// may override it.
    #[serde(default)]
    pub tool_executor_url: Option<String>,
}

impl Config {
    /// Build a config from the recognized environment variables, starting
    /// from the serde defaults. Unset variables keep their defaults;
    /// unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut cfg = Config::default();

        if let Some(v) = env_u32("ADK_CONTEXT_RANK_TOKEN_BUDGET") {
            cfg.trimming.rank_token_budget = v;
        }
        if let Some(v) = env_u32("ADK_CONTEXT_BUFFER_TOKENS") {
            cfg.trimming.buffer_tokens = v;
        }
        if let Some(v) = env_usize("ADK_COMPACTION_INTERVAL") {
            cfg.compaction.interval = v.max(1);
        }
        if let Some(v) = env_usize("ADK_COMPACTION_OVERLAP") {
            cfg.compaction.overlap = v;
        }
        cfg.compaction.enabled = env_flag("ADK_ENABLE_COMPACTION");
        cfg.strategies.enabled = env_flag("ADK_ENABLE_CONTEXT_STRATEGIES");
        cfg.tool_executor_url = env_string("ADK_TOOL_EXECUTOR_URL");

        if let Some(v) = env_u32("ADK_PORT") {
            cfg.server.port = v as u16;
        }
        cfg.server.port_file = env_string("ADK_PORT_FILE").map(Into::into);

        cfg.summarizer.base_url = env_string("OPENAI_COMPATIBLE_BASE_URL");
        cfg.summarizer.model = env_string("OPENAI_COMPATIBLE_MODEL");
        cfg.summarizer.api_key = env_string("OPENAI_API_KEY");

        cfg.strategies.memory_base_url = env_string("ADK_MEMORY_BASE_URL");

        cfg
    }
}

// ── env helpers ─────────────────────────────────────────────────────

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_u32(name: &str) -> Option<u32> {
    let raw = env_string(name)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!(var = name, value = %raw, "ignoring unparseable env var");
            None
        }
    }
}

fn env_usize(name: &str) -> Option<usize> {
    env_u32(name).map(|v| v as usize)
}

/// `1`, `true`, `yes` (any case) enable a flag; everything else disables.
fn env_flag(name: &str) -> bool {
    matches!(
        env_string(name).as_deref().map(str::to_ascii_lowercase).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }

        if self.trimming.rank_token_budget == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "trimming.rank_token_budget".into(),
                message: "token budget must be greater than 0".into(),
            });
        }

        if self.trimming.buffer_tokens >= self.trimming.rank_token_budget {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "trimming.buffer_tokens".into(),
                message: format!(
                    "buffer ({}) >= base budget ({}); the effective budget \
                     will be clamped to the 1000-token floor",
                    self.trimming.buffer_tokens, self.trimming.rank_token_budget
                ),
            });
        }

        if self.compaction.interval == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "compaction.interval".into(),
                message: "interval must be at least 1".into(),
            });
        }

        if self.compaction.enabled && !self.summarizer.is_configured() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "summarizer".into(),
                message: "compaction enabled but OPENAI_COMPATIBLE_BASE_URL / \
                          OPENAI_COMPATIBLE_MODEL are unset; compaction will be \
                          disabled"
                    .into(),
            });
        }

        if self.strategies.enabled && self.strategies.memory_base_url.is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "strategies.memory_base_url".into(),
                message: "context strategies enabled but ADK_MEMORY_BASE_URL is \
                          unset; stuck detection and sieve enrichment will be \
                          skipped"
                    .into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let cfg = Config::default();
        assert_eq!(cfg.trimming.rank_token_budget, 4000);
        assert_eq!(cfg.trimming.buffer_tokens, 2200);
        assert_eq!(cfg.compaction.interval, 3);
        assert_eq!(cfg.compaction.overlap, 1);
        assert!(!cfg.compaction.enabled);
        assert!(!cfg.strategies.enabled);
        assert_eq!(cfg.server.port, 8000);
    }

    #[test]
    fn validate_flags_zero_port() {
        let mut cfg = Config::default();
        cfg.server.port = 0;
        let issues = cfg.validate();
        assert!(issues
            .iter()
            .any(|e| e.field == "server.port" && e.severity == ConfigSeverity::Error));
    }

    #[test]
    fn validate_warns_on_compaction_without_summarizer() {
        let mut cfg = Config::default();
        cfg.compaction.enabled = true;
        let issues = cfg.validate();
        assert!(issues.iter().any(|e| e.field == "summarizer"));
    }
}
