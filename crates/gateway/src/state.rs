use std::sync::Arc;

use adk_domain::config::Config;
use adk_memory::RestContextClient;
use adk_providers::OllamaClient;
use adk_sessions::SessionStore;

use crate::runner::AgentRunner;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// The decorated store stack (trimming over compaction over baseline).
    pub store: Arc<dyn SessionStore>,
    /// `None` until an agent is loaded; `/run_sse` answers 500 meanwhile.
    pub runner: Option<Arc<dyn AgentRunner>>,
    /// External memory service. `None` disables the context hooks and
    /// makes `/context-tools` answer 501.
    pub context: Option<Arc<RestContextClient>>,
    pub ollama: Arc<OllamaClient>,
}
