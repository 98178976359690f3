//! The streaming gateway: HTTP surface, SSE framing, delta extraction,
//! the token-overflow retry loop, and the pre/post context hooks.

pub mod api;
pub mod hooks;
pub mod runner;
pub mod sse;
pub mod state;
pub mod token_limit;

use std::sync::Arc;

use adk_context::MessageRanker;
use adk_domain::config::Config;
use adk_providers::Summarizer;
use adk_sessions::{CompactingSessionStore, InMemorySessionStore, SessionStore, TrimmingSessionStore};

/// Assemble the session store stack: the in-memory baseline, wrapped by
/// compaction (when enabled and a summarizer transport exists), wrapped
/// by trimming. Compaction first, trimming second — fewer tokens after
/// summarization means trimming is often a no-op.
pub fn build_session_store(
    config: &Config,
    summarizer: Option<Arc<dyn Summarizer>>,
    ranker: Option<Arc<dyn MessageRanker>>,
) -> Arc<dyn SessionStore> {
    let mut store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());

    match (config.compaction.enabled, summarizer) {
        (true, Some(summarizer)) => {
            store = Arc::new(CompactingSessionStore::new(
                store,
                summarizer,
                config.compaction.clone(),
            ));
        }
        (true, None) => {
            tracing::warn!(
                "compaction enabled but no summarizer transport configured; \
                 running without compaction"
            );
        }
        (false, _) => {}
    }

    Arc::new(TrimmingSessionStore::new(
        store,
        ranker,
        config.trimming.clone(),
    ))
}
