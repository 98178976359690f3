//! Trimming decorator — a per-request budget view over the event history.
//!
//! Stacked outside compaction: summarization runs first, so trimming is
//! often a no-op. Selection prefers the priority ranker and falls back to
//! FIFO; the result is never written back — priority rankings are
//! query-dependent, and destructively trimming would discard context a
//! later, differently-phrased turn may need.

use std::sync::Arc;

use adk_context::{estimate_session_tokens, fifo_trim, priority_trim, MessageRanker};
use adk_domain::config::TrimmingConfig;
use adk_domain::{Event, RequestScope, Result, Session, SessionKey};
use async_trait::async_trait;

use crate::store::SessionStore;

/// Histories below this length are returned as-is.
const MIN_TRIMMABLE_EVENTS: usize = 4;

pub struct TrimmingSessionStore {
    inner: Arc<dyn SessionStore>,
    ranker: Option<Arc<dyn MessageRanker>>,
    config: TrimmingConfig,
}

impl TrimmingSessionStore {
    pub fn new(
        inner: Arc<dyn SessionStore>,
        ranker: Option<Arc<dyn MessageRanker>>,
        config: TrimmingConfig,
    ) -> Self {
        Self {
            inner,
            ranker,
            config,
        }
    }

    /// Priority selection, or `None` when the ranker is missing, errored,
    /// or declined to shrink the history.
    async fn try_priority(&self, events: &[Event], budget: u32) -> Option<Vec<Event>> {
        let ranker = self.ranker.as_deref()?;
        match priority_trim(events, budget, ranker).await {
            Ok(selected) if selected.len() < events.len() => Some(selected),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "priority ranking failed, falling back to FIFO");
                None
            }
        }
    }
}

#[async_trait]
impl SessionStore for TrimmingSessionStore {
    async fn create_session(
        &self,
        key: &SessionKey,
        state: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Session> {
        self.inner.create_session(key, state).await
    }

    async fn get_session(&self, key: &SessionKey, scope: &RequestScope) -> Result<Session> {
        let session = self.inner.get_session(key, scope).await?;
        if session.events.len() < MIN_TRIMMABLE_EVENTS {
            return Ok(session);
        }

        let budget = self
            .config
            .effective_budget(scope.context_limit, scope.effective_retry_factor());
        let estimated = estimate_session_tokens(&session.events);
        if estimated <= budget {
            return Ok(session);
        }

        if let Some(selected) = self.try_priority(&session.events, budget).await {
            tracing::info!(
                session = %key,
                estimated,
                budget,
                before = session.events.len(),
                after = selected.len(),
                "history trimmed by priority rank"
            );
            return Ok(session.with_events(selected));
        }

        let suffix = fifo_trim(&session.events, budget);
        if suffix.len() < session.events.len() {
            tracing::info!(
                session = %key,
                estimated,
                budget,
                before = session.events.len(),
                after = suffix.len(),
                "history trimmed to newest suffix"
            );
            let suffix = suffix.to_vec();
            return Ok(session.with_events(suffix));
        }

        Ok(session)
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        self.inner.list_sessions(app_name, user_id).await
    }

    async fn delete_session(&self, key: &SessionKey) -> Result<()> {
        self.inner.delete_session(key).await
    }

    async fn append_event(&self, key: &SessionKey, event: Event) -> Result<Event> {
        self.inner.append_event(key, event).await
    }

    fn events_mutable(&self) -> bool {
        self.inner.events_mutable()
    }

    fn replace_events(&self, key: &SessionKey, events: Vec<Event>) -> Result<()> {
        self.inner.replace_events(key, events)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
