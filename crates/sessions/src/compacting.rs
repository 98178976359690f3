//! Compacting decorator — collapses a sliding window of older events into
//! one LLM-written summary event.
//!
//! Runs on read, and after appends when the wrapped store exposes the
//! mutable event hatch. Compaction failures are advisory: the session is
//! returned unchanged and the trimming budget remains the next line of
//! defense.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use adk_context::{compaction_window, CompactionWindow};
use adk_domain::config::CompactionConfig;
use adk_domain::event::{Content, Event, Part};
use adk_domain::{RequestScope, Result, Session, SessionKey};
use adk_providers::{Summarizer, SummaryResult};
use async_trait::async_trait;

use crate::store::SessionStore;

/// Marks the summary text so the model (and a human reading the log) can
/// tell it apart from a live user turn.
const SUMMARY_PREFIX: &str = "[Previous conversation summary]\n";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Summary event construction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build the single event that replaces a compacted window.
///
/// Authored as `user` so every runner replays it — model-authored events
/// may be skipped by some runners. Timestamped at the window's last event
/// so chronology is preserved across the splice.
fn build_summary_event(summary: &SummaryResult) -> Event {
    let text: String = summary
        .content
        .parts
        .iter()
        .map(|p| match p {
            Part::Text(t) | Part::Thought(t) => t.clone(),
            Part::Value(v) => adk_domain::event::stringify_value(v),
            Part::Inline(_) => String::new(),
        })
        .collect();

    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let rand = &nonce[..8];

    Event {
        id: format!("compaction_{now_secs}_{rand}"),
        invocation_id: uuid::Uuid::new_v4().to_string(),
        author: "user".into(),
        timestamp: summary.end_timestamp,
        content: Some(Content {
            role: "user".into(),
            parts: vec![Part::Text(format!("{SUMMARY_PREFIX}{text}"))],
        }),
        actions: None,
        error_message: None,
    }
}

/// Splice: everything before the window, the summary, everything at and
/// after the window end.
fn splice(events: &[Event], window: CompactionWindow, summary_event: Event) -> Vec<Event> {
    let mut out = Vec::with_capacity(events.len() - window.len() + 1);
    out.extend_from_slice(&events[..window.start]);
    out.push(summary_event);
    out.extend_from_slice(&events[window.end..]);
    out
}

/// Run one compaction pass over `events`. `None` means nothing was done:
/// no window due, window below the minimum, or the summarizer declined.
pub async fn run_compaction(
    events: &[Event],
    config: &CompactionConfig,
    summarizer: &dyn Summarizer,
    scope: &RequestScope,
) -> Option<Vec<Event>> {
    let window = compaction_window(
        events.len(),
        config.interval,
        config.overlap,
        config.min_events_to_compact,
    )?;

    let summary = summarizer
        .summarize(&events[window.start..window.end], scope)
        .await?;

    tracing::debug!(
        window_start = window.start,
        window_end = window.end,
        total = events.len(),
        "compacting event window"
    );

    Some(splice(events, window, build_summary_event(&summary)))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Decorator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Wraps any store; compacts the event history on read, and after appends
/// when the inner store's events are mutable.
pub struct CompactingSessionStore {
    inner: Arc<dyn SessionStore>,
    summarizer: Arc<dyn Summarizer>,
    config: CompactionConfig,
}

impl CompactingSessionStore {
    pub fn new(
        inner: Arc<dyn SessionStore>,
        summarizer: Arc<dyn Summarizer>,
        config: CompactionConfig,
    ) -> Self {
        Self {
            inner,
            summarizer,
            config,
        }
    }

    /// Write the compacted list back through the hatch. Failure is logged
    /// and swallowed — the caller still gets the compacted copy.
    fn try_write_back(&self, key: &SessionKey, events: &[Event]) {
        if !self.inner.events_mutable() {
            return;
        }
        if let Err(e) = self.inner.replace_events(key, events.to_vec()) {
            tracing::warn!(session = %key, error = %e, "compaction write-back failed");
        }
    }
}

#[async_trait]
impl SessionStore for CompactingSessionStore {
    async fn create_session(
        &self,
        key: &SessionKey,
        state: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Session> {
        self.inner.create_session(key, state).await
    }

    async fn get_session(&self, key: &SessionKey, scope: &RequestScope) -> Result<Session> {
        let session = self.inner.get_session(key, scope).await?;
        if session.events.is_empty() {
            return Ok(session);
        }

        match run_compaction(&session.events, &self.config, self.summarizer.as_ref(), scope).await
        {
            Some(compacted) => {
                self.try_write_back(key, &compacted);
                tracing::info!(
                    session = %key,
                    before = session.events.len(),
                    after = compacted.len(),
                    "session history compacted"
                );
                Ok(session.with_events(compacted))
            }
            None => Ok(session),
        }
    }

    async fn list_sessions(&self, app_name: &str, user_id: &str) -> Result<Vec<Session>> {
        self.inner.list_sessions(app_name, user_id).await
    }

    async fn delete_session(&self, key: &SessionKey) -> Result<()> {
        self.inner.delete_session(key).await
    }

    async fn append_event(&self, key: &SessionKey, event: Event) -> Result<Event> {
        let event = self.inner.append_event(key, event).await?;

        // Post-append compaction needs the hatch: without it there is no
        // way to persist the result, and a compacted copy would be thrown
        // away along with the summarizer spend.
        if self.inner.events_mutable() {
            let scope = RequestScope::default();
            match self.inner.get_session(key, &scope).await {
                Ok(session) if session.events.len() >= self.config.interval => {
                    if let Some(compacted) = run_compaction(
                        &session.events,
                        &self.config,
                        self.summarizer.as_ref(),
                        &scope,
                    )
                    .await
                    {
                        self.try_write_back(key, &compacted);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(session = %key, error = %e, "post-append compaction read failed");
                }
            }
        }

        Ok(event)
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
