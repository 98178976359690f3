use adk_domain::event::{Content, Event};
use adk_domain::RequestScope;
use async_trait::async_trait;

/// A completed window summary.
#[derive(Debug, Clone)]
pub struct SummaryResult {
    /// Single text part, role `"user"`.
    pub content: Content,
    pub start_timestamp: f64,
    pub end_timestamp: f64,
}

/// Summarizes a window of events into prose.
///
/// Summarization is advisory: implementations return `None` on transport
/// failures or empty completions and never propagate errors upward — the
/// token budget is the next line of defense.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, events: &[Event], scope: &RequestScope) -> Option<SummaryResult>;
}
