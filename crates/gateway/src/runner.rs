//! The agent runner contract.
//!
//! The runner is an external collaborator: given a session snapshot and
//! the new user message, it produces a lazy stream of events (model
//! deltas, tool activity, errors). The gateway consumes the stream while
//! writing SSE frames; dropping the stream cancels whatever the runner
//! has in flight, which is how client disconnects propagate.
//!
//! The runner owns persistence of the events it emits. The gateway only
//! appends the incoming user message.

use adk_domain::event::{Content, Event};
use adk_domain::stream::BoxStream;
use adk_domain::{RequestScope, Result, Session};
use async_trait::async_trait;

#[async_trait]
pub trait AgentRunner: Send + Sync {
    /// Start one model turn. Each call creates a fresh producer — the
    /// token-overflow retry is a second call, never a seek on the first
    /// stream.
    async fn run(
        &self,
        session: Session,
        new_message: Content,
        scope: RequestScope,
    ) -> Result<BoxStream<'static, Result<Event>>>;
}
