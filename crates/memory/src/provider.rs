use adk_context::Message;
use adk_domain::Result;
use async_trait::async_trait;

use crate::types::{IngestRequest, MemoryNode, RecoveryMessage, SieveResult, StuckDetection, TaskOutcome};

/// The operations the gateway hooks consume. One trait because the
/// external service exposes them behind one endpoint family; tests stub
/// the whole surface at once.
#[async_trait]
pub trait ContextService: Send + Sync {
    /// Retrieve context relevant to `query`, assembled under `token_budget`.
    async fn sieve(&self, query: &str, token_budget: u32) -> Result<SieveResult>;

    /// Store a piece of content in associative memory.
    async fn ingest(&self, req: IngestRequest) -> Result<MemoryNode>;

    /// Feed back how the last task went (reinforces recall weighting).
    async fn record_task_outcome(&self, outcome: TaskOutcome) -> Result<()>;

    /// Analyze recent messages for unproductive loops.
    async fn detect_stuck(&self, messages: &[Message]) -> Result<StuckDetection>;

    /// Produce a course-correcting message for a stuck conversation.
    async fn generate_recovery_message(
        &self,
        detection: &StuckDetection,
    ) -> Result<RecoveryMessage>;
}
