//! Client for the external associative-memory / stuck-detection service.
//!
//! The service's internals are out of scope for the gateway; this crate
//! pins down the operations the context pipeline consumes and ships a
//! REST implementation with retry + backoff.

pub mod provider;
pub mod rest;
pub mod types;

pub use provider::ContextService;
pub use rest::RestContextClient;
pub use types::{
    IngestRequest, MemoryNode, RecoveryMessage, SieveResult, StuckDetection, TaskOutcome,
};
