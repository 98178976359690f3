//! Session storage and the two context-management decorators.
//!
//! The baseline store owns the authoritative event lists. Decorators stack
//! over it: compaction first (summarizes older windows, may write back),
//! trimming second (per-request budget view, never writes back).
//!
//! ```text
//! TrimmingSessionStore ── CompactingSessionStore ── InMemorySessionStore
//! ```

pub mod compacting;
pub mod store;
pub mod trimming;

pub use compacting::CompactingSessionStore;
pub use store::{InMemorySessionStore, SessionStore};
pub use trimming::TrimmingSessionStore;
