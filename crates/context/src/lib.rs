//! The context pipeline primitives: token estimation, the event↔message
//! adapter, the two trimming disciplines (priority-ranked and FIFO), and
//! the sliding-window computation used by compaction.
//!
//! All selection here is order-preserving: every trimmer returns a
//! chronological subsequence of its input. Reordering a model turn breaks
//! tool-call causality, so that guarantee is load-bearing.

pub mod adapter;
pub mod estimate;
pub mod fifo;
pub mod priority;
pub mod ranker;
pub mod window;

pub use adapter::{events_to_messages, Message, MessagePart, MessageRole};
pub use estimate::{estimate_event_tokens, estimate_message_tokens, estimate_session_tokens};
pub use fifo::fifo_trim;
pub use priority::priority_trim;
pub use ranker::{MessageRanker, RankedMessage};
pub use window::{compaction_window, CompactionWindow};
