//! Shared domain types for the ADK chat gateway: the session/event data
//! model, per-request scope, configuration, and the common error type.

pub mod config;
pub mod error;
pub mod event;
pub mod scope;
pub mod stream;

pub use error::{Error, Result};
pub use event::{Content, Event, InlineData, Part, Session, SessionKey};
pub use scope::{ModelOverride, RequestScope};
