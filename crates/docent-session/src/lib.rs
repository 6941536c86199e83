//! Conversation sessions for the Docent tutor.
//!
//! A session is keyed by a caller-chosen id and tracks the turn history, the
//! current topic and answer counters. Each session sits behind its own async
//! mutex so one request at a time can mutate it.

/// Session state and progress snapshots.
pub mod session;
/// Session store trait and in-memory implementation.
pub mod store;

pub use session::{Session, SessionSummary};
pub use store::{validate_session_id, InMemorySessionStore, SessionHandle, SessionStore};
