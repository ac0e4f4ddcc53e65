//! Conversation persistence for Robert.
//!
//! Histories are append-only JSONL files, one per conversation key, loaded
//! lazily and held in memory for the life of the process.

pub mod log;
pub mod store;

pub use log::ConversationLog;
pub use store::{SessionGuard, SessionStore};
