//! Agent-facing value types: what a caller hands in and gets back.

use serde::{Deserialize, Serialize};
use crate::message::{AUDIO_PREFIX, Message};

/// Default cap on model round-trips per turn.
pub const DEFAULT_MAX_ITERATIONS: u32 = 20;

/// Content returned when the loop runs out of iterations.
pub const MAX_ITERATIONS_SENTINEL: &str = "Error: Max iterations reached";

/// Returned to the caller after a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// The final answer (or the sentinel when the cap was hit)
    pub content: String,

    /// Number of model calls made during the turn
    pub iterations: u32,
}

impl AgentResponse {
    /// Whether the turn ended because the iteration cap was reached.
    pub fn hit_iteration_cap(&self) -> bool {
        self.content == MAX_ITERATIONS_SENTINEL
    }
}

/// The caller's message for one turn.
///
/// Audio arrives as a `data:audio/...;base64,...` string and is passed through
/// untouched for the provider to interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserInput {
    Text(String),
    Audio(String),
}

impl UserInput {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        if raw.starts_with(AUDIO_PREFIX) {
            Self::Audio(raw)
        } else {
            Self::Text(raw)
        }
    }

    /// The message to record in the conversation.
    pub fn into_message(self) -> Message {
        match self {
            Self::Text(text) => Message::user(text),
            Self::Audio(payload) => Message::user(payload),
        }
    }
}
