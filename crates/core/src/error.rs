//! Error types for the Robert domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum. Only [`Error`] ever crosses
//! the orchestrator boundary; [`ToolError`] and [`ProviderError`] are turned
//! into data (tool results, reply text) where they occur.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all Robert operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Conversation log errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupt record at {path}:{line}: {reason}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Missing {0}")]
    MissingCredential(String),

    #[error("LLM Error {status_code}: {message}")]
    ApiError { status_code: u16, message: String },

    #[error("Connection Error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool '{0}' not found or disabled.")]
    NotFound(String),

    #[error("Access denied. Path is outside workspace.")]
    AccessDenied,

    #[error("Command '{command}' is not in the allowlist ({allowed}).")]
    CommandNotAllowed { command: String, allowed: String },

    #[error("Command contains the shell operator '{operator}', which is not allowed.")]
    ShellOperator { operator: char },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("{action}: {reason}")]
    ExecutionFailed { action: String, reason: String },

    #[error("Command timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Connection error: {0}")]
    Connection(String),
}
