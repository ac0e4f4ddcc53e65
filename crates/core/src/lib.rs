//! # Robert Core
//!
//! Domain types, traits, and error definitions for the Robert agent runtime.
//! This crate has **zero framework dependencies**: it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping the model backend or tool set via configuration
//! - Easy testing with scripted providers and stub tools
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentResponse, UserInput};
pub use error::{Error, Result};
pub use message::{ConversationKey, Message, MessageToolCall, Role};
pub use provider::{ModelReply, Provider, ToolSchema};
pub use tool::{Tool, ToolRegistry, ToolResult};
