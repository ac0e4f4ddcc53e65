//! Provider trait: the abstraction over the language model backend.
//!
//! A Provider takes the ordered message history plus the tool schemas and
//! returns text, optionally with tool invocations. The concrete HTTP transport
//! lives in `robert-providers`.
//!
//! Providers never fail for ordinary provider or network problems: those come
//! back as a reply whose `content` describes the error and whose `tool_calls`
//! is empty, so the agent loop treats them like any other model turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::message::{Message, MessageToolCall};

/// A tool description sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// What the model said back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReply {
    /// Generated text (or a description of a transport failure)
    #[serde(default)]
    pub content: String,

    /// Requested tool invocations, in the order they must run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,
}

impl ModelReply {
    /// A plain text reply with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// A reply that requests tool invocations.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<MessageToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// The core Provider trait.
///
/// Every model backend implements this. The agent loop calls `chat()` without
/// knowing which backend is in use.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send the conversation and the available tools, get one reply back.
    async fn chat(&self, messages: &[Message], tools: &[ToolSchema]) -> ModelReply;
}
