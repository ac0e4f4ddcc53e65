//! Shared test helpers for agent loop tests.

use robert_core::message::{Message, MessageToolCall};
use robert_core::provider::{ModelReply, Provider, ToolSchema};
use robert_core::tool::{Tool, ToolRegistry, ToolResult};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A provider that plays back scripted replies and records what it was sent.
///
/// Panics if called more often than it has replies, unless built with
/// [`ScriptedProvider::always_tools`].
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ModelReply>>,
    requests: Mutex<Vec<Vec<Message>>>,
    endless_tools: bool,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            endless_tools: false,
        }
    }

    /// Requests an `echo` call on every turn, forever.
    pub fn always_tools() -> Self {
        Self {
            endless_tools: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every message list the provider received, in call order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[Message], _tools: &[ToolSchema]) -> ModelReply {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(messages.to_vec());
            requests.len()
        };

        if self.endless_tools {
            return ModelReply::with_tool_calls(
                "",
                vec![MessageToolCall::new(
                    format!("call_{call}"),
                    "echo",
                    r#"{"text":"again"}"#,
                )],
            );
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no reply left for call #{call}"))
    }
}

/// Echoes its `text` argument.
pub struct EchoTool;

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the input"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        match arguments["text"].as_str() {
            Some(text) => ToolResult::ok(text),
            None => ToolResult::error("Error: Missing 'text' argument"),
        }
    }
}

pub fn echo_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(EchoTool));
    registry
}
