//! The agent reasoning loop implementation.

use crate::context::PromptAssembler;
use robert_core::agent::{AgentResponse, DEFAULT_MAX_ITERATIONS, MAX_ITERATIONS_SENTINEL, UserInput};
use robert_core::message::{ConversationKey, Message, MessageToolCall};
use robert_core::provider::Provider;
use robert_core::tool::ToolRegistry;
use robert_session::SessionStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The core agent loop that orchestrates LLM calls and tool execution.
///
/// Built once at startup and shared by `Arc` between the CLI and gateway.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Enabled capabilities
    tools: Arc<ToolRegistry>,

    /// Per-key conversation logs
    sessions: Arc<SessionStore>,

    /// System prompt builder
    prompt: PromptAssembler,

    /// Maximum model calls per turn
    max_iterations: u32,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            provider,
            tools,
            sessions,
            prompt: PromptAssembler::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set the maximum number of model calls per turn. At least one call is
    /// always made.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Use a different prompt assembler (identity).
    pub fn with_prompt(mut self, prompt: PromptAssembler) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Run one turn for `key`.
    ///
    /// 1. Append the caller's message (text or audio payload)
    /// 2. Send system prompt + history + tool schemas to the model
    /// 3. If tool calls come back: record them, run each in order, record
    ///    each result, go to 2
    /// 4. Otherwise record the answer and return it
    ///
    /// The conversation stays locked for the whole turn. Only failures to
    /// write the log are returned as errors.
    pub async fn process(
        &self,
        input: &str,
        key: &ConversationKey,
    ) -> robert_core::Result<AgentResponse> {
        let mut log = self.sessions.lock(key).await?;

        info!(
            key = %key,
            history = log.len(),
            "Processing turn"
        );

        log.append(UserInput::parse(input).into_message()).await?;

        let schemas = self.tools.schemas();
        let system = Message::system(self.prompt.build(&schemas));

        for iteration in 1..=self.max_iterations {
            debug!(key = %key, iteration, "Agent loop iteration");

            let mut messages = Vec::with_capacity(log.len() + 1);
            messages.push(system.clone());
            messages.extend_from_slice(log.messages());

            let reply = self.provider.chat(&messages, &schemas).await;

            if !reply.has_tool_calls() {
                log.append(Message::assistant(reply.content.clone())).await?;
                info!(key = %key, iterations = iteration, "Turn complete");
                return Ok(AgentResponse {
                    content: reply.content,
                    iterations: iteration,
                });
            }

            debug!(tool_count = reply.tool_calls.len(), "Executing tool calls");

            let calls = reply.tool_calls.clone();
            log.append(Message::assistant_with_tool_calls(reply.content, reply.tool_calls))
                .await?;

            for call in &calls {
                let output = self.dispatch(call).await;
                log.append(Message::tool_result(call.id.clone(), output)).await?;
            }
        }

        warn!(
            key = %key,
            iterations = self.max_iterations,
            "Max iterations reached"
        );
        Ok(AgentResponse {
            content: MAX_ITERATIONS_SENTINEL.into(),
            iterations: self.max_iterations,
        })
    }

    /// Run one requested call and return the text to record for it.
    async fn dispatch(&self, call: &MessageToolCall) -> String {
        let arguments = match parse_arguments(call.arguments()) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = %call.name(), error = %e, "Unparsable tool arguments");
                return format!("Error: Invalid arguments for tool '{}': {e}", call.name());
            }
        };

        debug!(tool = %call.name(), call_id = %call.id, "Calling tool");
        let result = self.tools.call(call.name(), arguments).await;
        if result.is_error {
            debug!(tool = %call.name(), output = %result.content, "Tool reported an error");
        }
        result.content
    }
}

/// Arguments arrive as a JSON string; an empty string means no arguments.
fn parse_arguments(raw: &str) -> Result<serde_json::Value, serde_json::Error> {
    if raw.trim().is_empty() {
        Ok(serde_json::json!({}))
    } else {
        serde_json::from_str(raw)
    }
}
