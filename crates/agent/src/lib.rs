//! The core agent loop of Robert.
//!
//! The agent follows a **Plan → Act → Observe** cycle:
//!
//! 1. **Receive** a user message (CLI or gateway) for a conversation key
//! 2. **Build context** (system prompt + persisted history + tool schemas)
//! 3. **Send to LLM** via the configured provider
//! 4. **If tool calls**: execute tools, append results, loop back to step 3
//! 5. **If text response**: persist it and return it to the caller
//!
//! The loop continues until the LLM responds with text only (no tool calls)
//! or the max iteration limit is reached.

pub mod bootstrap;
pub mod context;
pub mod loop_runner;

#[cfg(test)]
mod test_helpers;

pub use bootstrap::build;
pub use context::{DEFAULT_IDENTITY, PromptAssembler};
pub use loop_runner::AgentLoop;
