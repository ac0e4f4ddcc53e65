//! System prompt assembly.
//!
//! The prompt is rebuilt every turn from the identity text and the tools that
//! are currently registered. Same inputs, same prompt.

use robert_core::provider::ToolSchema;

/// Identity line used when the configuration does not provide one.
pub const DEFAULT_IDENTITY: &str = "You are Agent R.O.B.E.R.T.";

const DIRECTIVES: &[&str] = &[
    "You have access to local tools. If a tool can help, use it immediately.",
    "You are multimodal: you can hear audio inputs sent by the user. If you receive audio, answer it naturally.",
];

/// Builds the system prompt for each turn.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    identity: String,
}

impl PromptAssembler {
    pub fn new(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        Self {
            identity: if identity.trim().is_empty() {
                DEFAULT_IDENTITY.into()
            } else {
                identity
            },
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Identity, directives, then one `- name: description` line per tool.
    pub fn build(&self, tools: &[ToolSchema]) -> String {
        let mut lines: Vec<String> = Vec::with_capacity(DIRECTIVES.len() + tools.len() + 2);
        lines.push(self.identity.clone());
        lines.extend(DIRECTIVES.iter().map(|d| d.to_string()));

        if !tools.is_empty() {
            lines.push("\nAvailable tools:".into());
            for tool in tools {
                lines.push(format!("- {}: {}", tool.name, tool.description));
            }
        }

        lines.join("\n")
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_IDENTITY)
    }
}
