//! Shell tool: run an allow-listed command inside the workspace.
//!
//! The command goes to the platform shell with the workspace root as working
//! directory. A run that exceeds the timeout is killed.

use async_trait::async_trait;
use robert_core::error::ToolError;
use robert_core::tool::{Tool, ToolResult};
use robert_security::{CommandAllowlist, CommandCheck, Workspace};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::str_arg;

/// Wall-clock limit for one command.
pub const SHELL_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ShellTool {
    workspace: Workspace,
    allowlist: CommandAllowlist,
    timeout: Duration,
}

impl ShellTool {
    pub fn new(workspace: Workspace, allowlist: CommandAllowlist) -> Self {
        Self {
            workspace,
            allowlist,
            timeout: SHELL_TIMEOUT,
        }
    }

    /// Override the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let command = str_arg(arguments, "command")?;

        match self.allowlist.check(command) {
            CommandCheck::Allowed { .. } => {}
            CommandCheck::Denied { program, allowed } => {
                warn!(program = %program, "Command rejected by allowlist");
                return Err(ToolError::CommandNotAllowed {
                    command: program,
                    allowed,
                });
            }
            CommandCheck::Operator { operator } => {
                warn!(command = %command, operator = %operator, "Command rejected for shell operator");
                return Err(ToolError::ShellOperator { operator });
            }
        }

        debug!(command = %command, "Executing shell command");

        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.current_dir(self.workspace.root()).kill_on_drop(true);

        let child = cmd.output();
        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::ExecutionFailed {
                    action: "Failed to execute command".into(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                warn!(command = %command, "Command timed out");
                return Err(ToolError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        if text.is_empty() {
            let code = output.status.code().unwrap_or(-1);
            Ok(format!("(Exit Code {code})"))
        } else {
            Ok(text)
        }
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "exec_shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command from the allowlist."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Command to run."
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        match self.run(&arguments).await {
            Ok(output) => ToolResult::ok(output),
            Err(e) => e.into(),
        }
    }
}
