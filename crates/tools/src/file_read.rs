//! File read tool: read a workspace file as text.

use async_trait::async_trait;
use robert_core::error::ToolError;
use robert_core::tool::{Tool, ToolResult};
use robert_security::Workspace;
use tracing::debug;

use crate::str_arg;

pub struct FileReadTool {
    workspace: Workspace,
}

impl FileReadTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    async fn read(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let path = str_arg(arguments, "path")?;
        let resolved = self
            .workspace
            .resolve(path)
            .map_err(|_| ToolError::AccessDenied)?;

        debug!(path = %resolved.display(), "Reading file");

        tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                action: "Failed to read file".into(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the content of a file within the allowed workspace."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Relative path to file."
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        match self.read(&arguments).await {
            Ok(content) => ToolResult::ok(content),
            Err(e) => e.into(),
        }
    }
}
