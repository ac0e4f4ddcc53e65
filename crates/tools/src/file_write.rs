//! File write tool: create or overwrite a workspace file.

use async_trait::async_trait;
use robert_core::error::ToolError;
use robert_core::tool::{Tool, ToolResult};
use robert_security::Workspace;
use tracing::debug;

use crate::str_arg;

pub struct FileWriteTool {
    workspace: Workspace,
}

impl FileWriteTool {
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    async fn write(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let path = str_arg(arguments, "path")?;
        let content = str_arg(arguments, "content")?;
        let resolved = self
            .workspace
            .resolve(path)
            .map_err(|_| ToolError::AccessDenied)?;

        let failed = |e: std::io::Error| ToolError::ExecutionFailed {
            action: "Failed to write file".into(),
            reason: e.to_string(),
        };

        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(failed)?;
        }
        tokio::fs::write(&resolved, content).await.map_err(failed)?;

        debug!(path = %resolved.display(), bytes = content.len(), "Wrote file");
        Ok(format!("File '{path}' written successfully."))
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create or overwrite a file with specific content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Relative path to destination."
                },
                "content": {
                    "type": "string",
                    "description": "File content."
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        match self.write(&arguments).await {
            Ok(message) => ToolResult::ok(message),
            Err(e) => e.into(),
        }
    }
}
