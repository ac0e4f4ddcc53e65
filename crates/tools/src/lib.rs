//! Built-in tool implementations for Robert.
//!
//! Tools give the agent its hands: read and write files inside the workspace,
//! run allow-listed shell commands, and drive Home Assistant entities.
//!
//! Everything except `read_file` is off until the configuration enables it.

pub mod file_read;
pub mod file_write;
pub mod homeassistant;
pub mod shell;

use robert_config::{AppConfig, FILE_WRITE, HOME_ASSISTANT, SHELL, Secrets};
use robert_core::error::ToolError;
use robert_core::tool::ToolRegistry;
use robert_security::{CommandAllowlist, Workspace};
use tracing::{info, warn};

pub use file_read::FileReadTool;
pub use file_write::FileWriteTool;
pub use homeassistant::HomeAssistantClient;
pub use shell::ShellTool;

/// Build the registry for this installation.
///
/// | Config key      | Tools                                                 |
/// |-----------------|-------------------------------------------------------|
/// | (always)        | `read_file`                                           |
/// | `fileWrite`     | `write_file`                                          |
/// | `shell`         | `exec_shell` with the configured allowlist            |
/// | `homeassistant` | `ha_get_state`, `ha_call_service`, `ha_list_entities` |
///
/// Home Assistant additionally needs `HOMEASSISTANT_URL` and
/// `HOMEASSISTANT_TOKEN`; without them the tools are left out.
pub fn build_registry(workspace: &Workspace, config: &AppConfig, secrets: &Secrets) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    registry.register(Box::new(FileReadTool::new(workspace.clone())));

    if config.tool(FILE_WRITE).enabled {
        registry.register(Box::new(FileWriteTool::new(workspace.clone())));
    }

    let shell = config.tool(SHELL);
    if shell.enabled {
        let allowlist = CommandAllowlist::new(shell.allowlist);
        if allowlist.entries().is_empty() {
            warn!("Shell tool enabled with an empty allowlist; every command will be rejected");
        }
        registry.register(Box::new(ShellTool::new(workspace.clone(), allowlist)));
    }

    if config.tool(HOME_ASSISTANT).enabled {
        match secrets.homeassistant() {
            Some((url, token)) => match HomeAssistantClient::new(url, token) {
                Ok(client) => {
                    for tool in homeassistant::tools(client) {
                        registry.register(tool);
                    }
                }
                Err(e) => warn!(error = %e, "Home Assistant client unavailable, tools omitted"),
            },
            None => info!("Home Assistant enabled but URL/token not set, tools omitted"),
        }
    }

    info!(tools = ?registry.names(), "Tool registry ready");
    registry
}

/// Pull a required string argument out of a tool call.
pub(crate) fn str_arg<'a>(arguments: &'a serde_json::Value, key: &str) -> Result<&'a str, ToolError> {
    arguments[key]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments(format!("Missing '{key}' argument")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use robert_config::ToolConfig;

    fn secrets(ha: bool) -> Secrets {
        Secrets {
            homeassistant_url: ha.then(|| "http://ha.local:8123".to_string()),
            homeassistant_token: ha.then(|| "token".to_string()),
            ..Secrets::default()
        }
    }

    fn names(registry: &ToolRegistry) -> Vec<String> {
        registry.schemas().into_iter().map(|s| s.name).collect()
    }

    #[test]
    fn default_config_registers_only_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let registry = build_registry(&ws, &AppConfig::default(), &secrets(true));
        assert_eq!(names(&registry), ["read_file"]);
    }

    #[test]
    fn enabled_tools_follow_registration_order() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let mut config = AppConfig::default();
        config.tools.insert(SHELL.into(), ToolConfig::enabled_with(&["ls"]));
        config.tools.insert(FILE_WRITE.into(), ToolConfig::enabled_with(&[]));
        config.tools.insert(HOME_ASSISTANT.into(), ToolConfig::enabled_with(&[]));

        let registry = build_registry(&ws, &config, &secrets(true));
        assert_eq!(
            names(&registry),
            [
                "read_file",
                "write_file",
                "exec_shell",
                "ha_get_state",
                "ha_call_service",
                "ha_list_entities"
            ]
        );
    }

    #[test]
    fn homeassistant_needs_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let mut config = AppConfig::default();
        config.tools.insert(HOME_ASSISTANT.into(), ToolConfig::enabled_with(&[]));

        let registry = build_registry(&ws, &config, &secrets(false));
        assert_eq!(names(&registry), ["read_file"]);
    }

    #[tokio::test]
    async fn disabled_tool_is_not_callable() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let registry = build_registry(&ws, &AppConfig::default(), &secrets(false));

        let result = registry
            .call("exec_shell", serde_json::json!({"command": "ls"}))
            .await;
        assert!(result.is_error);
        assert_eq!(result.content, "Error: Tool 'exec_shell' not found or disabled.");
    }

    #[test]
    fn str_arg_reports_missing_key() {
        let err = str_arg(&serde_json::json!({"a": 1}), "a").unwrap_err();
        assert_eq!(err.to_string(), "Invalid tool arguments: Missing 'a' argument");
    }
}
