//! Composition root: turn configuration and secrets into one shared
//! [`AgentLoop`].

use crate::context::PromptAssembler;
use crate::loop_runner::AgentLoop;
use robert_config::{AppConfig, Secrets};
use robert_core::error::Error;
use robert_core::provider::Provider;
use robert_providers::{OpenRouterProvider, SUPPORTED_PROVIDERS};
use robert_security::Workspace;
use robert_session::SessionStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Build the agent described by `config`.
///
/// Creates the workspace and sessions directories if they are missing.
pub fn build(config: &AppConfig, secrets: &Secrets) -> Result<Arc<AgentLoop>, Error> {
    if !config.restrict_to_workspace {
        warn!("restrict_to_workspace = false is not supported; file tools stay confined");
    }

    std::fs::create_dir_all(&config.workspace).map_err(|e| Error::Config {
        message: format!(
            "Cannot create workspace {}: {e}",
            config.workspace.display()
        ),
    })?;
    let workspace = Workspace::new(&config.workspace).map_err(|e| Error::Config {
        message: e.to_string(),
    })?;

    let tools = robert_tools::build_registry(&workspace, config, secrets);
    let provider = build_provider(config, secrets)?;
    let sessions = SessionStore::new(&config.sessions_dir);

    info!(
        provider = %provider.name(),
        model = %config.model,
        workspace = %workspace.root().display(),
        sessions = %config.sessions_dir.display(),
        tools = tools.len(),
        "Agent ready"
    );

    let agent = AgentLoop::new(provider, Arc::new(tools), Arc::new(sessions))
        .with_prompt(PromptAssembler::new(config.identity.clone()))
        .with_max_iterations(config.max_iterations);

    Ok(Arc::new(agent))
}

fn build_provider(config: &AppConfig, secrets: &Secrets) -> Result<Arc<dyn Provider>, Error> {
    match config.provider.as_str() {
        "openrouter" => {
            if secrets.openrouter_api_key.is_none() {
                warn!("OPENROUTER_API_KEY is not set; every reply will report it");
            }
            let provider =
                OpenRouterProvider::new(secrets.openrouter_api_key.clone(), config.model.clone())
                    .map_err(|e| Error::Internal(e.to_string()))?;
            Ok(Arc::new(provider))
        }
        other => Err(Error::Config {
            message: format!(
                "Unknown provider '{other}'. Supported: {}",
                SUPPORTED_PROVIDERS.join(", ")
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &tempfile::TempDir) -> AppConfig {
        AppConfig {
            workspace: dir.path().join("ws"),
            sessions_dir: dir.path().join("sessions"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn builds_from_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let agent = build(&config(&dir), &Secrets::default()).unwrap();
        assert_eq!(agent.provider_name(), "openrouter");
        assert_eq!(agent.tools().names(), ["read_file"]);
        assert_eq!(agent.max_iterations(), 20);
        assert!(dir.path().join("ws").is_dir());
    }

    #[test]
    fn unknown_provider_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(&dir);
        cfg.provider = "carrier-pigeon".into();
        let err = build(&cfg, &Secrets::default()).err().unwrap();
        assert!(err.to_string().contains("carrier-pigeon"));
    }

    #[tokio::test]
    async fn missing_key_surfaces_as_reply() {
        let dir = tempfile::tempdir().unwrap();
        let agent = build(&config(&dir), &Secrets::default()).unwrap();
        let response = agent
            .process("hello", &robert_core::ConversationKey::from("k"))
            .await
            .unwrap();
        assert_eq!(response.content, "Error: Missing OPENROUTER_API_KEY");
        assert_eq!(response.iterations, 1);
    }
}
