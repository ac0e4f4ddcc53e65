pub mod ask;
pub mod chat;
pub mod serve;
pub mod version;

use robert_config::{AppConfig, Secrets};
use std::path::Path;

/// Conversation key used by `chat` and `ask` unless `--session` is given.
pub const CLI_SESSION: &str = "cli-default";

/// Load the config file (with env overrides) and the environment secrets.
pub fn load(config_path: &Path) -> Result<(AppConfig, Secrets), Box<dyn std::error::Error>> {
    let config = AppConfig::load(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    Ok((config, Secrets::from_env()))
}
