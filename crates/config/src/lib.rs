//! Configuration loading and validation for Robert.
//!
//! Loads configuration from `config.json` (or a `.toml` file) with environment
//! variable overrides. A missing file is not an error: every setting has a
//! default, and every tool defaults to disabled.
//!
//! Credentials never live in the config file. They are read from the process
//! environment into [`Secrets`], which keeps shareable config free of tokens.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config name of the allow-listed shell capability.
pub const SHELL: &str = "shell";
/// Config name of the file write capability.
pub const FILE_WRITE: &str = "fileWrite";
/// Config name of the Home Assistant capabilities.
pub const HOME_ASSISTANT: &str = "homeassistant";

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// The root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model provider
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier passed to the provider
    #[serde(default = "default_model")]
    pub model: String,

    /// Keep file tools inside the workspace (always enforced; kept for
    /// compatibility with existing config files)
    #[serde(default = "default_true", alias = "restrictToWorkspace")]
    pub restrict_to_workspace: bool,

    /// Workspace root for file and shell tools
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Directory holding one `.jsonl` log per conversation
    #[serde(default = "default_sessions_dir", alias = "sessionsDir")]
    pub sessions_dir: PathBuf,

    /// Maximum model round-trips per turn
    #[serde(default = "default_max_iterations", alias = "maxIterations")]
    pub max_iterations: u32,

    /// Identity line at the top of the system prompt
    #[serde(default = "default_identity")]
    pub identity: String,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Per-capability switches, keyed by config name
    #[serde(default = "default_tools", deserialize_with = "merge_tool_defaults")]
    pub tools: HashMap<String, ToolConfig>,
}

fn default_provider() -> String {
    "openrouter".into()
}
fn default_model() -> String {
    "google/gemini-2.0-flash-001".into()
}
fn default_true() -> bool {
    true
}
fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}
fn default_sessions_dir() -> PathBuf {
    PathBuf::from("sessions")
}
fn default_max_iterations() -> u32 {
    20
}
fn default_identity() -> String {
    "You are Agent R.O.B.E.R.T.".into()
}

/// Switch and allowlist for one capability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub allowlist: Vec<String>,
}

impl ToolConfig {
    pub fn enabled_with(allowlist: &[&str]) -> Self {
        Self {
            enabled: true,
            allowlist: allowlist.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn default_tools() -> HashMap<String, ToolConfig> {
    ["shell", "fileWrite", "spawn", "cron", "mcp", "homeassistant"]
        .into_iter()
        .map(|name| (name.to_string(), ToolConfig::default()))
        .collect()
}

/// Either a usable tool entry or something we skip.
#[derive(Deserialize)]
#[serde(untagged)]
enum ToolEntry {
    Config(ToolConfig),
    Ignored(serde::de::IgnoredAny),
}

/// File entries override the defaults per name; entries that are not objects
/// are ignored.
fn merge_tool_defaults<'de, D>(deserializer: D) -> Result<HashMap<String, ToolConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, ToolEntry> = HashMap::deserialize(deserializer)?;
    let mut tools = default_tools();
    for (name, entry) in raw {
        match entry {
            ToolEntry::Config(cfg) => {
                tools.insert(name, cfg);
            }
            ToolEntry::Ignored(_) => {
                tracing::warn!(tool = %name, "Ignoring malformed tool config entry");
            }
        }
    }
    Ok(tools)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Browser origins allowed to call the gateway (CORS). Empty allows any
    /// origin; `/agent` is still guarded by the bearer keys.
    #[serde(default, alias = "allowedOrigins")]
    pub allowed_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8787
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, then apply environment overrides:
    /// - `ROBERT_PROVIDER`
    /// - `ROBERT_MODEL`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        if let Ok(provider) = std::env::var("ROBERT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("ROBERT_MODEL") {
            config.model = model;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// `.toml` files are parsed as TOML, anything else as JSON.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        let config: Self = if is_toml {
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// The switch for one capability; absent names are disabled.
    pub fn tool(&self, name: &str) -> ToolConfig {
        self.tools.get(name).cloned().unwrap_or_default()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            restrict_to_workspace: true,
            workspace: default_workspace(),
            sessions_dir: default_sessions_dir(),
            max_iterations: default_max_iterations(),
            identity: default_identity(),
            gateway: GatewayConfig::default(),
            tools: default_tools(),
        }
    }
}

/// Credentials taken from the process environment.
#[derive(Clone, Default)]
pub struct Secrets {
    /// `OPENROUTER_API_KEY`
    pub openrouter_api_key: Option<String>,
    /// `HOMEASSISTANT_URL`
    pub homeassistant_url: Option<String>,
    /// `HOMEASSISTANT_TOKEN`
    pub homeassistant_token: Option<String>,
    /// `ROBERT_API_KEYS`, comma-separated bearer keys for the gateway
    pub gateway_api_keys: Vec<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            openrouter_api_key: non_empty_env("OPENROUTER_API_KEY"),
            homeassistant_url: non_empty_env("HOMEASSISTANT_URL"),
            homeassistant_token: non_empty_env("HOMEASSISTANT_TOKEN"),
            gateway_api_keys: non_empty_env("ROBERT_API_KEYS")
                .map(|keys| parse_key_list(&keys))
                .unwrap_or_default(),
        }
    }

    /// Home Assistant URL and token, only when both are present.
    pub fn homeassistant(&self) -> Option<(&str, &str)> {
        match (&self.homeassistant_url, &self.homeassistant_token) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => {
                Some((url.as_str(), token.as_str()))
            }
            _ => None,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("openrouter_api_key", &redact(&self.openrouter_api_key))
            .field("homeassistant_url", &self.homeassistant_url)
            .field("homeassistant_token", &redact(&self.homeassistant_token))
            .field("gateway_api_keys", &self.gateway_api_keys.len())
            .finish()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
