//! Home Assistant tools: read and drive smart-home entities over the
//! Home Assistant REST API.
//!
//! Each tool performs exactly one request against `<base_url>/api/...` with a
//! long-lived bearer token. HTTP and connection failures come back as error
//! results the model can read.

use async_trait::async_trait;
use robert_core::error::ToolError;
use robert_core::tool::{Tool, ToolResult};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::str_arg;

/// Client timeout for Home Assistant requests.
pub const HOMEASSISTANT_TIMEOUT: Duration = Duration::from_secs(30);

/// Cap on lines returned by `ha_list_entities`.
pub const MAX_LISTED_ENTITIES: usize = 50;

/// Why a Home Assistant request failed.
#[derive(Debug)]
enum RequestError {
    Status { code: u16, body: String },
    Transport(String),
}

impl RequestError {
    fn into_tool_error(self, action: &str) -> ToolError {
        match self {
            Self::Status { code, body } => ToolError::ExecutionFailed {
                action: action.into(),
                reason: format!("HTTP {code}: {body}"),
            },
            Self::Transport(reason) => ToolError::Connection(reason),
        }
    }
}

/// Shared HTTP client for the Home Assistant tools.
pub struct HomeAssistantClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HomeAssistantClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(HOMEASSISTANT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    async fn get(&self, endpoint: &str) -> Result<Value, RequestError> {
        let url = format!("{}/api/{endpoint}", self.base_url);
        debug!(url = %url, "Home Assistant GET");
        let request = self.client.get(&url).bearer_auth(&self.token);
        Self::send(request).await
    }

    async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, RequestError> {
        let url = format!("{}/api/{endpoint}", self.base_url);
        debug!(url = %url, "Home Assistant POST");
        let request = self.client.post(&url).bearer_auth(&self.token).json(body);
        Self::send(request).await
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<Value, RequestError> {
        let response = request
            .send()
            .await
            .map_err(|e| RequestError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Home Assistant returned an error");
            return Err(RequestError::Status {
                code: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| RequestError::Transport(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct EntityState {
    entity_id: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    attributes: HashMap<String, Value>,
}

impl EntityState {
    fn friendly_name(&self) -> &str {
        self.attributes
            .get("friendly_name")
            .and_then(Value::as_str)
            .unwrap_or(&self.entity_id)
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: Value, action: &str) -> Result<T, ToolError> {
    serde_json::from_value(value).map_err(|e| ToolError::ExecutionFailed {
        action: action.into(),
        reason: format!("unexpected response: {e}"),
    })
}

/// Reads an argument that becomes a URL path segment. Home Assistant ids are
/// ASCII alphanumerics, `_`, `-` and `.`; anything else (separators, `..`,
/// query or fragment markers) is refused before a request is built.
fn segment_arg<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    let value = str_arg(arguments, key)?;
    let clean = !value.is_empty()
        && !value.contains("..")
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

    if clean {
        Ok(value)
    } else {
        warn!(key, value, "Rejected Home Assistant identifier");
        Err(ToolError::InvalidArguments(format!(
            "'{key}' must be a Home Assistant identifier such as light.kitchen"
        )))
    }
}

fn into_result(outcome: Result<String, ToolError>) -> ToolResult {
    match outcome {
        Ok(text) => ToolResult::ok(text),
        Err(e) => e.into(),
    }
}

// --- ha_get_state ---

pub struct GetStateTool {
    client: Arc<HomeAssistantClient>,
}

impl GetStateTool {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self { client }
    }

    async fn fetch(&self, arguments: &Value) -> Result<ToolResult, ToolError> {
        const ACTION: &str = "Failed to get state";
        let entity_id = segment_arg(arguments, "entity_id")?;

        let value = match self.client.get(&format!("states/{entity_id}")).await {
            Ok(v) => v,
            Err(RequestError::Status { code: 404, .. }) => {
                return Ok(ToolResult::error(format!("Entity '{entity_id}' not found.")));
            }
            Err(e) => return Err(e.into_tool_error(ACTION)),
        };

        let entity: EntityState = parse(value, ACTION)?;
        let attributes = serde_json::to_string(&entity.attributes).unwrap_or_default();
        Ok(ToolResult::ok(format!(
            "Entity '{}' ({}) is {}. Attributes: {attributes}",
            entity.friendly_name(),
            entity.entity_id,
            entity.state
        )))
    }
}

#[async_trait]
impl Tool for GetStateTool {
    fn name(&self) -> &str {
        "ha_get_state"
    }

    fn description(&self) -> &str {
        "Get the current state and attributes of a Home Assistant entity."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "entity_id": {
                    "type": "string",
                    "description": "The entity ID (e.g. light.living_room)."
                }
            },
            "required": ["entity_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        self.fetch(&arguments).await.unwrap_or_else(ToolResult::from)
    }
}

// --- ha_call_service ---

pub struct CallServiceTool {
    client: Arc<HomeAssistantClient>,
}

impl CallServiceTool {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self { client }
    }

    async fn call(&self, arguments: &Value) -> Result<String, ToolError> {
        let domain = segment_arg(arguments, "domain")?;
        let service = segment_arg(arguments, "service")?;
        let entity_id = str_arg(arguments, "entity_id")?;

        let body = serde_json::json!({ "entity_id": entity_id });
        self.client
            .post(&format!("services/{domain}/{service}"), &body)
            .await
            .map_err(|e| e.into_tool_error("Failed to call service"))?;

        Ok(format!("Service {domain}.{service} called for {entity_id}."))
    }
}

#[async_trait]
impl Tool for CallServiceTool {
    fn name(&self) -> &str {
        "ha_call_service"
    }

    fn description(&self) -> &str {
        "Call a service on a Home Assistant entity (e.g. turn_on, turn_off)."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "domain": {
                    "type": "string",
                    "description": "Service domain (e.g. light, switch)."
                },
                "service": {
                    "type": "string",
                    "description": "Service name (e.g. turn_on)."
                },
                "entity_id": {
                    "type": "string",
                    "description": "Target entity ID."
                }
            },
            "required": ["domain", "service", "entity_id"]
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        into_result(self.call(&arguments).await)
    }
}

// --- ha_list_entities ---

pub struct ListEntitiesTool {
    client: Arc<HomeAssistantClient>,
}

impl ListEntitiesTool {
    pub fn new(client: Arc<HomeAssistantClient>) -> Self {
        Self { client }
    }

    async fn list(&self, arguments: &Value) -> Result<String, ToolError> {
        const ACTION: &str = "Failed to list entities";
        let prefix = arguments
            .get("domain")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .map(|d| format!("{d}."));

        let value = self
            .client
            .get("states")
            .await
            .map_err(|e| e.into_tool_error(ACTION))?;
        let states: Vec<EntityState> = parse(value, ACTION)?;

        let lines: Vec<String> = states
            .iter()
            .filter(|s| prefix.as_ref().is_none_or(|p| s.entity_id.starts_with(p.as_str())))
            .take(MAX_LISTED_ENTITIES)
            .map(|s| format!("- {} ({}): {}", s.entity_id, s.friendly_name(), s.state))
            .collect();

        if lines.is_empty() {
            Ok("No entities found.".into())
        } else {
            Ok(lines.join("\n"))
        }
    }
}

#[async_trait]
impl Tool for ListEntitiesTool {
    fn name(&self) -> &str {
        "ha_list_entities"
    }

    fn description(&self) -> &str {
        "List available Home Assistant entities to discover device names."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "domain": {
                    "type": "string",
                    "description": "Optional domain filter (e.g. light)."
                }
            }
        })
    }

    async fn execute(&self, arguments: Value) -> ToolResult {
        into_result(self.list(&arguments).await)
    }
}

/// The three Home Assistant tools sharing one client.
pub fn tools(client: HomeAssistantClient) -> Vec<Box<dyn Tool>> {
    let client = Arc::new(client);
    vec![
        Box::new(GetStateTool::new(client.clone())),
        Box::new(CallServiceTool::new(client.clone())),
        Box::new(ListEntitiesTool::new(client)),
    ]
}
