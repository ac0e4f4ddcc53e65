//! OpenRouter provider: OpenAI-compatible chat completions.
//!
//! Supports:
//! - Chat completions with tool use / function calling
//! - Inline audio user messages (`data:audio/<fmt>;base64,<data>`), sent as
//!   `input_audio` content parts
//!
//! Nothing here fails outward. A missing key, an HTTP error status or a
//! transport problem becomes the reply text, and the agent loop carries on.

use async_trait::async_trait;
use robert_core::error::ProviderError;
use robert_core::message::{AUDIO_PREFIX, Message, MessageToolCall, Role};
use robert_core::provider::{ModelReply, Provider, ToolSchema};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default API root.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

/// Request timeout for one completion.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const REFERER: &str = "https://github.com/maker-norr/agent-robert";
const TITLE: &str = "Agent R.O.B.E.R.T.";
const AUDIO_CAPTION: &str = "This is an audio message from the user.";

/// An OpenRouter-backed model.
pub struct OpenRouterProvider {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl OpenRouterProvider {
    /// Create a provider for `model`. A missing key is reported on every
    /// call rather than here.
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            base_url: OPENROUTER_BASE_URL.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.into(),
            client,
        })
    }

    /// Point at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert our Message types to OpenAI API format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::System => "system",
                    Role::Tool => "tool",
                },
                content: Self::to_api_content(m),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(&m.tool_calls)
                },
                tool_call_id: m.tool_call_id.as_deref(),
            })
            .collect()
    }

    fn to_api_content(message: &Message) -> ApiContent {
        if message.role == Role::User && message.is_audio() {
            if let Some(audio) = parse_audio_uri(&message.content) {
                return ApiContent::Parts(vec![
                    ApiContentPart::InputAudio { input_audio: audio },
                    ApiContentPart::Text {
                        text: AUDIO_CAPTION.into(),
                    },
                ]);
            }
        }
        ApiContent::Text(message.content.clone())
    }

    /// Convert tool schemas to OpenAI API format.
    fn to_api_tools(tools: &[ToolSchema]) -> Vec<ApiToolDefinition<'_>> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function",
                function: t,
            })
            .collect()
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<ModelReply, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingCredential(API_KEY_VAR.into()))?;

        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(messages),
        });

        if !tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(tools));
        }

        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let Some(choice) = api_response.choices.into_iter().next() else {
            warn!("Provider returned no choices");
            return Ok(ModelReply::default());
        };

        Ok(ModelReply::with_tool_calls(
            choice.message.content.unwrap_or_default(),
            choice.message.tool_calls.unwrap_or_default(),
        ))
    }
}

/// The text a failed call reports back to the loop.
fn failure_text(err: &ProviderError) -> String {
    match err {
        ProviderError::MissingCredential(_) => format!("Error: {err}"),
        _ => err.to_string(),
    }
}

/// Split `data:audio/<fmt>;base64,<data>` into its format and payload.
fn parse_audio_uri(uri: &str) -> Option<ApiAudio> {
    let rest = uri.strip_prefix(AUDIO_PREFIX)?;
    let (header, data) = rest.split_once(',')?;

    let subtype = header
        .trim_start_matches('/')
        .split(';')
        .next()
        .unwrap_or_default();
    let format = match subtype {
        "" => "wav",
        "mpeg" => "mp3",
        other => other,
    };

    Some(ApiAudio {
        data: data.to_string(),
        format: format.to_string(),
    })
}

#[async_trait]
impl Provider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn chat(&self, messages: &[Message], tools: &[ToolSchema]) -> ModelReply {
        match self.complete(messages, tools).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Completion failed");
                ModelReply::text(failure_text(&e))
            }
        }
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: ApiContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<&'a Vec<MessageToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Parts(Vec<ApiContentPart>),
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentPart {
    InputAudio { input_audio: ApiAudio },
    Text { text: String },
}

#[derive(Debug, PartialEq, Serialize)]
struct ApiAudio {
    data: String,
    format: String,
}

#[derive(Debug, Serialize)]
struct ApiToolDefinition<'a> {
    r#type: &'static str,
    function: &'a ToolSchema,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<MessageToolCall>>,
}
