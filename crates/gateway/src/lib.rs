//! HTTP gateway for Robert.
//!
//! Exposes the agent to remote clients (smart-home bridge, web chat):
//!
//! - `POST /agent` `{message, session_key?}` → `{content, iterations}`
//! - `GET /health`
//!
//! Built on Axum. When API keys are configured, `/agent` requires
//! `Authorization: Bearer <key>`. CORS is enabled so the browser chat client
//! can call the gateway from its own origin.

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::{self, Next},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

use robert_agent::AgentLoop;
use robert_core::agent::AgentResponse;
use robert_core::message::ConversationKey;

/// Request body limit; audio payloads arrive inline as base64.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<AgentLoop>,
    /// Accepted bearer keys. Empty means no authentication.
    pub api_keys: Vec<String>,
    /// Browser origins allowed by CORS. Empty allows any origin.
    pub allowed_origins: Vec<String>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let agent_routes = Router::new()
        .route("/agent", post(agent_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.allowed_origins);

    Router::new()
        .route("/health", get(health_handler))
        .merge(agent_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the browser chat client: `GET`/`POST` with a JSON body and a
/// bearer key.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
pub async fn start(
    agent: Arc<AgentLoop>,
    host: &str,
    port: u16,
    api_keys: Vec<String>,
    allowed_origins: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{host}:{port}");

    if api_keys.is_empty() {
        warn!("ROBERT_API_KEYS not set; /agent accepts unauthenticated requests");
    }

    let app = build_router(Arc::new(GatewayState {
        agent,
        api_keys,
        allowed_origins,
    }));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct AgentRequest {
    message: String,
    #[serde(default)]
    session_key: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

async fn agent_handler(
    State(state): State<SharedState>,
    Json(payload): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, (StatusCode, Json<ErrorResponse>)> {
    let key = payload
        .session_key
        .filter(|k| !k.trim().is_empty())
        .map(ConversationKey::from)
        .unwrap_or_default();

    info!(
        key = %key,
        message_len = payload.message.len(),
        "Agent request received"
    );

    match state.agent.process(&payload.message, &key).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!(key = %key, error = %e, "Agent processing failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Bearer-key check for `/agent`. A gateway with no keys lets everyone in.
async fn auth_middleware(
    State(state): State<SharedState>,
    req: axum::extract::Request,
    next: Next,
) -> Result<axum::response::Response, StatusCode> {
    if state.api_keys.is_empty() {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match auth_header {
        Some(key) if state.api_keys.iter().any(|k| k == key) => Ok(next.run(req).await),
        _ => {
            warn!("Unauthorized request to /agent: missing or invalid bearer key");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use robert_core::message::Message;
    use robert_core::provider::{ModelReply, Provider, ToolSchema};
    use robert_core::tool::ToolRegistry;
    use robert_session::SessionStore;
    use tower::ServiceExt;

    /// Answers with the last message it was sent.
    struct EchoProvider;

    #[async_trait::async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn chat(&self, messages: &[Message], _tools: &[ToolSchema]) -> ModelReply {
            let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            ModelReply::text(format!("echo: {last}"))
        }
    }

    fn test_state(dir: &tempfile::TempDir, api_keys: &[&str]) -> SharedState {
        test_state_with_origins(dir, api_keys, &[])
    }

    fn test_state_with_origins(
        dir: &tempfile::TempDir,
        api_keys: &[&str],
        origins: &[&str],
    ) -> SharedState {
        let agent = AgentLoop::new(
            Arc::new(EchoProvider),
            Arc::new(ToolRegistry::new()),
            Arc::new(SessionStore::new(dir.path())),
        );
        Arc::new(GatewayState {
            agent: Arc::new(agent),
            api_keys: api_keys.iter().map(|k| k.to_string()).collect(),
            allowed_origins: origins.iter().map(|o| o.to_string()).collect(),
        })
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method("OPTIONS")
            .uri("/agent")
            .header("Origin", origin)
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "authorization,content-type")
            .body(Body::empty())
            .unwrap()
    }

    fn post_agent(body: serde_json::Value, bearer: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/agent")
            .header("Content-Type", "application/json");
        if let Some(key) = bearer {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir, &["secret"]));

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn agent_turn_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir, &[]));

        let response = app
            .oneshot(post_agent(
                serde_json::json!({"message": "turn on the lights", "session_key": "ha-bridge"}),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["content"], "echo: turn on the lights");
        assert_eq!(body["iterations"], 1);
        assert!(dir.path().join("ha-bridge.jsonl").exists());
    }

    #[tokio::test]
    async fn missing_session_key_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir, &[]));

        let response = app
            .oneshot(post_agent(serde_json::json!({"message": "hi"}), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(dir.path().join("default.jsonl").exists());
    }

    #[tokio::test]
    async fn auth_required_when_keys_configured() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir, &["k1", "k2"]);

        let missing = build_router(state.clone())
            .oneshot(post_agent(serde_json::json!({"message": "hi"}), None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

        let wrong = build_router(state.clone())
            .oneshot(post_agent(serde_json::json!({"message": "hi"}), Some("nope")))
            .await
            .unwrap();
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

        let right = build_router(state)
            .oneshot(post_agent(serde_json::json!({"message": "hi"}), Some("k2")))
            .await
            .unwrap();
        assert_eq!(right.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_message_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir, &[]));

        let response = app
            .oneshot(post_agent(serde_json::json!({"session_key": "x"}), None))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir, &[]));

        let audio = format!("data:audio/wav;base64,{}", "A".repeat(MAX_BODY_BYTES));
        let response = app
            .oneshot(post_agent(serde_json::json!({"message": audio}), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn log_failure_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let agent = AgentLoop::new(
            Arc::new(EchoProvider),
            Arc::new(ToolRegistry::new()),
            Arc::new(SessionStore::new(&blocker)),
        );
        let app = build_router(Arc::new(GatewayState {
            agent: Arc::new(agent),
            api_keys: Vec::new(),
            allowed_origins: Vec::new(),
        }));

        let response = app
            .oneshot(post_agent(serde_json::json!({"message": "hi"}), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn browser_preflight_passes_without_a_key() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir, &["rk-robot-1"]));

        let response = app.oneshot(preflight("http://localhost:5500")).await.unwrap();
        assert!(response.status().is_success());

        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        let allowed_headers = headers["access-control-allow-headers"].to_str().unwrap();
        assert!(allowed_headers.contains("authorization"));
        assert!(allowed_headers.contains("content-type"));
        assert!(
            headers["access-control-allow-methods"]
                .to_str()
                .unwrap()
                .contains("POST")
        );
    }

    #[tokio::test]
    async fn configured_origins_are_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state_with_origins(&dir, &[], &["http://localhost:5500"]);

        let allowed = build_router(state.clone())
            .oneshot(preflight("http://localhost:5500"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()["access-control-allow-origin"],
            "http://localhost:5500"
        );

        let other = build_router(state)
            .oneshot(preflight("http://evil.example"))
            .await
            .unwrap();
        assert!(other.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn agent_reply_carries_cors_header() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(&dir, &[]));

        let mut request = post_agent(serde_json::json!({"message": "hi"}), None);
        request
            .headers_mut()
            .insert("Origin", HeaderValue::from_static("http://localhost:5500"));
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}
