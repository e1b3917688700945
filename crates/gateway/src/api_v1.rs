//! The `/v1` API: agent runs, usage, and tool listing.
//!
//! Caller identity arrives in the `x-user-id` header, set by whatever
//! authenticates requests in front of the gateway.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use appforge_agent::{AgentError, AgentRequest, AgentResponse, AgentService};
use appforge_core::error::ProviderError;
use appforge_core::usage::UsageSnapshot;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub service: AgentService,
}

pub type SharedApiState = Arc<ApiV1State>;

/// Build the v1 API router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/agent", post(agent_handler))
        .route("/usage", get(usage_handler))
        .route("/tools", get(list_tools_handler))
        .with_state(state)
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolDto {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDto>,
    pub count: usize,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn user_id(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing x-user-id header"))
}

fn agent_error(e: AgentError) -> ApiError {
    match e {
        AgentError::InvalidRequest(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
        AgentError::QuotaExceeded(q) => api_error(StatusCode::TOO_MANY_REQUESTS, q.to_string()),
        AgentError::Provider(ProviderError::NotConfigured(msg)) => {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, msg)
        }
        AgentError::Provider(other) => api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn agent_handler(
    State(state): State<SharedApiState>,
    headers: HeaderMap,
    Json(payload): Json<AgentRequest>,
) -> Result<Json<AgentResponse>, ApiError> {
    let user = user_id(&headers)?;
    info!(
        user_id = %user,
        files = payload.current_files.len(),
        provider = payload.provider.as_deref().unwrap_or("default"),
        "v1/agent request"
    );

    match state.service.handle(&user, payload).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            if matches!(e, AgentError::Provider(_)) {
                error!(user_id = %user, error = %e, "Agent request failed");
            }
            Err(agent_error(e))
        }
    }
}

async fn usage_handler(
    State(state): State<SharedApiState>,
    headers: HeaderMap,
) -> Result<Json<UsageSnapshot>, ApiError> {
    let user = user_id(&headers)?;
    state
        .service
        .usage(&user)
        .await
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Usage tracking is disabled"))
}

async fn list_tools_handler(State(state): State<SharedApiState>) -> Json<ToolListResponse> {
    let defs = state.service.tool_definitions();
    let count = defs.len();

    Json(ToolListResponse {
        tools: defs
            .into_iter()
            .map(|d| ToolDto {
                name: d.name,
                description: d.description,
                parameters: d.parameters,
            })
            .collect(),
        count,
    })
}
