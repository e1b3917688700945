//! HTTP API gateway for AppForge.
//!
//! Exposes a health check and the v1 API: run the agent over an inline file
//! set, read today's usage, and list the tools offered to the model.
//!
//! Built on Axum.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::{Router, http::HeaderName, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use appforge_agent::AgentService;

/// Build the full router.
///
/// Layers applied:
/// - CORS for browser clients (GET/POST, JSON and `x-user-id` headers)
/// - Request body size limit (`gateway.max_body_bytes`; bodies carry the
///   whole project inline)
/// - HTTP trace logging
pub fn build_router(service: AgentService, max_body_bytes: usize) -> Router {
    let api_state = Arc::new(api_v1::ApiV1State { service });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(api_v1::USER_ID_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(api_state))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: appforge_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let service = AgentService::from_config(&config);
    let configured = service.router().list();
    if configured.is_empty() {
        tracing::warn!("No provider API keys configured; /v1/agent will return 500");
    }

    let app = build_router(service, config.gateway.max_body_bytes);

    info!(
        addr = %addr,
        max_body_bytes = config.gateway.max_body_bytes,
        providers = ?configured.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
        "Gateway starting"
    );
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

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app_with_limit(max_body_bytes: usize) -> Router {
        build_router(
            AgentService::from_config(&appforge_config::AppConfig::default()),
            max_body_bytes,
        )
    }

    fn app() -> Router {
        app_with_limit(appforge_config::GatewayConfig::default().max_body_bytes)
    }

    fn agent_request(file_bytes: usize) -> Request<Body> {
        let body = serde_json::json!({"message": "Build", "currentFiles": {"big.txt": "x".repeat(file_bytes)}});
        Request::builder()
            .method("POST")
            .uri("/v1/agent")
            .header("content-type", "application/json")
            .header(api_v1::USER_ID_HEADER, "u1")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let response = app_with_limit(4096).oneshot(agent_request(8192)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn default_limit_accepts_multi_megabyte_projects() {
        // The body fits; the agent then fails for lack of a provider key.
        let response = app().oneshot(agent_request(3 * 1024 * 1024)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn tools_are_nested_under_v1() {
        let req = Request::builder().uri("/v1/tools").body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
