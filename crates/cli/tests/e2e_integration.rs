//! End-to-end tests for the full AppForge pipeline.
//!
//! A TOML config points the OpenAI adapter at a local mock vendor; requests
//! then go through the gateway router, the agent service, the real HTTP
//! adapter, and the file tools.

use std::sync::{Arc, Mutex};

use appforge_config::AppConfig;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

// ── Mock vendor ──────────────────────────────────────────────────────────

#[derive(Clone)]
struct Vendor {
    replies: Arc<Mutex<Vec<Value>>>,
    seen: Arc<Mutex<Vec<Value>>>,
}

async fn chat(State(vendor): State<Vendor>, Json(body): Json<Value>) -> Json<Value> {
    vendor.seen.lock().unwrap().push(body);
    let mut replies = vendor.replies.lock().unwrap();
    let reply = if replies.is_empty() {
        completion(json!({"role": "assistant", "content": "Nothing left to do."}))
    } else {
        replies.remove(0)
    };
    Json(reply)
}

fn completion(message: Value) -> Value {
    json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o",
        "choices": [{"index": 0, "message": message, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 100, "completion_tokens": 20, "total_tokens": 120}
    })
}

fn tool_calls(calls: &[(&str, &str, Value)]) -> Value {
    let calls: Vec<Value> = calls
        .iter()
        .map(|(id, name, args)| {
            json!({
                "id": id,
                "type": "function",
                "function": {"name": name, "arguments": args.to_string()}
            })
        })
        .collect();
    completion(json!({"role": "assistant", "content": null, "tool_calls": calls}))
}

async fn spawn_vendor(replies: Vec<Value>) -> (String, Vendor) {
    let vendor = Vendor {
        replies: Arc::new(Mutex::new(replies)),
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/chat/completions", post(chat))
        .with_state(vendor.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), vendor)
}

fn load_config(base_url: &str, daily_limit: u32) -> AppConfig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        format!(
            r#"
default_provider = "openai"

[agent]
max_iterations = 5

[providers.openai]
api_key = "sk-e2e"
api_url = "{base_url}"
default_model = "gpt-4o-mini"

[usage]
daily_limit = {daily_limit}
"#
        ),
    )
    .unwrap();
    AppConfig::load_from(&path).unwrap()
}

fn gateway_app(config: &AppConfig) -> Router {
    appforge_gateway::build_router(
        appforge_agent::AgentService::from_config(config),
        config.gateway.max_body_bytes,
    )
}

fn post_agent(user: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/agent")
        .header("content-type", "application/json")
        .header("x-user-id", user)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn builds_an_app_through_the_gateway() {
    let (base_url, vendor) = spawn_vendor(vec![
        tool_calls(&[("call_1", "list_files", json!({}))]),
        tool_calls(&[
            ("call_2", "write_file", json!({"path": "server.js", "content": "const express = require('express');"})),
            ("call_3", "write_file", json!({"path": "public/index.html", "content": "<h1>Todos</h1>"})),
            ("call_4", "task_complete", json!({"summary": "Express todo app", "files_changed": "server.js, public/index.html"})),
        ]),
    ])
    .await;
    let config = load_config(&base_url, 10);
    let app = gateway_app(&config);

    let response = app
        .oneshot(post_agent("e2e-user", json!({"message": "Build a todo app"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["summary"], "Express todo app");
    assert_eq!(json["isFullstack"], true);
    assert_eq!(json["files"]["public/index.html"], "<h1>Todos</h1>");
    let types: Vec<&str> = json["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["type"].as_str().unwrap())
        .collect();
    assert_eq!(types.first(), Some(&"tool_call"));
    assert_eq!(types.last(), Some(&"complete"));

    let seen = vendor.seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0]["model"], "gpt-4o-mini");
    assert_eq!(seen[0]["messages"][0]["role"], "system");
    assert_eq!(seen[0]["tools"].as_array().unwrap().len(), 6);

    // The second request carries the first tool result with file context.
    let messages = seen[1]["messages"].as_array().unwrap();
    let tool_msg = messages.last().unwrap();
    assert_eq!(tool_msg["role"], "tool");
    assert_eq!(tool_msg["tool_call_id"], "call_1");
    assert!(tool_msg["content"].as_str().unwrap().ends_with("[No files yet]"));
}

#[tokio::test]
async fn quota_blocks_second_request() {
    let (base_url, vendor) = spawn_vendor(vec![]).await;
    let config = load_config(&base_url, 1);
    let app = gateway_app(&config);

    let first = app
        .clone()
        .oneshot(post_agent("limited", json!({"message": "Hello"})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(post_agent("limited", json!({"message": "Hello again"})))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(vendor.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn vendor_failure_ends_with_error_event() {
    let (base_url, _vendor) = spawn_vendor(vec![json!({"unexpected": true})]).await;
    let config = load_config(&base_url, 10);
    let app = gateway_app(&config);

    let response = app
        .oneshot(post_agent(
            "u",
            json!({"message": "Edit", "currentFiles": {"index.html": "<p>keep</p>"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    let events = json["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["type"], "error");
    assert_eq!(json["files"]["index.html"], "<p>keep</p>");
    assert!(json.get("summary").is_none());
}
