// toolgate-mcp/tests/http_api.rs
// ============================================================================
// Module: HTTP API Tests
// Description: End-to-end tests for the REST catalog and invoke surface.
// Purpose: Exercise the bound server the way an HTTP client sees it.
// Dependencies: toolgate-backends, toolgate-config, toolgate-mcp, reqwest
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use serde_json::Value;
use serde_json::json;
use toolgate_backends::register_builtins;
use toolgate_config::load_str;
use toolgate_core::Registry;
use toolgate_mcp::McpServer;
use toolgate_mcp::ServerOptions;

const DOCUMENT: &str = r#"
sources:
  my-db:
    kind: sqlite
    database: ":memory:"
authServices:
  google:
    kind: api-key
    keys:
      - key: supersecret
        claims:
          email: alice@example.com
tools:
  sel1:
    kind: sqlite-sql
    source: my-db
    description: select one
    statement: SELECT 1
  secure-sel:
    kind: sqlite-sql
    source: my-db
    description: select one behind auth
    statement: SELECT 1
    authRequired:
      - google
toolsets:
  reporting:
    - sel1
"#;

/// Binds the server on an ephemeral port and returns its base URL.
async fn start_server() -> String {
    let mut registry = Registry::new();
    register_builtins(&mut registry);
    let gateway = load_str(DOCUMENT, &registry).await.unwrap();
    let server = McpServer::new(gateway, ServerOptions::default());
    let router = server.router();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{address}")
}

#[tokio::test]
async fn toolset_catalog_serves_the_human_manifest() {
    let base = start_server().await;
    let body: Value = reqwest::get(format!("{base}/api/toolset/reporting"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["serverVersion"].is_string());
    assert_eq!(body["tools"]["sel1"]["description"], json!("select one"));
    assert!(body["tools"].get("secure-sel").is_none());
}

#[tokio::test]
async fn default_toolset_catalog_lists_every_tool() {
    let base = start_server().await;
    let body: Value =
        reqwest::get(format!("{base}/api/toolset")).await.unwrap().json().await.unwrap();
    assert!(body["tools"].get("sel1").is_some());
    assert!(body["tools"].get("secure-sel").is_some());
}

#[tokio::test]
async fn unknown_toolset_is_not_found() {
    let base = start_server().await;
    let response = reqwest::get(format!("{base}/api/toolset/ghost")).await.unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn rest_invoke_returns_the_serialized_result() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/tool/sel1/invoke"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"result": "[{\"1\":1}]"}));
}

#[tokio::test]
async fn rest_invoke_honors_service_token_headers() {
    let base = start_server().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/tool/secure-sel/invoke"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .post(format!("{base}/api/tool/secure-sel/invoke"))
        .header("google_token", "supersecret")
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn rest_invoke_of_unknown_tool_is_not_found() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/api/tool/ghost/invoke"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    assert!(response.text().await.unwrap().contains("ghost"));
}

#[tokio::test]
async fn mcp_endpoint_serves_jsonrpc_over_http() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/mcp"))
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
}

#[tokio::test]
async fn mcp_toolset_scope_limits_tools_list() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base}/mcp/reporting"))
        .json(&json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let tools = body["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], json!("sel1"));
}
