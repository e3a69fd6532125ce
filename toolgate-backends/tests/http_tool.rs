// toolgate-backends/tests/http_tool.rs
// ============================================================================
// Module: HTTP Tool Tests
// Description: Tests for the http source and tool against a local stub.
// Purpose: Exercise query mapping, client OAuth, and upstream-auth errors.
// Dependencies: toolgate-backends, toolgate-core, tiny_http, tokio
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use toolgate_backends::sources::http as http_source;
use toolgate_backends::tools::http as http_tool;
use toolgate_core::AccessToken;
use toolgate_core::ClaimsMap;
use toolgate_core::InvokeError;
use toolgate_core::Source;
use toolgate_core::Tool;

/// Starts a stub API on a random loopback port and returns its base URL.
fn start_stub() -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    thread::spawn(move || {
        for request in server.incoming_requests() {
            let url = request.url().to_string();
            let authorized = request
                .headers()
                .iter()
                .any(|h| h.field.equiv("Authorization") && h.value == "Bearer goodtoken");
            let json_header =
                Header::from_bytes("Content-Type", "application/json").unwrap();
            if url.starts_with("/secure") {
                if authorized {
                    let response = Response::from_string(r#"{"user":"alice"}"#)
                        .with_header(json_header);
                    let _ = request.respond(response);
                } else {
                    let _ = request.respond(
                        Response::from_string("bad credentials").with_status_code(401),
                    );
                }
            } else if url.starts_with("/rows") {
                let response =
                    Response::from_string(r#"[{"id":1},{"id":2}]"#).with_header(json_header);
                let _ = request.respond(response);
            } else if url.starts_with("/echo") {
                let query = url.splitn(2, '?').nth(1).unwrap_or_default().to_string();
                let response = Response::from_string(json!({ "query": query }).to_string())
                    .with_header(json_header);
                let _ = request.respond(response);
            } else {
                let _ = request.respond(Response::from_string("not found").with_status_code(404));
            }
        }
    });
    format!("http://127.0.0.1:{port}")
}

async fn source(base_url: &str, use_client_o_auth: bool) -> BTreeMap<String, Arc<dyn Source>> {
    let yaml = format!(
        "kind: http\nbaseUrl: {base_url}\nuseClientOAuth: {use_client_o_auth}"
    );
    let entry: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    let config = http_source::configure("api", &entry).unwrap();
    let source = config.initialize().await.unwrap();
    let mut sources = BTreeMap::new();
    sources.insert("api".to_string(), source);
    sources
}

fn tool(sources: &BTreeMap<String, Arc<dyn Source>>, yaml: &str) -> Arc<dyn Tool> {
    let entry: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    let config = http_tool::configure("api-tool", &entry).unwrap();
    config.initialize(sources).unwrap()
}

async fn run(
    tool: &Arc<dyn Tool>,
    arguments: Value,
    token: AccessToken,
) -> Result<Value, InvokeError> {
    let Value::Object(data) = arguments else {
        panic!("arguments must be an object");
    };
    let params = tool.parse_params(&data, &ClaimsMap::new()).unwrap();
    tool.invoke(params, token).await
}

#[tokio::test]
async fn json_array_responses_pass_through() {
    let base = start_stub();
    let sources = source(&base, false).await;
    let tool = tool(
        &sources,
        "kind: http\nsource: api\ndescription: list rows\npath: /rows",
    );
    let result = run(&tool, json!({}), AccessToken::default()).await.unwrap();
    assert_eq!(result, json!([{"id": 1}, {"id": 2}]));
}

#[tokio::test]
async fn bind_parameters_travel_as_query_parameters() {
    let base = start_stub();
    let sources = source(&base, false).await;
    let tool = tool(
        &sources,
        r"
        kind: http
        source: api
        description: echo the query
        path: /echo
        parameters:
          - name: id
            type: integer
            description: row id
        ",
    );
    let result = run(&tool, json!({"id": 7}), AccessToken::default()).await.unwrap();
    assert_eq!(result, json!({"query": "id=7"}));
}

#[tokio::test]
async fn client_oauth_requires_an_access_token() {
    let base = start_stub();
    let sources = source(&base, true).await;
    let tool = tool(
        &sources,
        "kind: http\nsource: api\ndescription: secure call\npath: /secure",
    );
    assert!(tool.requires_client_authorization());

    let err = run(&tool, json!({}), AccessToken::default()).await.unwrap_err();
    assert!(matches!(err, InvokeError::Unauthorized(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn client_token_is_forwarded_upstream() {
    let base = start_stub();
    let sources = source(&base, true).await;
    let tool = tool(
        &sources,
        "kind: http\nsource: api\ndescription: secure call\npath: /secure",
    );
    let result =
        run(&tool, json!({}), AccessToken::new("Bearer goodtoken")).await.unwrap();
    assert_eq!(result, json!({"user": "alice"}));
}

#[tokio::test]
async fn upstream_401_is_a_typed_upstream_auth_error() {
    let base = start_stub();
    let sources = source(&base, true).await;
    let tool = tool(
        &sources,
        "kind: http\nsource: api\ndescription: secure call\npath: /secure",
    );
    let err = run(&tool, json!({}), AccessToken::new("Bearer wrong")).await.unwrap_err();
    assert!(err.is_upstream_auth(), "unexpected error: {err}");
    assert!(matches!(err, InvokeError::UpstreamAuth { status: 401, .. }));
}

#[tokio::test]
async fn other_upstream_failures_are_plain_invocation_errors() {
    let base = start_stub();
    let sources = source(&base, false).await;
    let tool = tool(
        &sources,
        "kind: http\nsource: api\ndescription: missing path\npath: /missing",
    );
    let err = run(&tool, json!({}), AccessToken::default()).await.unwrap_err();
    assert!(matches!(err, InvokeError::Failed(_)), "unexpected error: {err}");
    assert!(!err.is_upstream_auth());
}
