// toolgate-mcp/src/method.rs
// ============================================================================
// Module: JSON-RPC Methods
// Description: Agent-dialect method handlers over the shared pipeline.
// Purpose: Decode requests, dispatch methods, and shape result envelopes.
// Dependencies: toolgate-core, http, serde, serde_json
// ============================================================================

//! ## Overview
//! Five methods are served: `initialize`, `notifications/initialized`,
//! `ping`, `tools/list`, and `tools/call`. Everything else is
//! `METHOD_NOT_FOUND`. A `tools/call` failure splits two ways: protocol,
//! argument, and auth problems surface as JSON-RPC errors, while backend
//! failures ride a successful envelope with `isError: true` so the calling
//! model can read the message and adapt.

// ============================================================================
// SECTION: Imports
// ============================================================================

use http::HeaderMap;
use http::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use toolgate_core::McpManifest;

use crate::jsonrpc;
use crate::jsonrpc::JsonRpcRequest;
use crate::jsonrpc::JsonRpcResponse;
use crate::pipeline::CallError;
use crate::pipeline::ServerState;
use crate::pipeline::invoke_tool;

/// Protocol revision implemented by the server.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// Server name reported by `initialize`.
const SERVER_NAME: &str = "toolgate";

// ============================================================================
// SECTION: Method Payloads
// ============================================================================

/// `tools/list` parameters; strict so unknown fields are rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ListToolsParams {
    /// Pagination cursor; the whole set is returned in one page.
    #[serde(default)]
    #[allow(dead_code, reason = "accepted for wire compatibility, pagination is not needed")]
    cursor: Option<String>,
}

/// `tools/call` parameters.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw JSON arguments.
    #[serde(default)]
    arguments: Map<String, Value>,
}

/// One text chunk in a `tools/call` result.
#[derive(Debug, Serialize)]
struct TextContent {
    /// Always `"text"`.
    #[serde(rename = "type")]
    content_type: &'static str,
    /// Serialized payload.
    text: String,
}

/// `tools/call` result envelope.
#[derive(Debug, Serialize)]
struct CallToolResult {
    /// Result chunks.
    content: Vec<TextContent>,
    /// Present and true when the tool itself failed.
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    is_error: bool,
}

/// `tools/list` result envelope.
#[derive(Debug, Serialize)]
struct ListToolsResult<'a> {
    /// Toolset manifests.
    tools: &'a [McpManifest],
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Decodes one JSON-RPC message and dispatches its method.
///
/// Returns `None` for notifications, which receive no response. `headers`
/// is `None` on the stdio transport.
pub async fn handle_message(
    state: &ServerState,
    toolset_name: &str,
    headers: Option<&HeaderMap>,
    body: &[u8],
) -> Option<(StatusCode, JsonRpcResponse)> {
    let request: JsonRpcRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => {
            return Some((
                StatusCode::BAD_REQUEST,
                JsonRpcResponse::error(
                    Value::Null,
                    jsonrpc::INVALID_REQUEST,
                    "invalid json-rpc request",
                ),
            ));
        }
    };
    if request.jsonrpc != jsonrpc::JSONRPC_VERSION {
        let id = request.id.unwrap_or(Value::Null);
        return Some((
            StatusCode::BAD_REQUEST,
            JsonRpcResponse::error(id, jsonrpc::INVALID_REQUEST, "invalid json-rpc version"),
        ));
    }

    if request.method == "notifications/initialized" {
        return None;
    }

    let id = request.id.clone().unwrap_or(Value::Null);
    let response = match request.method.as_str() {
        "initialize" => initialize_handler(id),
        "ping" => (StatusCode::OK, JsonRpcResponse::result(id, json!({}))),
        "tools/list" => tools_list_handler(state, toolset_name, id, request.params),
        "tools/call" => tools_call_handler(state, headers, id, request.params).await,
        other => (
            StatusCode::NOT_FOUND,
            JsonRpcResponse::error(
                id,
                jsonrpc::METHOD_NOT_FOUND,
                format!("invalid method {other}"),
            ),
        ),
    };
    Some(response)
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Answers the protocol handshake with server identity and capabilities.
fn initialize_handler(id: Value) -> (StatusCode, JsonRpcResponse) {
    let result = json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": { "listChanged": false } },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    });
    (StatusCode::OK, JsonRpcResponse::result(id, result))
}

/// Serves the named toolset's precomputed manifest array.
fn tools_list_handler(
    state: &ServerState,
    toolset_name: &str,
    id: Value,
    params: Option<Value>,
) -> (StatusCode, JsonRpcResponse) {
    if let Some(params) = params {
        if serde_json::from_value::<ListToolsParams>(params).is_err() {
            return (
                StatusCode::BAD_REQUEST,
                JsonRpcResponse::error(
                    id,
                    jsonrpc::INVALID_REQUEST,
                    "invalid tools list request",
                ),
            );
        }
    }
    let Some(toolset) = state.toolset(toolset_name) else {
        return (
            StatusCode::NOT_FOUND,
            JsonRpcResponse::error(
                id,
                jsonrpc::INVALID_PARAMS,
                format!("toolset {toolset_name:?} does not exist"),
            ),
        );
    };
    let result = match serde_json::to_value(ListToolsResult {
        tools: &toolset.mcp_manifests,
    }) {
        Ok(result) => result,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                JsonRpcResponse::error(id, jsonrpc::INTERNAL_ERROR, err.to_string()),
            );
        }
    };
    (StatusCode::OK, JsonRpcResponse::result(id, result))
}

/// Runs the full invocation pipeline and shapes the result envelope.
async fn tools_call_handler(
    state: &ServerState,
    headers: Option<&HeaderMap>,
    id: Value,
    params: Option<Value>,
) -> (StatusCode, JsonRpcResponse) {
    let params = params.unwrap_or(Value::Null);
    let call: ToolCallParams = match serde_json::from_value(params) {
        Ok(call) => call,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                JsonRpcResponse::error(
                    id,
                    jsonrpc::INVALID_REQUEST,
                    "invalid tools call request",
                ),
            );
        }
    };

    match invoke_tool(state, &call.name, call.arguments, headers).await {
        Ok(result) => match serde_json::to_value(success_content(result)) {
            Ok(value) => (StatusCode::OK, JsonRpcResponse::result(id, value)),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                JsonRpcResponse::error(id, jsonrpc::INTERNAL_ERROR, err.to_string()),
            ),
        },
        Err(CallError::ToolFailure(message)) => {
            // Tool-level failures stay schema-visible: a successful envelope
            // carrying the error text lets the calling model adapt.
            let result = CallToolResult {
                content: vec![TextContent {
                    content_type: "text",
                    text: message,
                }],
                is_error: true,
            };
            match serde_json::to_value(result) {
                Ok(value) => (StatusCode::OK, JsonRpcResponse::result(id, value)),
                Err(err) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    JsonRpcResponse::error(id, jsonrpc::INTERNAL_ERROR, err.to_string()),
                ),
            }
        }
        Err(err) => {
            let (status, code) = call_error_mapping(&err);
            (status, JsonRpcResponse::error(id, code, err.to_string()))
        }
    }
}

/// Serializes an invoke result into text chunks, one per sequence element.
fn success_content(result: Value) -> CallToolResult {
    let items = match result {
        Value::Array(items) => items,
        other => vec![other],
    };
    let content = items
        .into_iter()
        .map(|item| TextContent {
            content_type: "text",
            text: serde_json::to_string(&item)
                .unwrap_or_else(|err| format!("fail to marshal: {err}")),
        })
        .collect();
    CallToolResult {
        content,
        is_error: false,
    }
}

/// Maps a classified pipeline failure onto HTTP status and JSON-RPC code.
///
/// Tool-level failures never reach this function; the caller shapes them
/// into a success envelope first.
fn call_error_mapping(err: &CallError) -> (StatusCode, i64) {
    match err {
        CallError::UnknownTool(_) => (StatusCode::NOT_FOUND, jsonrpc::INVALID_PARAMS),
        CallError::BadArguments(_) => (StatusCode::BAD_REQUEST, jsonrpc::INVALID_PARAMS),
        CallError::MissingAccessToken | CallError::Unauthorized(_) => {
            (StatusCode::UNAUTHORIZED, jsonrpc::INVALID_REQUEST)
        }
        CallError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, jsonrpc::INTERNAL_ERROR),
        CallError::ToolFailure(_) => {
            unreachable!("tool failures are shaped into a success envelope before mapping")
        }
    }
}
