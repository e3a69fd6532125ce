// toolgate-mcp/src/jsonrpc.rs
// ============================================================================
// Module: JSON-RPC Envelope
// Description: Request/response envelope types and standard error codes.
// Purpose: Keep wire framing separate from method semantics.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Requests are `{jsonrpc: "2.0", id, method, params}` where `id` may be a
//! string, an integer, or null; responses echo the id verbatim. Error codes
//! follow the JSON-RPC 2.0 assignments. A request without an id is a
//! notification and receives no response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Error Codes
// ============================================================================

/// Body did not parse or violated the envelope.
pub const INVALID_REQUEST: i64 = -32600;
/// Method not recognized.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Unknown tool, missing parameter, or failed parameter validation.
pub const INVALID_PARAMS: i64 = -32602;
/// Decoder failure or unexpected internal state.
pub const INTERNAL_ERROR: i64 = -32603;

/// Protocol version constant for the envelope.
pub const JSONRPC_VERSION: &str = "2.0";

// ============================================================================
// SECTION: Envelope Types
// ============================================================================

/// Incoming JSON-RPC request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC protocol version; must be `"2.0"`.
    pub jsonrpc: String,
    /// Request identifier; absent for notifications.
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name.
    pub method: String,
    /// Optional parameters payload.
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC protocol version.
    pub jsonrpc: &'static str,
    /// Request identifier echoed verbatim.
    pub id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload when the request fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Standard error code.
    pub code: i64,
    /// Human-readable error message.
    pub message: String,
    /// Structured error metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Builds a success envelope echoing the request id.
    #[must_use]
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error envelope echoing the request id.
    #[must_use]
    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}
