// toolgate-mcp/src/server.rs
// ============================================================================
// Module: Gateway Server
// Description: HTTP and stdio transports over the dispatch pipeline.
// Purpose: Bind the configured catalog to its serving surfaces.
// Dependencies: toolgate-config, toolgate-core, axum, tokio
// ============================================================================

//! ## Overview
//! The HTTP transport serves JSON-RPC at `/mcp` and `/mcp/{toolset}` and
//! the REST catalog under `/api`. The stdio transport reads
//! newline-delimited JSON-RPC from stdin; it carries no headers, so auth
//! claim collection is skipped there. Both transports share the request
//! limits: an inflight semaphore and a body-size guard applied before any
//! JSON parsing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use toolgate_config::Gateway;
use toolgate_core::Manifest;
use tracing::info;

use crate::jsonrpc;
use crate::jsonrpc::JsonRpcResponse;
use crate::method::handle_message;
use crate::pipeline::CallError;
use crate::pipeline::DEFAULT_MAX_BODY_BYTES;
use crate::pipeline::DEFAULT_MAX_INFLIGHT;
use crate::pipeline::ServerState;
use crate::pipeline::invoke_tool;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Transport-level server failures.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("unable to bind {address}: {message}")]
    Bind {
        /// Requested bind address.
        address: String,
        /// Failure detail.
        message: String,
    },
    /// The transport failed while serving.
    #[error("transport failed: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Options
// ============================================================================

/// Serving options supplied by the CLI.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Bind address for the HTTP transport.
    pub address: String,
    /// Bind port for the HTTP transport.
    pub port: u16,
    /// Maximum allowed request body size.
    pub max_body_bytes: usize,
    /// Maximum inflight requests.
    pub max_inflight: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5000,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            max_inflight: DEFAULT_MAX_INFLIGHT,
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Gateway server instance.
pub struct McpServer {
    state: Arc<ServerState>,
    options: ServerOptions,
}

impl McpServer {
    /// Builds a server over a loaded gateway.
    #[must_use]
    pub fn new(gateway: Gateway, options: ServerOptions) -> Self {
        let state =
            Arc::new(ServerState::new(gateway, options.max_body_bytes, options.max_inflight));
        Self {
            state,
            options,
        }
    }

    /// The axum router serving both HTTP surfaces.
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/mcp", post(handle_mcp_default))
            .route("/mcp/{toolset}", post(handle_mcp_toolset))
            .route("/api/toolset", get(handle_default_toolset_manifest))
            .route("/api/toolset/{name}", get(handle_toolset_manifest))
            .route("/api/tool/{name}/invoke", post(handle_invoke))
            .layer(DefaultBodyLimit::max(self.state.max_body_bytes))
            .with_state(Arc::clone(&self.state))
    }

    /// Serves the HTTP transport until the process stops.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let address = format!("{}:{}", self.options.address, self.options.port);
        let listener =
            tokio::net::TcpListener::bind(&address).await.map_err(|err| ServerError::Bind {
                address: address.clone(),
                message: err.to_string(),
            })?;
        let local: SocketAddr = listener
            .local_addr()
            .map_err(|err| ServerError::Transport(err.to_string()))?;
        info!(address = %local, "server listening");
        axum::serve(listener, self.router())
            .await
            .map_err(|err| ServerError::Transport(err.to_string()))
    }

    /// Serves newline-delimited JSON-RPC over stdin/stdout.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when stdio reads or writes fail.
    pub async fn serve_stdio(self) -> Result<(), ServerError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();
        info!("serving on stdio");
        while let Some(line) =
            lines.next_line().await.map_err(|err| ServerError::Transport(err.to_string()))?
        {
            if line.trim().is_empty() {
                continue;
            }
            if line.len() > self.state.max_body_bytes {
                let response = JsonRpcResponse::error(
                    Value::Null,
                    jsonrpc::INVALID_REQUEST,
                    "request body too large",
                );
                write_line(&mut stdout, &response).await?;
                continue;
            }
            // Stdio carries no headers; claim extraction is skipped.
            let Some((_, response)) =
                handle_message(&self.state, "", None, line.as_bytes()).await
            else {
                continue;
            };
            write_line(&mut stdout, &response).await?;
        }
        Ok(())
    }
}

/// Writes one serialized response line to stdout.
async fn write_line(
    stdout: &mut tokio::io::Stdout,
    response: &JsonRpcResponse,
) -> Result<(), ServerError> {
    let mut payload = serde_json::to_vec(response)
        .map_err(|err| ServerError::Transport(err.to_string()))?;
    payload.push(b'\n');
    stdout
        .write_all(&payload)
        .await
        .map_err(|err| ServerError::Transport(err.to_string()))?;
    stdout.flush().await.map_err(|err| ServerError::Transport(err.to_string()))
}

// ============================================================================
// SECTION: JSON-RPC Handlers
// ============================================================================

async fn handle_mcp_default(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    handle_mcp(&state, String::new(), &headers, &bytes).await
}

async fn handle_mcp_toolset(
    State(state): State<Arc<ServerState>>,
    Path(toolset): Path<String>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    handle_mcp(&state, toolset, &headers, &bytes).await
}

/// Applies transport limits, then dispatches one JSON-RPC message.
async fn handle_mcp(
    state: &Arc<ServerState>,
    toolset: String,
    headers: &HeaderMap,
    bytes: &Bytes,
) -> Response {
    let Ok(_permit) = state.inflight.try_acquire() else {
        let response =
            JsonRpcResponse::error(Value::Null, jsonrpc::INTERNAL_ERROR, "server overloaded");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(response)).into_response();
    };
    if bytes.len() > state.max_body_bytes {
        let response = JsonRpcResponse::error(
            Value::Null,
            jsonrpc::INVALID_REQUEST,
            "request body too large",
        );
        return (StatusCode::PAYLOAD_TOO_LARGE, Json(response)).into_response();
    }
    match handle_message(state, &toolset, Some(headers), bytes).await {
        Some((status, response)) => (status, Json(response)).into_response(),
        // Notifications receive no body.
        None => StatusCode::ACCEPTED.into_response(),
    }
}

// ============================================================================
// SECTION: REST Handlers
// ============================================================================

/// Toolset manifest response for the HTTP catalog.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolsetManifest<'a> {
    /// Gateway version serving the manifest.
    server_version: &'static str,
    /// Member tool manifests keyed by name.
    tools: &'a BTreeMap<String, Manifest>,
}

/// REST invocation response body.
#[derive(Debug, Serialize)]
struct InvokeResult {
    /// Serialized invoke result.
    result: String,
}

async fn handle_default_toolset_manifest(State(state): State<Arc<ServerState>>) -> Response {
    toolset_manifest_response(&state, "")
}

async fn handle_toolset_manifest(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Response {
    toolset_manifest_response(&state, &name)
}

fn toolset_manifest_response(state: &ServerState, name: &str) -> Response {
    match state.toolset(name) {
        Some(toolset) => Json(ToolsetManifest {
            server_version: env!("CARGO_PKG_VERSION"),
            tools: &toolset.manifests,
        })
        .into_response(),
        None => {
            (StatusCode::NOT_FOUND, format!("toolset {name:?} does not exist")).into_response()
        }
    }
}

/// Invokes one tool over the REST surface.
///
/// Auth headers follow the same conventions as the JSON-RPC surface:
/// `Authorization` carries the client-propagated credential and
/// `<service-name>_token` carries per-service claim tokens.
async fn handle_invoke(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    let Ok(_permit) = state.inflight.try_acquire() else {
        return (StatusCode::SERVICE_UNAVAILABLE, "server overloaded".to_string())
            .into_response();
    };
    if bytes.len() > state.max_body_bytes {
        return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large".to_string())
            .into_response();
    }
    let arguments: Map<String, Value> = if bytes.is_empty() {
        Map::new()
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    "request body must be a json object of arguments".to_string(),
                )
                    .into_response();
            }
            Err(err) => {
                return (StatusCode::BAD_REQUEST, format!("unable to parse request body: {err}"))
                    .into_response();
            }
        }
    };

    match invoke_tool(&state, &name, arguments, Some(&headers)).await {
        Ok(value) => match serde_json::to_string(&value) {
            Ok(result) => Json(InvokeResult {
                result,
            })
            .into_response(),
            Err(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("unable to serialize result: {err}"))
                    .into_response()
            }
        },
        // Backend failures are safe to show and ride a successful response.
        Err(CallError::ToolFailure(message)) => Json(InvokeResult {
            result: message,
        })
        .into_response(),
        Err(err) => {
            let status = match err {
                CallError::UnknownTool(_) => StatusCode::NOT_FOUND,
                CallError::BadArguments(_) => StatusCode::BAD_REQUEST,
                CallError::MissingAccessToken | CallError::Unauthorized(_) => {
                    StatusCode::UNAUTHORIZED
                }
                CallError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                CallError::ToolFailure(_) => {
                    unreachable!("tool failures are shaped into a result body before mapping")
                }
            };
            (status, err.to_string()).into_response()
        }
    }
}
