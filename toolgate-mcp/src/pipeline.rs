// toolgate-mcp/src/pipeline.rs
// ============================================================================
// Module: Invocation Pipeline
// Description: Shared tool-call pipeline behind every transport.
// Purpose: Resolve, authorize, parse, invoke, and classify in one place.
// Dependencies: toolgate-config, toolgate-core, http, tokio
// ============================================================================

//! ## Overview
//! Both the JSON-RPC `tools/call` handler and the REST invoke endpoint run
//! the same ordered steps: resolve the tool by name, read the client access
//! token, collect verified claims from every configured auth service,
//! check authorization, parse parameters, invoke, and classify the outcome.
//! Auth-service failures are logged at debug and never surfaced, so a
//! request presenting credentials for one service is unaffected by another
//! service's rejection. Requests without headers (stdio) skip claim
//! collection entirely.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use http::HeaderMap;
use http::header::AUTHORIZATION;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Semaphore;
use toolgate_config::Gateway;
use toolgate_core::AccessToken;
use toolgate_core::AuthService;
use toolgate_core::ClaimsMap;
use toolgate_core::InvokeError;
use toolgate_core::ParamError;
use toolgate_core::Tool;
use toolgate_core::Toolset;
use tracing::debug;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default maximum request body size in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 4 * 1024 * 1024;
/// Default maximum inflight requests.
pub const DEFAULT_MAX_INFLIGHT: usize = 256;

// ============================================================================
// SECTION: Server State
// ============================================================================

/// Immutable catalog plus transport limits shared by every handler.
pub struct ServerState {
    /// Initialized tools keyed by name.
    pub tools: BTreeMap<String, Arc<dyn Tool>>,
    /// Toolsets keyed by name; the empty name holds every tool.
    pub toolsets: BTreeMap<String, Toolset>,
    /// Configured auth services in name order.
    pub auth_services: Vec<Arc<dyn AuthService>>,
    /// Maximum allowed request body size.
    pub max_body_bytes: usize,
    /// Concurrency limiter for inflight requests.
    pub inflight: Semaphore,
}

impl ServerState {
    /// Builds server state over a loaded gateway.
    #[must_use]
    pub fn new(gateway: Gateway, max_body_bytes: usize, max_inflight: usize) -> Self {
        Self {
            tools: gateway.tools,
            toolsets: gateway.toolsets,
            auth_services: gateway.auth_services,
            max_body_bytes,
            inflight: Semaphore::new(max_inflight),
        }
    }

    /// Resolves a toolset by name; the empty name is the default set.
    #[must_use]
    pub fn toolset(&self, name: &str) -> Option<&Toolset> {
        self.toolsets.get(name)
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Classified invocation failures, mapped per transport.
#[derive(Debug, Error)]
pub enum CallError {
    /// `params.name` does not resolve to a configured tool.
    #[error("invalid tool name: tool with name {0:?} does not exist")]
    UnknownTool(String),
    /// The tool forwards client credentials and none were presented.
    #[error("missing access token in the 'Authorization' header")]
    MissingAccessToken,
    /// No configured auth service authorizes the call.
    #[error("{0}")]
    Unauthorized(String),
    /// Arguments failed validation or template substitution.
    #[error("provided parameters were invalid: {0}")]
    BadArguments(String),
    /// The backend reported an error that is safe to show the caller.
    #[error("{0}")]
    ToolFailure(String),
    /// Server-managed credentials were rejected or internal state failed.
    #[error("{0}")]
    Internal(String),
}

// ============================================================================
// SECTION: Claim Collection
// ============================================================================

/// Runs every configured auth service against the request headers.
///
/// Failures and absences are silent by design; only services that produce
/// claims appear in the result.
pub async fn collect_claims(
    auth_services: &[Arc<dyn AuthService>],
    headers: &HeaderMap,
) -> ClaimsMap {
    let mut claims = ClaimsMap::new();
    for service in auth_services {
        match service.verify(headers).await {
            Ok(Some(verified)) => {
                claims.insert(service.name().to_string(), verified);
            }
            Ok(None) => {}
            Err(err) => {
                debug!(auth_service = service.name(), error = %err, "auth verification failed");
            }
        }
    }
    claims
}

/// Reads the raw client access token from the `Authorization` header.
#[must_use]
pub fn access_token(headers: Option<&HeaderMap>) -> AccessToken {
    headers
        .and_then(|h| h.get(AUTHORIZATION))
        .and_then(|value| value.to_str().ok())
        .map(AccessToken::new)
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Invocation
// ============================================================================

/// Executes the shared tool-call pipeline.
///
/// `headers` is `None` on the stdio transport, which skips claim
/// collection and carries no client credential.
///
/// # Errors
///
/// Returns [`CallError`] classified for transport-level mapping.
pub async fn invoke_tool(
    state: &ServerState,
    name: &str,
    arguments: Map<String, Value>,
    headers: Option<&HeaderMap>,
) -> Result<Value, CallError> {
    let tool = state.tools.get(name).ok_or_else(|| CallError::UnknownTool(name.to_string()))?;
    debug!(tool = name, "resolved tool");

    let access_token = access_token(headers);
    if tool.requires_client_authorization() && access_token.is_empty() {
        return Err(CallError::MissingAccessToken);
    }

    let claims = match headers {
        Some(headers) => collect_claims(&state.auth_services, headers).await,
        None => ClaimsMap::new(),
    };

    let verified: Vec<String> = claims.keys().cloned().collect();
    if !tool.authorized(&verified) {
        return Err(CallError::Unauthorized(
            "unauthorized tool call: please make sure you specify correct auth headers"
                .to_string(),
        ));
    }
    debug!(tool = name, "tool invocation authorized");

    let params = tool.parse_params(&arguments, &claims).map_err(|err| match err {
        ParamError::Unauthorized {
            ..
        } => CallError::Unauthorized(err.to_string()),
        other => CallError::BadArguments(other.to_string()),
    })?;

    match tool.invoke(params, access_token).await {
        Ok(result) => Ok(result),
        Err(InvokeError::Unauthorized(message)) => Err(CallError::Unauthorized(message)),
        Err(InvokeError::InvalidParams(message)) => Err(CallError::BadArguments(message)),
        Err(err) if err.is_upstream_auth() => {
            if tool.requires_client_authorization() {
                // The caller's own credentials failed upstream.
                Err(CallError::Unauthorized(err.to_string()))
            } else {
                // Server-managed credentials failed; that is an operator
                // problem, not the caller's.
                Err(CallError::Internal(err.to_string()))
            }
        }
        Err(err) => Err(CallError::ToolFailure(err.to_string())),
    }
}
