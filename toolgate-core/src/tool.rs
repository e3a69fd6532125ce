// toolgate-core/src/tool.rs
// ============================================================================
// Module: Tool Contract
// Description: Stateless per-call operations bound to one source.
// Purpose: Define the invocation surface shared by every tool kind.
// Dependencies: async-trait, serde_json, thiserror
// ============================================================================

//! ## Overview
//! A tool is an immutable descriptor bound to exactly one source: a declared
//! parameter list, auth requirements, and an invoke procedure. Tools are
//! resolved by name at request time; the dispatch pipeline authorizes the
//! call, parses parameters, invokes, and classifies any error into the
//! client-visible taxonomy. Invoke results are any JSON-serializable value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use crate::auth::ClaimsMap;
use crate::manifest::Manifest;
use crate::manifest::McpManifest;
use crate::params::ParamError;
use crate::params::ParamValues;
use crate::source::Source;

// ============================================================================
// SECTION: Access Token
// ============================================================================

/// Client-propagated credential from the standard `Authorization` header.
///
/// Held verbatim; tools bound to a client-OAuth source forward the bearer
/// token upstream instead of server-managed credentials.
#[derive(Debug, Clone, Default)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps the raw `Authorization` header value.
    #[must_use]
    pub fn new(header_value: impl Into<String>) -> Self {
        Self(header_value.into())
    }

    /// Whether any credential was presented.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The bearer token with the scheme stripped, when present.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        let mut parts = self.0.trim().splitn(2, ' ');
        let scheme = parts.next().unwrap_or_default();
        let token = parts.next().unwrap_or_default().trim();
        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Some(token)
        } else {
            None
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Invocation failures, classified by the dispatch pipeline.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    /// The request lacked credentials the tool requires.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Arguments failed validation that only the tool can perform, such as
    /// template substitution. A client error, never a backend failure.
    #[error("{0}")]
    InvalidParams(String),
    /// An upstream API rejected the credentials used for the call.
    #[error("upstream authentication failed with status {status}: {message}")]
    UpstreamAuth {
        /// Upstream HTTP status (401 or 403).
        status: u16,
        /// Upstream failure detail.
        message: String,
    },
    /// The backend reported an error that is safe to show the caller.
    #[error("{0}")]
    Failed(String),
}

impl InvokeError {
    /// Whether this error reports upstream credential rejection.
    ///
    /// Typed variants are checked first; drivers that expose no structured
    /// error fall back to the substring convention used by their client
    /// libraries.
    #[must_use]
    pub fn is_upstream_auth(&self) -> bool {
        match self {
            Self::UpstreamAuth {
                ..
            } => true,
            Self::Failed(message) => {
                message.contains("Error 401") || message.contains("Error 403")
            }
            Self::Unauthorized(_) | Self::InvalidParams(_) => false,
        }
    }
}

/// Tool initialization failures (configuration-time).
#[derive(Debug, Error)]
pub enum ToolInitError {
    /// The referenced source name is not configured.
    #[error("no source named {0:?} configured")]
    UnknownSource(String),
    /// The referenced source does not satisfy the tool's compatibility
    /// interface.
    #[error("invalid source for {tool_kind:?} tool: source kind must be one of {expected:?}")]
    IncompatibleSource {
        /// Tool kind performing the check.
        tool_kind: &'static str,
        /// Acceptable source kinds.
        expected: &'static [&'static str],
    },
    /// A declared parameter is inconsistent.
    #[error(transparent)]
    Parameter(#[from] ParamError),
    /// Any other kind-specific initialization failure.
    #[error("{0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Contracts
// ============================================================================

/// A named, parameterized operation bound to one source.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    /// Configured tool name.
    fn name(&self) -> &str;

    /// Whether the given verified auth services satisfy `authRequired`.
    ///
    /// True when the tool requires no auth, or when any required service
    /// name appears in `verified_auth_services`.
    fn authorized(&self, verified_auth_services: &[String]) -> bool;

    /// Whether callers must present an `Authorization` credential that is
    /// forwarded to the backend.
    fn requires_client_authorization(&self) -> bool {
        false
    }

    /// Resolves the caller's argument map and verified claims into an
    /// ordered value list.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] when arguments are invalid or a claim-sourced
    /// parameter cannot be resolved.
    fn parse_params(
        &self,
        data: &Map<String, Value>,
        claims: &ClaimsMap,
    ) -> Result<ParamValues, ParamError>;

    /// Executes the configured operation.
    ///
    /// # Errors
    ///
    /// Returns [`InvokeError`]; the dispatch pipeline maps it into the
    /// client-visible error taxonomy.
    async fn invoke(
        &self,
        params: ParamValues,
        access_token: AccessToken,
    ) -> Result<Value, InvokeError>;

    /// Human manifest for the HTTP catalog.
    fn manifest(&self) -> &Manifest;

    /// Agent manifest for the `tools/list` method.
    fn mcp_manifest(&self) -> &McpManifest;
}

impl std::fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("name", &self.name()).finish()
    }
}

/// Decoded `tools` entry, ready to bind to its source.
pub trait ToolConfig: Send + Sync {
    /// Kind identifier of this entry.
    fn kind(&self) -> &'static str;

    /// Binds the tool to its configured source.
    ///
    /// # Errors
    ///
    /// Returns [`ToolInitError`] when the source is missing, incompatible,
    /// or the declaration is invalid.
    fn initialize(
        &self,
        sources: &BTreeMap<String, Arc<dyn Source>>,
    ) -> Result<Arc<dyn Tool>, ToolInitError>;
}

// ============================================================================
// SECTION: Authorization
// ============================================================================

/// Evaluates an `authRequired` list against the request's verified services.
#[must_use]
pub fn is_authorized(auth_required: &[String], verified_auth_services: &[String]) -> bool {
    if auth_required.is_empty() {
        return true;
    }
    auth_required.iter().any(|required| verified_auth_services.contains(required))
}

#[cfg(test)]
mod tests;
