// toolgate-core/src/auth.rs
// ============================================================================
// Module: Auth Services
// Description: Claim extraction contract for configured auth services.
// Purpose: Turn request headers into verified claims maps per service.
// Dependencies: async-trait, http, serde_json, thiserror
// ============================================================================

//! ## Overview
//! An auth service inspects a request's headers and either produces a
//! verified claims map, reports that the request presented nothing for it,
//! or fails verification. The dispatch pipeline iterates every configured
//! service per request; a service returning `None` is indistinguishable from
//! the service not being configured at all, and verification failures are
//! logged at debug and never surfaced to the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Claims
// ============================================================================

/// Verified claims produced by one auth service.
pub type Claims = serde_json::Map<String, Value>;

/// Claims collected for one request, keyed by auth-service name.
pub type ClaimsMap = BTreeMap<String, Claims>;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Auth-service verification failures.
///
/// These never reach the caller; the pipeline logs them at debug so a
/// request presenting credentials for one service still succeeds when
/// another service's header is malformed.
#[derive(Debug, Error)]
pub enum AuthServiceError {
    /// The presented credential failed verification.
    #[error("auth service {service:?} rejected the presented credential: {reason}")]
    Rejected {
        /// Service that rejected the credential.
        service: String,
        /// Failure detail.
        reason: String,
    },
    /// The credential header was present but unreadable.
    #[error("auth service {service:?} could not read its header: {reason}")]
    MalformedHeader {
        /// Service whose header was malformed.
        service: String,
        /// Failure detail.
        reason: String,
    },
}

/// Auth-service initialization failures (configuration-time).
#[derive(Debug, Error)]
#[error("unable to initialize auth service: {0}")]
pub struct AuthInitError(pub String);

// ============================================================================
// SECTION: Contracts
// ============================================================================

/// A named verifier that extracts claims from request headers.
#[async_trait]
pub trait AuthService: Send + Sync + 'static {
    /// Configured service name.
    fn name(&self) -> &str;

    /// Extracts verified claims from the request headers.
    ///
    /// Returns `Ok(None)` when the request presented nothing for this
    /// service.
    ///
    /// # Errors
    ///
    /// Returns [`AuthServiceError`] when a presented credential fails
    /// verification.
    async fn verify(&self, headers: &HeaderMap) -> Result<Option<Claims>, AuthServiceError>;
}

impl std::fmt::Debug for dyn AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").field("name", &self.name()).finish()
    }
}

/// Decoded `authServices` entry, ready to initialize.
pub trait AuthServiceConfig: Send + Sync {
    /// Kind identifier of this entry.
    fn kind(&self) -> &'static str;

    /// Builds the runtime service.
    ///
    /// # Errors
    ///
    /// Returns [`AuthInitError`] when the configured service cannot be
    /// constructed.
    fn initialize(&self) -> Result<Arc<dyn AuthService>, AuthInitError>;
}

/// Conventional claim-token header for a service: `<service-name>_token`.
#[must_use]
pub fn token_header_name(service: &str) -> String {
    format!("{service}_token")
}
