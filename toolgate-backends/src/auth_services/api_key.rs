// toolgate-backends/src/auth_services/api_key.rs
// ============================================================================
// Module: api-key Auth Service
// Description: Static key lookup producing configured claims.
// Purpose: Verify `<service-name>_token` headers against configured keys.
// Dependencies: toolgate-core, http, serde_json
// ============================================================================

//! ## Overview
//! The `api-key` service maps presented keys to operator-configured claim
//! sets. It reads its conventional header, `<service-name>_token`; an absent
//! header means the request presented nothing for this service, and an
//! unknown key is a verification failure that the pipeline logs at debug
//! without surfacing. Verifiers that call out to identity providers (OIDC,
//! JWKS) implement the same contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use serde::Deserialize;
use toolgate_core::AuthInitError;
use toolgate_core::AuthService;
use toolgate_core::AuthServiceConfig;
use toolgate_core::AuthServiceError;
use toolgate_core::Claims;
use toolgate_core::DecodeError;
use toolgate_core::token_header_name;

/// Kind identifier for api-key auth services.
pub const KIND: &str = "api-key";

// ============================================================================
// SECTION: Config
// ============================================================================

/// One accepted key and the claims it vouches for.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ApiKeyEntry {
    /// Accepted key value.
    pub key: String,
    /// Claims granted to requests presenting the key.
    pub claims: Claims,
}

/// Decoded `authServices` entry for an api-key verifier.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ApiKeyConfig {
    /// Entry name, injected by the loader.
    #[serde(skip)]
    pub name: String,
    /// Kind discriminator from the entry.
    pub kind: String,
    /// Accepted keys.
    pub keys: Vec<ApiKeyEntry>,
}

/// Factory registered for the `api-key` kind.
///
/// # Errors
///
/// Returns [`DecodeError`] when the entry has unknown or missing fields.
pub fn configure(
    name: &str,
    entry: &serde_yaml::Value,
) -> Result<Box<dyn AuthServiceConfig>, DecodeError> {
    let mut config: ApiKeyConfig = serde_yaml::from_value(entry.clone())?;
    config.name = name.to_string();
    Ok(Box::new(config))
}

impl AuthServiceConfig for ApiKeyConfig {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn initialize(&self) -> Result<Arc<dyn AuthService>, AuthInitError> {
        if self.keys.is_empty() {
            return Err(AuthInitError("api-key service requires at least one key".to_string()));
        }
        let mut keys = BTreeMap::new();
        for entry in &self.keys {
            if keys.insert(entry.key.clone(), entry.claims.clone()).is_some() {
                return Err(AuthInitError("api-key service lists a duplicate key".to_string()));
            }
        }
        Ok(Arc::new(ApiKeyService {
            name: self.name.clone(),
            header: token_header_name(&self.name),
            keys,
        }))
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Runtime api-key verifier.
pub struct ApiKeyService {
    name: String,
    header: String,
    keys: BTreeMap<String, Claims>,
}

#[async_trait]
impl AuthService for ApiKeyService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn verify(&self, headers: &HeaderMap) -> Result<Option<Claims>, AuthServiceError> {
        let Some(value) = headers.get(&self.header) else {
            return Ok(None);
        };
        let presented = value.to_str().map_err(|_| AuthServiceError::MalformedHeader {
            service: self.name.clone(),
            reason: "header value is not valid ascii".to_string(),
        })?;
        match self.keys.get(presented.trim()) {
            Some(claims) => Ok(Some(claims.clone())),
            None => Err(AuthServiceError::Rejected {
                service: self.name.clone(),
                reason: "unknown api key".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests;
