// toolgate-backends/src/sources/http.rs
// ============================================================================
// Module: HTTP Source
// Description: Shared HTTP client for API-backed tools.
// Purpose: Hold base URL, default headers, and the client-OAuth flag.
// Dependencies: toolgate-core, reqwest
// ============================================================================

//! ## Overview
//! The http source wraps a shared `reqwest::Client` pointed at a base URL.
//! With `useClientOAuth: true`, every bound tool requires the caller's
//! `Authorization` bearer token and forwards it upstream instead of the
//! configured headers, so credential failures belong to the caller rather
//! than the operator. No connectivity probe runs at load: a reachable base
//! URL is not a well-formedness requirement for an API root.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use toolgate_core::DecodeError;
use toolgate_core::Source;
use toolgate_core::SourceConfig;
use toolgate_core::SourceError;

/// Kind identifier for http sources.
pub const SOURCE_KIND: &str = "http";

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Decoded `sources` entry for an HTTP API.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct HttpSourceConfig {
    /// Entry name, injected by the loader.
    #[serde(skip)]
    pub name: String,
    /// Kind discriminator from the entry.
    pub kind: String,
    /// API root; tool paths are appended to it.
    pub base_url: String,
    /// Default headers applied to every request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Per-request timeout in seconds.
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Forward the caller's bearer token instead of configured headers.
    #[serde(default)]
    pub use_client_o_auth: bool,
}

/// Factory registered for the `http` kind.
///
/// # Errors
///
/// Returns [`DecodeError`] when the entry has unknown or missing fields.
pub fn configure(
    name: &str,
    entry: &serde_yaml::Value,
) -> Result<Box<dyn SourceConfig>, DecodeError> {
    let mut config: HttpSourceConfig = serde_yaml::from_value(entry.clone())?;
    config.name = name.to_string();
    Ok(Box::new(config))
}

#[async_trait]
impl SourceConfig for HttpSourceConfig {
    fn kind(&self) -> &'static str {
        SOURCE_KIND
    }

    async fn initialize(&self) -> Result<Arc<dyn Source>, SourceError> {
        if self.base_url.is_empty() {
            return Err(SourceError::Config("baseUrl must not be empty".to_string()));
        }
        let timeout = Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SourceError::Config(err.to_string()))?;
        Ok(Arc::new(HttpSource {
            name: self.name.clone(),
            base_url: self.base_url.trim_end_matches('/').to_string(),
            headers: self.headers.clone(),
            use_client_o_auth: self.use_client_o_auth,
            client,
        }))
    }
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Long-lived HTTP client shared by every bound tool.
pub struct HttpSource {
    /// Configured source name.
    pub name: String,
    /// API root without a trailing slash.
    base_url: String,
    /// Default headers applied to every request.
    headers: BTreeMap<String, String>,
    /// Whether bound tools forward the caller's bearer token.
    use_client_o_auth: bool,
    /// Shared client.
    client: reqwest::Client,
}

impl HttpSource {
    /// Shared client handle for bound tools.
    #[must_use]
    pub fn client(&self) -> reqwest::Client {
        self.client.clone()
    }

    /// API root without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Default headers applied to every request.
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Whether bound tools forward the caller's bearer token.
    #[must_use]
    pub fn use_client_o_auth(&self) -> bool {
        self.use_client_o_auth
    }
}

impl Source for HttpSource {
    fn kind(&self) -> &'static str {
        SOURCE_KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
