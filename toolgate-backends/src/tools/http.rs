// toolgate-backends/src/tools/http.rs
// ============================================================================
// Module: http Tool
// Description: Configured API request executed against an http source.
// Purpose: Map declared parameters onto path, query, and body positions.
// Dependencies: toolgate-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! The `http` tool issues one request per invocation. Template parameters
//! resolve into the configured path under the identifier grammar; remaining
//! bind parameters travel as query parameters for GET/DELETE and as a JSON
//! object body for POST/PUT. On a client-OAuth source the caller's bearer
//! token replaces the source's configured headers, and upstream 401/403
//! responses surface as typed upstream-auth errors so the dispatch pipeline
//! can attribute the failure to the right credential owner.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Value;
use toolgate_core::AccessToken;
use toolgate_core::ClaimsMap;
use toolgate_core::DecodeError;
use toolgate_core::InvokeError;
use toolgate_core::Manifest;
use toolgate_core::McpManifest;
use toolgate_core::ParamError;
use toolgate_core::ParamValues;
use toolgate_core::Parameter;
use toolgate_core::Source;
use toolgate_core::Tool;
use toolgate_core::ToolConfig;
use toolgate_core::ToolInitError;
use toolgate_core::is_authorized;
use toolgate_core::parse_params;
use toolgate_core::process_parameters;
use toolgate_core::resolve_template_params;

use crate::sources::http::HttpSource;

/// Kind identifier for this tool family.
pub const KIND: &str = "http";

/// Source kinds accepted by this tool family.
const COMPATIBLE_SOURCES: &[&str] = &[crate::sources::http::SOURCE_KIND];

// ============================================================================
// SECTION: Config
// ============================================================================

/// Request method accepted by the http tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET.
    #[default]
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP DELETE.
    Delete,
}

impl HttpMethod {
    /// Whether bind parameters travel in the request body.
    const fn sends_body(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Decoded `tools` entry for a configured API request.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct HttpToolConfig {
    /// Entry name, injected by the loader.
    #[serde(skip)]
    pub name: String,
    /// Kind discriminator from the entry.
    pub kind: String,
    /// Name of the bound source.
    pub source: String,
    /// Tool description surfaced in manifests.
    pub description: String,
    /// Request path appended to the source's base URL; may contain template
    /// placeholders.
    pub path: String,
    /// Request method.
    #[serde(default)]
    pub method: HttpMethod,
    /// Extra headers applied after the source's defaults.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Auth services that may authorize calls.
    #[serde(default)]
    pub auth_required: Vec<String>,
    /// Declared bind parameters.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Declared template parameters.
    #[serde(default)]
    pub template_parameters: Vec<Parameter>,
}

/// Factory registered for the `http` tool kind.
///
/// # Errors
///
/// Returns [`DecodeError`] when the entry has unknown or missing fields.
pub fn configure(name: &str, entry: &serde_yaml::Value) -> Result<Box<dyn ToolConfig>, DecodeError> {
    let mut config: HttpToolConfig = serde_yaml::from_value(entry.clone())?;
    config.name = name.to_string();
    Ok(Box::new(config))
}

impl ToolConfig for HttpToolConfig {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn initialize(
        &self,
        sources: &BTreeMap<String, Arc<dyn Source>>,
    ) -> Result<Arc<dyn Tool>, ToolInitError> {
        let source = sources
            .get(&self.source)
            .ok_or_else(|| ToolInitError::UnknownSource(self.source.clone()))?;
        let Some(http) = source.as_any().downcast_ref::<HttpSource>() else {
            return Err(ToolInitError::IncompatibleSource {
                tool_kind: KIND,
                expected: COMPATIBLE_SOURCES,
            });
        };

        for parameter in self.parameters.iter().chain(self.template_parameters.iter()) {
            parameter.validate_declaration()?;
        }
        let (all_params, manifest_params, schema) =
            process_parameters(&self.parameters, &self.template_parameters);

        Ok(Arc::new(HttpTool {
            name: self.name.clone(),
            method: self.method,
            path: self.path.clone(),
            headers: self.headers.clone(),
            auth_required: self.auth_required.clone(),
            parameters: self.parameters.clone(),
            template_parameters: self.template_parameters.clone(),
            all_params,
            client: http.client(),
            base_url: http.base_url().to_string(),
            source_headers: http.headers().clone(),
            use_client_o_auth: http.use_client_o_auth(),
            manifest: Manifest {
                description: self.description.clone(),
                parameters: manifest_params,
                auth_required: self.auth_required.clone(),
            },
            mcp_manifest: McpManifest {
                name: self.name.clone(),
                description: self.description.clone(),
                input_schema: schema,
            },
        }))
    }
}

// ============================================================================
// SECTION: Tool
// ============================================================================

/// A configured API request bound to its source.
pub struct HttpTool {
    name: String,
    method: HttpMethod,
    path: String,
    headers: BTreeMap<String, String>,
    auth_required: Vec<String>,
    parameters: Vec<Parameter>,
    template_parameters: Vec<Parameter>,
    all_params: Vec<Parameter>,
    client: reqwest::Client,
    base_url: String,
    source_headers: BTreeMap<String, String>,
    use_client_o_auth: bool,
    manifest: Manifest,
    mcp_manifest: McpManifest,
}

#[async_trait]
impl Tool for HttpTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn authorized(&self, verified_auth_services: &[String]) -> bool {
        is_authorized(&self.auth_required, verified_auth_services)
    }

    fn requires_client_authorization(&self) -> bool {
        self.use_client_o_auth
    }

    fn parse_params(
        &self,
        data: &Map<String, Value>,
        claims: &ClaimsMap,
    ) -> Result<ParamValues, ParamError> {
        parse_params(&self.all_params, data, claims)
    }

    async fn invoke(
        &self,
        params: ParamValues,
        access_token: AccessToken,
    ) -> Result<Value, InvokeError> {
        let resolved = params.as_map();
        let path = resolve_template_params(&self.template_parameters, &self.path, &resolved)
            .map_err(|err| {
                InvokeError::InvalidParams(format!("unable to resolve template params: {err}"))
            })?;
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut request = self.client.request(self.method.as_reqwest(), &url);

        if self.use_client_o_auth {
            let token = access_token.bearer().ok_or_else(|| {
                InvokeError::Unauthorized(
                    "missing access token in the 'Authorization' header".to_string(),
                )
            })?;
            request = request.bearer_auth(token);
        } else {
            for (name, value) in &self.source_headers {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let bound: Vec<(&str, &Value)> = self
            .parameters
            .iter()
            .filter_map(|p| resolved.get(&p.name).map(|v| (p.name.as_str(), v)))
            .collect();
        if self.method.sends_body() {
            let body: Map<String, Value> =
                bound.into_iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
            request = request.json(&Value::Object(body));
        } else {
            let query: Vec<(String, String)> =
                bound.into_iter().map(|(k, v)| (k.to_string(), query_value(v))).collect();
            request = request.query(&query);
        }

        let response = request
            .send()
            .await
            .map_err(|err| InvokeError::Failed(format!("unable to execute request: {err}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| InvokeError::Failed(format!("unable to read response: {err}")))?;

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(InvokeError::UpstreamAuth {
                status: status.as_u16(),
                message: body,
            });
        }
        if !status.is_success() {
            return Err(InvokeError::Failed(format!(
                "upstream request failed with status {status}: {body}"
            )));
        }

        // JSON responses pass through structurally; anything else is text.
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }

    fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn mcp_manifest(&self) -> &McpManifest {
        &self.mcp_manifest
    }
}

/// Renders a bind value as a query-parameter string.
fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
