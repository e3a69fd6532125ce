// toolgate-backends/src/tools/sqlite_execute_sql.rs
// ============================================================================
// Module: sqlite-execute-sql Tool
// Description: Caller-supplied SQL executed against a sqlite source.
// Purpose: Expose ad-hoc statement execution behind the shared pipeline.
// Dependencies: toolgate-core, rusqlite, serde_json, tokio
// ============================================================================

//! ## Overview
//! The `sqlite-execute-sql` tool declares a single required string
//! parameter, `sql`, and runs whatever statement the caller provides.
//! Operators gate it with `authRequired`; the tool itself applies the same
//! row normalization as `sqlite-sql`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
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

use crate::sources::sqlite::SqliteSource;
use crate::tools::sqlite_sql::run_statement;

/// Kind identifier for this tool family.
pub const KIND: &str = "sqlite-execute-sql";

/// Source kinds accepted by this tool family.
const COMPATIBLE_SOURCES: &[&str] = &[crate::sources::sqlite::SOURCE_KIND];

// ============================================================================
// SECTION: Config
// ============================================================================

/// Decoded `tools` entry for ad-hoc sqlite execution.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SqliteExecuteSqlConfig {
    /// Entry name, injected by the loader.
    #[serde(skip)]
    pub name: String,
    /// Kind discriminator from the entry.
    pub kind: String,
    /// Name of the bound source.
    pub source: String,
    /// Tool description surfaced in manifests.
    pub description: String,
    /// Auth services that may authorize calls.
    #[serde(default)]
    pub auth_required: Vec<String>,
}

/// Factory registered for the `sqlite-execute-sql` kind.
///
/// # Errors
///
/// Returns [`DecodeError`] when the entry has unknown or missing fields.
pub fn configure(name: &str, entry: &serde_yaml::Value) -> Result<Box<dyn ToolConfig>, DecodeError> {
    let mut config: SqliteExecuteSqlConfig = serde_yaml::from_value(entry.clone())?;
    config.name = name.to_string();
    Ok(Box::new(config))
}

impl ToolConfig for SqliteExecuteSqlConfig {
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
        let Some(sqlite) = source.as_any().downcast_ref::<SqliteSource>() else {
            return Err(ToolInitError::IncompatibleSource {
                tool_kind: KIND,
                expected: COMPATIBLE_SOURCES,
            });
        };

        let parameters = vec![Parameter::string("sql", "The sql to execute.")];
        let (all_params, manifest_params, schema) = process_parameters(&parameters, &[]);

        Ok(Arc::new(SqliteExecuteSqlTool {
            name: self.name.clone(),
            auth_required: self.auth_required.clone(),
            all_params,
            connection: sqlite.connection(),
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

/// Ad-hoc sqlite execution bound to its source.
pub struct SqliteExecuteSqlTool {
    name: String,
    auth_required: Vec<String>,
    all_params: Vec<Parameter>,
    connection: Arc<Mutex<Connection>>,
    manifest: Manifest,
    mcp_manifest: McpManifest,
}

#[async_trait]
impl Tool for SqliteExecuteSqlTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn authorized(&self, verified_auth_services: &[String]) -> bool {
        is_authorized(&self.auth_required, verified_auth_services)
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
        _access_token: AccessToken,
    ) -> Result<Value, InvokeError> {
        let statement = params
            .iter()
            .find(|p| p.name == "sql")
            .and_then(|p| p.value.as_str())
            .ok_or_else(|| InvokeError::Failed("parameter \"sql\" must be a string".to_string()))?
            .to_string();
        run_statement(Arc::clone(&self.connection), statement, ParamValues::default()).await
    }

    fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn mcp_manifest(&self) -> &McpManifest {
        &self.mcp_manifest
    }
}
