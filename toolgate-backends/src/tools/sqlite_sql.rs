// toolgate-backends/src/tools/sqlite_sql.rs
// ============================================================================
// Module: sqlite-sql Tool
// Description: Configured SQL statement executed against a sqlite source.
// Purpose: Bind declared parameters into a prepared statement and shape rows.
// Dependencies: toolgate-core, rusqlite, serde_json, tokio
// ============================================================================

//! ## Overview
//! The `sqlite-sql` tool runs an operator-configured statement. Template
//! parameters are spliced into the statement under the restricted identifier
//! grammar before bind parameters are resolved positionally. Statements run
//! on the blocking pool against the source's shared connection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use rusqlite::types::ValueRef;
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
use toolgate_core::bind_values;
use toolgate_core::is_authorized;
use toolgate_core::parse_params;
use toolgate_core::process_parameters;
use toolgate_core::resolve_template_params;

use crate::rows::bytes_to_text;
use crate::rows::rows_result;
use crate::sources::sqlite::SqliteSource;

/// Kind identifier for this tool family.
pub const KIND: &str = "sqlite-sql";

/// Source kinds accepted by this tool family.
const COMPATIBLE_SOURCES: &[&str] = &[crate::sources::sqlite::SOURCE_KIND];

// ============================================================================
// SECTION: Config
// ============================================================================

/// Decoded `tools` entry for a configured sqlite statement.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SqliteSqlConfig {
    /// Entry name, injected by the loader.
    #[serde(skip)]
    pub name: String,
    /// Kind discriminator from the entry.
    pub kind: String,
    /// Name of the bound source.
    pub source: String,
    /// Tool description surfaced in manifests.
    pub description: String,
    /// Statement template with positional binds and template placeholders.
    pub statement: String,
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

/// Factory registered for the `sqlite-sql` kind.
///
/// # Errors
///
/// Returns [`DecodeError`] when the entry has unknown or missing fields.
pub fn configure(name: &str, entry: &serde_yaml::Value) -> Result<Box<dyn ToolConfig>, DecodeError> {
    let mut config: SqliteSqlConfig = serde_yaml::from_value(entry.clone())?;
    config.name = name.to_string();
    Ok(Box::new(config))
}

impl ToolConfig for SqliteSqlConfig {
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

        for parameter in self.parameters.iter().chain(self.template_parameters.iter()) {
            parameter.validate_declaration()?;
        }
        let (all_params, manifest_params, schema) =
            process_parameters(&self.parameters, &self.template_parameters);

        Ok(Arc::new(SqliteSqlTool {
            name: self.name.clone(),
            statement: self.statement.clone(),
            auth_required: self.auth_required.clone(),
            parameters: self.parameters.clone(),
            template_parameters: self.template_parameters.clone(),
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

/// A configured sqlite statement bound to its source.
pub struct SqliteSqlTool {
    name: String,
    statement: String,
    auth_required: Vec<String>,
    parameters: Vec<Parameter>,
    template_parameters: Vec<Parameter>,
    all_params: Vec<Parameter>,
    connection: Arc<Mutex<Connection>>,
    manifest: Manifest,
    mcp_manifest: McpManifest,
}

#[async_trait]
impl Tool for SqliteSqlTool {
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
        let resolved = params.as_map();
        let statement = resolve_template_params(
            &self.template_parameters,
            &self.statement,
            &resolved,
        )
        .map_err(|err| InvokeError::InvalidParams(format!("unable to resolve template params: {err}")))?;
        let binds = bind_values(&self.parameters, &resolved)
            .map_err(|err| InvokeError::InvalidParams(format!("unable to extract bind params: {err}")))?;
        run_statement(Arc::clone(&self.connection), statement, binds).await
    }

    fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    fn mcp_manifest(&self) -> &McpManifest {
        &self.mcp_manifest
    }
}

// ============================================================================
// SECTION: Execution
// ============================================================================

/// Runs a statement on the blocking pool and shapes the result set.
pub(crate) async fn run_statement(
    connection: Arc<Mutex<Connection>>,
    statement: String,
    binds: ParamValues,
) -> Result<Value, InvokeError> {
    tokio::task::spawn_blocking(move || execute_blocking(&connection, &statement, &binds))
        .await
        .map_err(|err| InvokeError::Failed(format!("query task failed: {err}")))?
}

fn execute_blocking(
    connection: &Mutex<Connection>,
    statement: &str,
    binds: &ParamValues,
) -> Result<Value, InvokeError> {
    let connection = connection
        .lock()
        .map_err(|_| InvokeError::Failed("sqlite connection poisoned".to_string()))?;
    let mut prepared = connection
        .prepare(statement)
        .map_err(|err| InvokeError::Failed(format!("unable to prepare statement: {err}")))?;
    let columns: Vec<String> = prepared.column_names().iter().map(ToString::to_string).collect();
    let produces_rows = !columns.is_empty();

    for (index, bind) in binds.iter().enumerate() {
        prepared
            .raw_bind_parameter(index + 1, sql_value(&bind.value))
            .map_err(|err| {
                InvokeError::Failed(format!("unable to bind parameter {:?}: {err}", bind.name))
            })?;
    }

    let mut raw_rows = prepared.raw_query();
    let mut rows = Vec::new();
    loop {
        match raw_rows.next() {
            Ok(Some(row)) => {
                let mut object = Map::new();
                for (index, column) in columns.iter().enumerate() {
                    let value = row.get_ref(index).map_err(|err| {
                        InvokeError::Failed(format!("unable to read column {column:?}: {err}"))
                    })?;
                    object.insert(column.clone(), json_value(value));
                }
                rows.push(object);
            }
            Ok(None) => break,
            Err(err) => {
                return Err(InvokeError::Failed(format!(
                    "errors encountered during row iteration: {err}"
                )));
            }
        }
    }

    Ok(rows_result(rows, produces_rows))
}

/// Marshals a JSON argument into a sqlite bind value.
fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                SqlValue::Integer(i)
            } else {
                SqlValue::Real(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => SqlValue::Text(s.clone()),
        // Compound values bind as their JSON text.
        other => SqlValue::Text(other.to_string()),
    }
}

/// Normalizes a sqlite column value into JSON.
fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Value::from(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => bytes_to_text(bytes),
    }
}
