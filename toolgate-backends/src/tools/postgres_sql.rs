// toolgate-backends/src/tools/postgres_sql.rs
// ============================================================================
// Module: postgres-sql Tool
// Description: Configured SQL statement executed against a postgres source.
// Purpose: Bind declared parameters positionally and shape driver rows.
// Dependencies: toolgate-core, postgres, serde_json, tokio
// ============================================================================

//! ## Overview
//! The `postgres-sql` tool runs an operator-configured statement with `$N`
//! positional binds. Template parameters resolve first under the restricted
//! identifier grammar. Each invocation checks a connection out of the
//! source's pool on the blocking thread pool; the source's `queryTimeout`
//! bounds the wait for a result, with the discarded query left to the
//! server's own cancellation policies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use postgres::Column;
use postgres::Row;
use postgres::types::ToSql;
use postgres::types::Type;
use serde::Deserialize;
use serde_json::Map;
use serde_json::Number;
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
use crate::sources::postgres::PostgresPool;
use crate::sources::postgres::PostgresSource;

/// Kind identifier for this tool family.
pub const KIND: &str = "postgres-sql";

/// Source kinds accepted by this tool family.
const COMPATIBLE_SOURCES: &[&str] = &[crate::sources::postgres::SOURCE_KIND];

// ============================================================================
// SECTION: Config
// ============================================================================

/// Decoded `tools` entry for a configured postgres statement.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PostgresSqlConfig {
    /// Entry name, injected by the loader.
    #[serde(skip)]
    pub name: String,
    /// Kind discriminator from the entry.
    pub kind: String,
    /// Name of the bound source.
    pub source: String,
    /// Tool description surfaced in manifests.
    pub description: String,
    /// Statement template with `$N` binds and template placeholders.
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

/// Factory registered for the `postgres-sql` kind.
///
/// # Errors
///
/// Returns [`DecodeError`] when the entry has unknown or missing fields.
pub fn configure(name: &str, entry: &serde_yaml::Value) -> Result<Box<dyn ToolConfig>, DecodeError> {
    let mut config: PostgresSqlConfig = serde_yaml::from_value(entry.clone())?;
    config.name = name.to_string();
    Ok(Box::new(config))
}

impl ToolConfig for PostgresSqlConfig {
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
        let Some(postgres) = source.as_any().downcast_ref::<PostgresSource>() else {
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

        Ok(Arc::new(PostgresSqlTool {
            name: self.name.clone(),
            statement: self.statement.clone(),
            auth_required: self.auth_required.clone(),
            parameters: self.parameters.clone(),
            template_parameters: self.template_parameters.clone(),
            all_params,
            pool: postgres.pool(),
            query_timeout: postgres.query_timeout(),
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

/// A configured postgres statement bound to its source.
pub struct PostgresSqlTool {
    name: String,
    statement: String,
    auth_required: Vec<String>,
    parameters: Vec<Parameter>,
    template_parameters: Vec<Parameter>,
    all_params: Vec<Parameter>,
    pool: PostgresPool,
    query_timeout: Option<Duration>,
    manifest: Manifest,
    mcp_manifest: McpManifest,
}

#[async_trait]
impl Tool for PostgresSqlTool {
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
        run_statement(self.pool.clone(), statement, binds, self.query_timeout).await
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

/// Runs a statement on the blocking pool, bounded by the source timeout.
pub(crate) async fn run_statement(
    pool: PostgresPool,
    statement: String,
    binds: ParamValues,
    query_timeout: Option<Duration>,
) -> Result<Value, InvokeError> {
    let task = tokio::task::spawn_blocking(move || execute_blocking(&pool, &statement, &binds));
    let joined = match query_timeout {
        Some(timeout) => tokio::time::timeout(timeout, task).await.map_err(|_| {
            InvokeError::Failed(format!(
                "query exceeded the configured timeout of {}s",
                timeout.as_secs()
            ))
        })?,
        None => task.await,
    };
    joined.map_err(|err| InvokeError::Failed(format!("query task failed: {err}")))?
}

fn execute_blocking(
    pool: &PostgresPool,
    statement: &str,
    binds: &ParamValues,
) -> Result<Value, InvokeError> {
    let mut connection = pool
        .get()
        .map_err(|err| InvokeError::Failed(format!("unable to check out a connection: {err}")))?;

    let prepared = connection
        .prepare(statement)
        .map_err(|err| InvokeError::Failed(format!("unable to prepare statement: {err}")))?;
    // A statement without result columns (DDL, INSERT) never produces rows;
    // an empty column list distinguishes it from an empty SELECT.
    let produces_rows = !prepared.columns().is_empty();

    // The server infers a type for every placeholder; encode each bind at
    // the width the statement declares.
    let param_types = prepared.params();
    let mut owned_binds: Vec<Box<dyn ToSql + Sync>> = Vec::with_capacity(binds.len());
    for (index, bind) in binds.iter().enumerate() {
        owned_binds.push(sql_param(&bind.name, &bind.value, param_types.get(index))?);
    }
    let bind_refs: Vec<&(dyn ToSql + Sync)> =
        owned_binds.iter().map(AsRef::as_ref).collect();

    let rows = connection
        .query(&prepared, &bind_refs)
        .map_err(|err| InvokeError::Failed(format!("unable to execute query: {err}")))?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        out.push(row_object(row)?);
    }
    Ok(rows_result(out, produces_rows))
}

/// Normalizes one driver row into a JSON object keyed by column label.
fn row_object(row: &Row) -> Result<Map<String, Value>, InvokeError> {
    let mut object = Map::new();
    for (index, column) in row.columns().iter().enumerate() {
        object.insert(column.name().to_string(), column_value(row, index, column)?);
    }
    Ok(object)
}

/// Extracts one column by declared type, preserving nulls and integers.
fn column_value(row: &Row, index: usize, column: &Column) -> Result<Value, InvokeError> {
    let fail = |err: postgres::Error| {
        InvokeError::Failed(format!("unable to read column {:?}: {err}", column.name()))
    };
    let ty = column.type_();
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(index).map_err(fail)?.map(Value::from)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(index).map_err(fail)?.map(|v| Value::from(i64::from(v)))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(index).map_err(fail)?.map(|v| Value::from(i64::from(v)))
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(index).map_err(fail)?.map(Value::from)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(index)
            .map_err(fail)?
            .and_then(|v| Number::from_f64(f64::from(v)))
            .map(Value::Number)
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(index)
            .map_err(fail)?
            .and_then(Number::from_f64)
            .map(Value::Number)
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(index).map_err(fail)?.map(|v| bytes_to_text(&v))
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<Value>>(index).map_err(fail)?
    } else {
        row.try_get::<_, Option<String>>(index)
            .map_err(|err| {
                InvokeError::Failed(format!(
                    "unsupported column type {:?} for column {:?}: {err}",
                    ty.name(),
                    column.name()
                ))
            })?
            .map(Value::from)
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Marshals a JSON argument into a bind encoded for its placeholder type.
///
/// Integer tokens narrow to the placeholder's declared width; a value that
/// does not fit is a client error, not a driver error.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    reason = "floating placeholders accept the nearest representable value"
)]
fn sql_param(
    name: &str,
    value: &Value,
    ty: Option<&Type>,
) -> Result<Box<dyn ToSql + Sync>, InvokeError> {
    let overflow = |target: &str| {
        InvokeError::InvalidParams(format!("parameter {name:?} overflows the {target} bind"))
    };
    let bind: Box<dyn ToSql + Sync> = match value {
        Value::Null => null_param(ty),
        Value::Bool(b) => Box::new(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                match ty {
                    Some(t) if *t == Type::INT2 => {
                        Box::new(i16::try_from(i).map_err(|_| overflow("int2"))?)
                    }
                    Some(t) if *t == Type::INT4 => {
                        Box::new(i32::try_from(i).map_err(|_| overflow("int4"))?)
                    }
                    Some(t) if *t == Type::FLOAT4 => Box::new(i as f32),
                    Some(t) if *t == Type::FLOAT8 => Box::new(i as f64),
                    _ => Box::new(i),
                }
            } else {
                let f = n.as_f64().unwrap_or_default();
                match ty {
                    Some(t) if *t == Type::FLOAT4 => Box::new(f as f32),
                    _ => Box::new(f),
                }
            }
        }
        Value::String(s) => Box::new(s.clone()),
        // Compound values bind as JSONB.
        other => Box::new(other.clone()),
    };
    Ok(bind)
}

/// Typed null for a placeholder; the driver rejects untyped nulls where the
/// statement declares a concrete type.
fn null_param(ty: Option<&Type>) -> Box<dyn ToSql + Sync> {
    match ty {
        Some(t) if *t == Type::INT2 => Box::new(None::<i16>),
        Some(t) if *t == Type::INT4 => Box::new(None::<i32>),
        Some(t) if *t == Type::INT8 => Box::new(None::<i64>),
        Some(t) if *t == Type::FLOAT4 => Box::new(None::<f32>),
        Some(t) if *t == Type::FLOAT8 => Box::new(None::<f64>),
        Some(t) if *t == Type::BOOL => Box::new(None::<bool>),
        Some(t) if *t == Type::JSON || *t == Type::JSONB => Box::new(None::<Value>),
        _ => Box::new(None::<String>),
    }
}
