// toolgate-backends/tests/sqlite_tools.rs
// ============================================================================
// Module: SQLite Tool Tests
// Description: End-to-end tests for the sqlite source and tool kinds.
// Purpose: Exercise binding, templates, and row normalization on a real db.
// Dependencies: toolgate-backends, toolgate-core, tokio
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use serde_json::json;
use toolgate_backends::NO_CONTENT_MESSAGE;
use toolgate_backends::NO_ROWS_MESSAGE;
use toolgate_backends::sources::sqlite;
use toolgate_backends::tools::sqlite_execute_sql;
use toolgate_backends::tools::sqlite_sql;
use toolgate_core::AccessToken;
use toolgate_core::ClaimsMap;
use toolgate_core::Source;
use toolgate_core::Tool;

async fn memory_source() -> BTreeMap<String, Arc<dyn Source>> {
    let entry: serde_yaml::Value =
        serde_yaml::from_str("kind: sqlite\ndatabase: \":memory:\"").unwrap();
    let config = sqlite::configure("db", &entry).unwrap();
    let source = config.initialize().await.unwrap();
    let mut sources = BTreeMap::new();
    sources.insert("db".to_string(), source);
    sources
}

fn sql_tool(
    sources: &BTreeMap<String, Arc<dyn Source>>,
    yaml: &str,
) -> Arc<dyn Tool> {
    let entry: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
    let config = sqlite_sql::configure("my-tool", &entry).unwrap();
    config.initialize(sources).unwrap()
}

fn execute_tool(sources: &BTreeMap<String, Arc<dyn Source>>) -> Arc<dyn Tool> {
    let entry: serde_yaml::Value = serde_yaml::from_str(
        "kind: sqlite-execute-sql\nsource: db\ndescription: run sql",
    )
    .unwrap();
    let config = sqlite_execute_sql::configure("exec", &entry).unwrap();
    config.initialize(sources).unwrap()
}

async fn run(tool: &Arc<dyn Tool>, arguments: Value) -> Result<Value, toolgate_core::InvokeError> {
    let Value::Object(data) = arguments else {
        panic!("arguments must be an object");
    };
    let params = tool.parse_params(&data, &ClaimsMap::new()).unwrap();
    tool.invoke(params, AccessToken::default()).await
}

async fn seed(sources: &BTreeMap<String, Arc<dyn Source>>) {
    let exec = execute_tool(sources);
    let ddl = run(
        &exec,
        json!({"sql": "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, email TEXT)"}),
    )
    .await
    .unwrap();
    assert_eq!(ddl, json!(NO_CONTENT_MESSAGE));
    run(
        &exec,
        json!({"sql": "INSERT INTO t (id, name, email) VALUES \
            (1, 'Alice', 'alice@example.com'), (3, 'Bob', NULL)"}),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn select_one_returns_a_single_row_object() {
    let sources = memory_source().await;
    let tool = sql_tool(
        &sources,
        "kind: sqlite-sql\nsource: db\ndescription: select one\nstatement: SELECT 1",
    );
    let result = run(&tool, json!({})).await.unwrap();
    assert_eq!(result, json!([{"1": 1}]));
}

#[tokio::test]
async fn bind_parameters_resolve_positionally() {
    let sources = memory_source().await;
    seed(&sources).await;
    let tool = sql_tool(
        &sources,
        r"
        kind: sqlite-sql
        source: db
        description: row by id
        statement: SELECT id, name FROM t WHERE id = ?1
        parameters:
          - name: id
            type: integer
            description: row id
        ",
    );
    let result = run(&tool, json!({"id": 3})).await.unwrap();
    assert_eq!(result, json!([{"id": 3, "name": "Bob"}]));
}

#[tokio::test]
async fn null_columns_stay_null() {
    let sources = memory_source().await;
    seed(&sources).await;
    let tool = sql_tool(
        &sources,
        r"
        kind: sqlite-sql
        source: db
        description: row with null email
        statement: SELECT name, email FROM t WHERE id = ?1
        parameters:
          - name: id
            type: integer
            description: row id
        ",
    );
    let result = run(&tool, json!({"id": 3})).await.unwrap();
    assert_eq!(result, json!([{"name": "Bob", "email": null}]));
}

#[tokio::test]
async fn zero_rows_surface_the_sentinel() {
    let sources = memory_source().await;
    seed(&sources).await;
    let tool = sql_tool(
        &sources,
        r"
        kind: sqlite-sql
        source: db
        description: row by id
        statement: SELECT id FROM t WHERE id = ?1
        parameters:
          - name: id
            type: integer
            description: row id
        ",
    );
    let result = run(&tool, json!({"id": 999})).await.unwrap();
    assert_eq!(result, json!(NO_ROWS_MESSAGE));
}

#[tokio::test]
async fn template_parameters_substitute_identifiers_only() {
    let sources = memory_source().await;
    seed(&sources).await;
    let tool = sql_tool(
        &sources,
        r"
        kind: sqlite-sql
        source: db
        description: list a table
        statement: 'SELECT id, name FROM {{.tableName}} WHERE id = ?1'
        parameters:
          - name: id
            type: integer
            description: row id
        templateParameters:
          - name: tableName
            type: string
            description: table to query
        ",
    );
    let result = run(&tool, json!({"tableName": "t", "id": 1})).await.unwrap();
    assert_eq!(result, json!([{"id": 1, "name": "Alice"}]));

    let err = run(&tool, json!({"tableName": "t; DROP TABLE t", "id": 1})).await.unwrap_err();
    assert!(err.to_string().contains("not a valid identifier"), "unexpected error: {err}");
}

#[tokio::test]
async fn driver_errors_surface_as_invocation_failures() {
    let sources = memory_source().await;
    let exec = execute_tool(&sources);
    let err = run(&exec, json!({"sql": "SELEC 1"})).await.unwrap_err();
    assert!(err.to_string().contains("unable to prepare statement"), "unexpected error: {err}");
}

#[tokio::test]
async fn incompatible_source_is_a_configuration_error() {
    let sources = memory_source().await;
    let entry: serde_yaml::Value = serde_yaml::from_str(
        "kind: postgres-sql\nsource: db\ndescription: wrong backend\nstatement: SELECT 1",
    )
    .unwrap();
    let config = toolgate_backends::tools::postgres_sql::configure("bad", &entry).unwrap();
    let err = config.initialize(&sources).unwrap_err();
    assert!(
        err.to_string().contains("source kind must be one of"),
        "unexpected error: {err}"
    );
}
