// toolgate-config/tests/load_validation.rs
// ============================================================================
// Module: Config Load Tests
// Description: Validation tests for the configuration loader.
// Purpose: Ensure strict decoding, factory dispatch, and wiring checks.
// Dependencies: toolgate-backends, toolgate-config, toolgate-core, tokio
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test-only assertions favor direct unwrap/expect for clarity."
)]

use toolgate_backends::register_builtins;
use toolgate_config::ConfigError;
use toolgate_config::ToolsFile;
use toolgate_config::load_str;
use toolgate_core::Registry;

fn registry() -> Registry {
    let mut registry = Registry::new();
    register_builtins(&mut registry);
    registry
}

const VALID_DOCUMENT: &str = r#"
sources:
  my-db:
    kind: sqlite
    database: ":memory:"
authServices:
  google:
    kind: api-key
    keys:
      - key: supersecret
        claims:
          email: alice@example.com
tools:
  sel1:
    kind: sqlite-sql
    source: my-db
    description: select one
    statement: SELECT 1
  run-sql:
    kind: sqlite-execute-sql
    source: my-db
    description: run arbitrary sql
    authRequired:
      - google
toolsets:
  reporting:
    - sel1
"#;

#[tokio::test]
async fn valid_document_loads_and_wires_everything() {
    let gateway = load_str(VALID_DOCUMENT, &registry()).await.unwrap();
    assert_eq!(gateway.sources.len(), 1);
    assert_eq!(gateway.auth_services.len(), 1);
    assert_eq!(gateway.tools.len(), 2);

    // Named toolset plus the implicit default.
    assert_eq!(gateway.toolsets.len(), 2);
    let default = gateway.toolsets.get("").unwrap();
    assert_eq!(default.tool_names, ["run-sql", "sel1"]);
    let reporting = gateway.toolsets.get("reporting").unwrap();
    assert_eq!(reporting.mcp_manifests.len(), 1);
    assert_eq!(reporting.mcp_manifests[0].name, "sel1");
}

#[tokio::test]
async fn unknown_top_level_field_is_rejected() {
    let err = load_str("gadgets: {}", &registry()).await.unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "unexpected error: {err}");
    assert!(err.to_string().contains("gadgets"), "unexpected error: {err}");
}

#[tokio::test]
async fn unknown_kind_names_the_entry_path() {
    let document = r#"
sources:
  my-db:
    kind: oracle
    database: ":memory:"
"#;
    let err = load_str(document, &registry()).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("sources.my-db"), "unexpected error: {message}");
    assert!(message.contains("unknown source kind \"oracle\""), "unexpected error: {message}");
}

#[tokio::test]
async fn missing_kind_names_the_entry_path() {
    let document = r#"
tools:
  sel1:
    source: my-db
"#;
    let err = load_str(document, &registry()).await.unwrap_err();
    assert!(err.to_string().contains("tools.sel1"), "unexpected error: {err}");
    assert!(err.to_string().contains("missing required field `kind`"), "unexpected: {err}");
}

#[tokio::test]
async fn unknown_entry_field_names_the_entry_path() {
    let document = r#"
sources:
  my-db:
    kind: sqlite
    database: ":memory:"
    wal: true
"#;
    let err = load_str(document, &registry()).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("sources.my-db"), "unexpected error: {message}");
    assert!(message.contains("wal"), "unexpected error: {message}");
}

#[tokio::test]
async fn missing_required_entry_field_names_the_entry_path() {
    let document = r#"
tools:
  sel1:
    kind: sqlite-sql
    source: my-db
    statement: SELECT 1
"#;
    let err = load_str(document, &registry()).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("tools.sel1"), "unexpected error: {message}");
    assert!(message.contains("description"), "unexpected error: {message}");
}

#[tokio::test]
async fn tool_bound_to_missing_source_fails() {
    let document = r#"
tools:
  sel1:
    kind: sqlite-sql
    source: ghost-db
    description: select one
    statement: SELECT 1
"#;
    let err = load_str(document, &registry()).await.unwrap_err();
    assert!(
        err.to_string().contains("no source named \"ghost-db\" configured"),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn toolset_with_unknown_member_fails() {
    let document = r#"
sources:
  my-db:
    kind: sqlite
    database: ":memory:"
tools:
  sel1:
    kind: sqlite-sql
    source: my-db
    description: select one
    statement: SELECT 1
toolsets:
  reporting:
    - sel1
    - ghost
"#;
    let err = load_str(document, &registry()).await.unwrap_err();
    assert!(err.to_string().contains("ghost"), "unexpected error: {err}");
}

#[tokio::test]
async fn unreachable_source_aborts_the_load() {
    let document = r#"
sources:
  my-db:
    kind: sqlite
    database: /nonexistent/path/into/nowhere.db
"#;
    let err = load_str(document, &registry()).await.unwrap_err();
    assert!(matches!(err, ConfigError::Source { .. }), "unexpected error: {err}");
}

#[test]
fn document_round_trips_modulo_key_order() {
    let first = ToolsFile::parse(VALID_DOCUMENT).unwrap();
    let encoded = serde_yaml::to_string(&first).unwrap();
    let second = ToolsFile::parse(&encoded).unwrap();
    assert_eq!(first.sources, second.sources);
    assert_eq!(first.auth_services, second.auth_services);
    assert_eq!(first.tools, second.tools);
    assert_eq!(first.toolsets, second.toolsets);
}
