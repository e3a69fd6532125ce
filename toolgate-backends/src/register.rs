// toolgate-backends/src/register.rs
// ============================================================================
// Module: Builtin Registration
// Description: Installs every shipped kind into an explicit registry.
// Purpose: Give main one call that wires the built-in kind tables.
// Dependencies: toolgate-core
// ============================================================================

//! ## Overview
//! Registration happens through one explicit call from `main` rather than
//! module-initialization side effects, so startup ordering is visible and
//! tests can build registries with only the kinds they need. A duplicate
//! kind is programmer error, never runtime input, and aborts immediately.

use toolgate_core::Registry;

use crate::auth_services::api_key;
use crate::sources;
use crate::tools;

/// Installs every built-in source, tool, and auth-service kind.
///
/// # Panics
///
/// Panics when a kind identifier is already registered; two kinds sharing
/// an identifier is a programming mistake caught at startup.
pub fn register_builtins(registry: &mut Registry) {
    let source_kinds: &[(&'static str, toolgate_core::registry::SourceFactory)] = &[
        (sources::sqlite::SOURCE_KIND, sources::sqlite::configure),
        (sources::postgres::SOURCE_KIND, sources::postgres::configure),
        (sources::http::SOURCE_KIND, sources::http::configure),
    ];
    for (kind, factory) in source_kinds {
        assert!(
            registry.register_source(kind, *factory),
            "source kind {kind:?} already registered"
        );
    }

    let tool_kinds: &[(&'static str, toolgate_core::registry::ToolFactory)] = &[
        (tools::sqlite_sql::KIND, tools::sqlite_sql::configure),
        (tools::sqlite_execute_sql::KIND, tools::sqlite_execute_sql::configure),
        (tools::postgres_sql::KIND, tools::postgres_sql::configure),
        (tools::postgres_execute_sql::KIND, tools::postgres_execute_sql::configure),
        (tools::http::KIND, tools::http::configure),
    ];
    for (kind, factory) in tool_kinds {
        assert!(registry.register_tool(kind, *factory), "tool kind {kind:?} already registered");
    }

    assert!(
        registry.register_auth_service(api_key::KIND, api_key::configure),
        "auth service kind {:?} already registered",
        api_key::KIND
    );
}
