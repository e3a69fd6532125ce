// toolgate-core/src/lib.rs
// ============================================================================
// Module: Toolgate Core
// Description: Shared contracts for sources, tools, auth services, and params.
// Purpose: Define the registration and invocation machinery every kind uses.
// Dependencies: serde, serde_json, serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! Toolgate exposes a curated catalog of named tools over JSON-RPC and HTTP.
//! This crate defines the shared machinery: the kind registry that maps kind
//! identifiers to factories, the parameter model (declaration, coercion,
//! claim-sourced injection, template substitution), the auth-service
//! contract, and the source/tool interfaces every concrete backend
//! implements. Security posture: all request inputs are untrusted and must
//! be validated before they reach a driver.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod manifest;
pub mod params;
pub mod registry;
pub mod source;
pub mod template;
pub mod tool;
pub mod toolset;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use auth::AuthInitError;
pub use auth::AuthService;
pub use auth::AuthServiceConfig;
pub use auth::AuthServiceError;
pub use auth::Claims;
pub use auth::ClaimsMap;
pub use auth::token_header_name;
pub use manifest::Manifest;
pub use manifest::McpManifest;
pub use manifest::McpPropertySchema;
pub use manifest::McpToolsSchema;
pub use manifest::ParameterManifest;
pub use params::ItemSchema;
pub use params::ParamError;
pub use params::ParamValue;
pub use params::ParamValues;
pub use params::Parameter;
pub use params::ParameterType;
pub use params::bind_values;
pub use params::parse_params;
pub use params::process_parameters;
pub use registry::DecodeError;
pub use registry::Registry;
pub use registry::RegistryError;
pub use source::Source;
pub use source::SourceConfig;
pub use source::SourceError;
pub use template::TemplateError;
pub use template::resolve_template_params;
pub use tool::AccessToken;
pub use tool::InvokeError;
pub use tool::Tool;
pub use tool::ToolConfig;
pub use tool::ToolInitError;
pub use tool::is_authorized;
pub use toolset::Toolset;
pub use toolset::ToolsetError;
