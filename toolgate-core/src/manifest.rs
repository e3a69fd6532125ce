// toolgate-core/src/manifest.rs
// ============================================================================
// Module: Tool Manifests
// Description: Immutable per-tool descriptions for catalog surfaces.
// Purpose: Serve the HTTP catalog and the agent tools/list method.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every tool precomputes two manifests at configuration load: a human
//! manifest served by the HTTP catalog endpoint, and an agent manifest whose
//! `inputSchema` is a JSON-Schema object describing accepted arguments.
//! Claim-sourced parameters are omitted from the agent schema because the
//! caller must not supply them.

use std::collections::BTreeMap;

use serde::Serialize;

// ============================================================================
// SECTION: Human Manifest
// ============================================================================

/// Catalog entry for one declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterManifest {
    /// Parameter name.
    pub name: String,
    /// Declared kind label.
    #[serde(rename = "type")]
    pub param_type: &'static str,
    /// Human/agent description.
    pub description: String,
    /// Whether the caller must supply a value.
    pub required: bool,
    /// Auth services permitted to supply this value.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub auth_sources: Vec<String>,
    /// Element schema for array parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<McpPropertySchema>>,
    /// Whether object values accept undeclared keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
}

/// Human manifest served by the HTTP catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Tool description.
    pub description: String,
    /// Declared parameters in declaration order.
    pub parameters: Vec<ParameterManifest>,
    /// Auth services that may authorize calls to this tool.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub auth_required: Vec<String>,
}

// ============================================================================
// SECTION: Agent Manifest
// ============================================================================

/// JSON-Schema property in the agent input schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McpPropertySchema {
    /// JSON-Schema type label.
    #[serde(rename = "type")]
    pub param_type: &'static str,
    /// Property description.
    pub description: String,
    /// Element schema for arrays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<McpPropertySchema>>,
    /// Whether object values accept undeclared keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<bool>,
}

/// JSON-Schema object describing a tool's accepted arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct McpToolsSchema {
    /// Always `"object"`.
    #[serde(rename = "type")]
    pub schema_type: &'static str,
    /// Accepted argument properties keyed by name.
    pub properties: BTreeMap<String, McpPropertySchema>,
    /// Names the caller must supply.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// Agent manifest entry for the `tools/list` method.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct McpManifest {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// Accepted-argument schema.
    pub input_schema: McpToolsSchema,
}
