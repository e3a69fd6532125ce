// toolgate-core/src/toolset.rs
// ============================================================================
// Module: Toolsets
// Description: Named groupings of tools with precomputed manifests.
// Purpose: Serve catalog-discovery methods without per-request assembly.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! A toolset is a named, ordered list of tool names. Both manifest surfaces
//! are precomputed at configuration load: the agent manifest array backing
//! `tools/list` and the human manifest map backing the HTTP catalog. The
//! default toolset has the empty name and contains every configured tool in
//! declaration order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::manifest::Manifest;
use crate::manifest::McpManifest;
use crate::tool::Tool;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Toolset wiring failures (configuration-time).
#[derive(Debug, Error)]
pub enum ToolsetError {
    /// The toolset references a tool that is not configured.
    #[error("toolset {toolset:?} references unknown tool {tool:?}")]
    UnknownTool {
        /// Toolset name.
        toolset: String,
        /// Missing tool name.
        tool: String,
    },
    /// The toolset lists the same tool twice.
    #[error("toolset {toolset:?} lists tool {tool:?} more than once")]
    DuplicateTool {
        /// Toolset name.
        toolset: String,
        /// Repeated tool name.
        tool: String,
    },
}

// ============================================================================
// SECTION: Toolset
// ============================================================================

/// A named, ordered collection of tools exposed as one manifest.
#[derive(Debug, Clone)]
pub struct Toolset {
    /// Toolset name; empty for the default all-tools set.
    pub name: String,
    /// Member tool names in declaration order.
    pub tool_names: Vec<String>,
    /// Precomputed agent manifests for `tools/list`.
    pub mcp_manifests: Vec<McpManifest>,
    /// Precomputed human manifests for the HTTP catalog.
    pub manifests: BTreeMap<String, Manifest>,
}

impl Toolset {
    /// Assembles a toolset from configured tools, precomputing both
    /// manifest surfaces.
    ///
    /// # Errors
    ///
    /// Returns [`ToolsetError`] when a member is unknown or repeated.
    pub fn new(
        name: impl Into<String>,
        tool_names: Vec<String>,
        tools: &BTreeMap<String, Arc<dyn Tool>>,
    ) -> Result<Self, ToolsetError> {
        let name = name.into();
        let mut mcp_manifests = Vec::with_capacity(tool_names.len());
        let mut manifests = BTreeMap::new();
        for tool_name in &tool_names {
            let Some(tool) = tools.get(tool_name) else {
                return Err(ToolsetError::UnknownTool {
                    toolset: name.clone(),
                    tool: tool_name.clone(),
                });
            };
            if manifests.insert(tool_name.clone(), tool.manifest().clone()).is_some() {
                return Err(ToolsetError::DuplicateTool {
                    toolset: name.clone(),
                    tool: tool_name.clone(),
                });
            }
            mcp_manifests.push(tool.mcp_manifest().clone());
        }
        Ok(Self {
            name,
            tool_names,
            mcp_manifests,
            manifests,
        })
    }
}
