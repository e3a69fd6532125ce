// toolgate-config/src/lib.rs
// ============================================================================
// Module: Toolgate Configuration
// Description: Configuration document loading and runtime wiring.
// Purpose: Turn a YAML document into initialized sources, tools, toolsets.
// Dependencies: toolgate-core, serde, serde_yaml
// ============================================================================

//! ## Overview
//! Operators declare sources, auth services, tools, and toolsets in one
//! YAML document. Loading is strict and fail-closed: unknown fields are
//! rejected, kind identifiers must resolve against the registry, sources
//! must pass their connectivity checks, and every toolset member must
//! exist. The loader produces an immutable [`Gateway`] holding initialized
//! backends and precomputed manifests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::Gateway;
pub use config::ToolsFile;
pub use config::load_file;
pub use config::load_str;
