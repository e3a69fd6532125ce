// toolgate-core/src/registry.rs
// ============================================================================
// Module: Kind Registry
// Description: Tables mapping kind identifiers to source/tool/auth factories.
// Purpose: Let the configuration loader dispatch entries to concrete kinds.
// Dependencies: serde_yaml, thiserror
// ============================================================================

//! ## Overview
//! The registry is an explicit value constructed early in `main`; each
//! built-in kind registers through a top-level call rather than a module
//! initializer, so tests can start from an empty registry and registration
//! order is visible. `register_*` returns `false` on a duplicate kind; the
//! built-in registration path treats that as programmer error and panics.
//! After startup the registry is read-only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use thiserror::Error;

use crate::auth::AuthServiceConfig;
use crate::source::SourceConfig;
use crate::tool::ToolConfig;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure to decode a configuration entry inside a factory.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl From<serde_yaml::Error> for DecodeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self(err.to_string())
    }
}

/// Registry lookup failures surfaced during configuration load.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No factory is installed for the requested kind.
    #[error("unknown {family} kind {kind:?}")]
    UnknownKind {
        /// Factory family: `source`, `tool`, or `authService`.
        family: &'static str,
        /// The kind identifier from the configuration entry.
        kind: String,
    },
}

// ============================================================================
// SECTION: Factories
// ============================================================================

/// Decodes a `sources` entry into a kind-specific configuration.
pub type SourceFactory =
    fn(name: &str, entry: &serde_yaml::Value) -> Result<Box<dyn SourceConfig>, DecodeError>;

/// Decodes a `tools` entry into a kind-specific configuration.
pub type ToolFactory =
    fn(name: &str, entry: &serde_yaml::Value) -> Result<Box<dyn ToolConfig>, DecodeError>;

/// Decodes an `authServices` entry into a kind-specific configuration.
pub type AuthServiceFactory =
    fn(name: &str, entry: &serde_yaml::Value) -> Result<Box<dyn AuthServiceConfig>, DecodeError>;

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Kind-identifier tables for sources, tools, and auth services.
#[derive(Default)]
pub struct Registry {
    /// Source factories keyed by kind.
    sources: BTreeMap<&'static str, SourceFactory>,
    /// Tool factories keyed by kind.
    tools: BTreeMap<&'static str, ToolFactory>,
    /// Auth-service factories keyed by kind.
    auth_services: BTreeMap<&'static str, AuthServiceFactory>,
}

impl Registry {
    /// Builds an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a source factory. Returns `false` when the kind is taken.
    #[must_use]
    pub fn register_source(&mut self, kind: &'static str, factory: SourceFactory) -> bool {
        self.sources.insert(kind, factory).is_none()
    }

    /// Installs a tool factory. Returns `false` when the kind is taken.
    #[must_use]
    pub fn register_tool(&mut self, kind: &'static str, factory: ToolFactory) -> bool {
        self.tools.insert(kind, factory).is_none()
    }

    /// Installs an auth-service factory. Returns `false` when the kind is
    /// taken.
    #[must_use]
    pub fn register_auth_service(
        &mut self,
        kind: &'static str,
        factory: AuthServiceFactory,
    ) -> bool {
        self.auth_services.insert(kind, factory).is_none()
    }

    /// Looks up the source factory for a configured kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownKind`] when no factory is installed.
    pub fn source_factory(&self, kind: &str) -> Result<SourceFactory, RegistryError> {
        self.sources.get(kind).copied().ok_or_else(|| RegistryError::UnknownKind {
            family: "source",
            kind: kind.to_string(),
        })
    }

    /// Looks up the tool factory for a configured kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownKind`] when no factory is installed.
    pub fn tool_factory(&self, kind: &str) -> Result<ToolFactory, RegistryError> {
        self.tools.get(kind).copied().ok_or_else(|| RegistryError::UnknownKind {
            family: "tool",
            kind: kind.to_string(),
        })
    }

    /// Looks up the auth-service factory for a configured kind.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownKind`] when no factory is installed.
    pub fn auth_service_factory(&self, kind: &str) -> Result<AuthServiceFactory, RegistryError> {
        self.auth_services.get(kind).copied().ok_or_else(|| RegistryError::UnknownKind {
            family: "authService",
            kind: kind.to_string(),
        })
    }

    /// Registered source kinds in sorted order.
    pub fn source_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.sources.keys().copied()
    }

    /// Registered tool kinds in sorted order.
    pub fn tool_kinds(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tools.keys().copied()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("sources", &self.sources.keys().collect::<Vec<_>>())
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .field("auth_services", &self.auth_services.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests;
