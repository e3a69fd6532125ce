// toolgate-core/src/source.rs
// ============================================================================
// Module: Source Contract
// Description: Long-lived backend handles produced by source factories.
// Purpose: Define the lifecycle and compatibility surface for backends.
// Dependencies: async-trait, thiserror
// ============================================================================

//! ## Overview
//! A source is a named, initialized backend handle: a connection pool, a
//! shared connection, or an API client. Sources are created once at
//! configuration load (after a connectivity check for network backends),
//! shared across concurrent invocations, and held for the process lifetime.
//! Tools identify acceptable backings by downcasting to the concrete source
//! type they require; a mismatch is a configuration error reported at load.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Source initialization failures (configuration-time).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The backend rejected the configured connection settings.
    #[error("unable to connect successfully: {0}")]
    Connect(String),
    /// The configured settings are invalid before any connection attempt.
    #[error("invalid source configuration: {0}")]
    Config(String),
}

// ============================================================================
// SECTION: Contracts
// ============================================================================

/// A named, long-lived backend handle.
pub trait Source: Send + Sync + 'static {
    /// Kind identifier of this source.
    fn kind(&self) -> &'static str;

    /// Concrete-type access for tool compatibility checks.
    fn as_any(&self) -> &dyn Any;
}

impl std::fmt::Debug for dyn Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source").field("kind", &self.kind()).finish()
    }
}

/// Decoded `sources` entry, ready to initialize.
#[async_trait]
pub trait SourceConfig: Send + Sync {
    /// Kind identifier of this entry.
    fn kind(&self) -> &'static str;

    /// Opens the backend handle and verifies connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the backend is unreachable or the
    /// configuration is invalid.
    async fn initialize(&self) -> Result<Arc<dyn Source>, SourceError>;
}
