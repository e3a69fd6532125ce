// toolgate-backends/src/sources/sqlite.rs
// ============================================================================
// Module: SQLite Source
// Description: Shared SQLite connection for sqlite-backed tools.
// Purpose: Open the database once and hand tools a task-safe handle.
// Dependencies: toolgate-core, rusqlite, tokio
// ============================================================================

//! ## Overview
//! The sqlite source opens its database file at configuration load and
//! verifies connectivity with a probe query. `rusqlite` connections are not
//! task-safe, so the handle lives behind a mutex and every statement runs on
//! the blocking thread pool.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
use serde::Deserialize;
use toolgate_core::DecodeError;
use toolgate_core::Source;
use toolgate_core::SourceConfig;
use toolgate_core::SourceError;

/// Kind identifier for sqlite sources.
pub const SOURCE_KIND: &str = "sqlite";

// ============================================================================
// SECTION: Config
// ============================================================================

/// Decoded `sources` entry for a sqlite database.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SqliteSourceConfig {
    /// Entry name, injected by the loader.
    #[serde(skip)]
    pub name: String,
    /// Kind discriminator from the entry.
    pub kind: String,
    /// Database path; `:memory:` opens a private in-memory database.
    pub database: String,
}

/// Factory registered for the `sqlite` kind.
///
/// # Errors
///
/// Returns [`DecodeError`] when the entry has unknown or missing fields.
pub fn configure(
    name: &str,
    entry: &serde_yaml::Value,
) -> Result<Box<dyn SourceConfig>, DecodeError> {
    let mut config: SqliteSourceConfig = serde_yaml::from_value(entry.clone())?;
    config.name = name.to_string();
    Ok(Box::new(config))
}

#[async_trait]
impl SourceConfig for SqliteSourceConfig {
    fn kind(&self) -> &'static str {
        SOURCE_KIND
    }

    async fn initialize(&self) -> Result<Arc<dyn Source>, SourceError> {
        let database = self.database.clone();
        let name = self.name.clone();
        let connection = tokio::task::spawn_blocking(move || open_database(&database))
            .await
            .map_err(|err| SourceError::Connect(err.to_string()))??;
        Ok(Arc::new(SqliteSource {
            name,
            connection: Arc::new(Mutex::new(connection)),
        }))
    }
}

/// Opens the database and runs the connectivity probe.
fn open_database(database: &str) -> Result<Connection, SourceError> {
    let connection =
        Connection::open(database).map_err(|err| SourceError::Connect(err.to_string()))?;
    connection
        .query_row("SELECT 1", [], |_| Ok(()))
        .map_err(|err| SourceError::Connect(err.to_string()))?;
    Ok(connection)
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Long-lived sqlite handle shared by every bound tool.
pub struct SqliteSource {
    /// Configured source name.
    pub name: String,
    /// Shared connection; statements serialize through the mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSource {
    /// Shared connection handle for bound tools.
    #[must_use]
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.connection)
    }
}

impl Source for SqliteSource {
    fn kind(&self) -> &'static str {
        SOURCE_KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
