// toolgate-backends/src/sources/postgres.rs
// ============================================================================
// Module: PostgreSQL Source
// Description: Pooled PostgreSQL connections for postgres-backed tools.
// Purpose: Build the pool once, probe connectivity, and share it.
// Dependencies: toolgate-core, postgres, r2d2, tokio
// ============================================================================

//! ## Overview
//! The postgres source builds an `r2d2` pool over the blocking `postgres`
//! driver at configuration load and verifies connectivity with a probe
//! query. Tools check a connection out per invocation on the blocking pool,
//! so concurrent requests never contend on a single session. An optional
//! `queryTimeout` bounds each invocation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use postgres::NoTls;
use r2d2_postgres::PostgresConnectionManager;
use serde::Deserialize;
use toolgate_core::DecodeError;
use toolgate_core::Source;
use toolgate_core::SourceConfig;
use toolgate_core::SourceError;

/// Kind identifier for postgres sources.
pub const SOURCE_KIND: &str = "postgres";

/// Pool checkout timeout; a saturated pool fails the invocation instead of
/// queueing without bound.
const POOL_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared pool type for postgres-backed tools.
pub type PostgresPool = r2d2::Pool<PostgresConnectionManager<NoTls>>;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Decoded `sources` entry for a PostgreSQL database.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PostgresSourceConfig {
    /// Entry name, injected by the loader.
    #[serde(skip)]
    pub name: String,
    /// Kind discriminator from the entry.
    pub kind: String,
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Database name.
    pub database: String,
    /// Per-invocation timeout in seconds.
    #[serde(default)]
    pub query_timeout: Option<u64>,
}

/// Factory registered for the `postgres` kind.
///
/// # Errors
///
/// Returns [`DecodeError`] when the entry has unknown or missing fields.
pub fn configure(
    name: &str,
    entry: &serde_yaml::Value,
) -> Result<Box<dyn SourceConfig>, DecodeError> {
    let mut config: PostgresSourceConfig = serde_yaml::from_value(entry.clone())?;
    config.name = name.to_string();
    Ok(Box::new(config))
}

#[async_trait]
impl SourceConfig for PostgresSourceConfig {
    fn kind(&self) -> &'static str {
        SOURCE_KIND
    }

    async fn initialize(&self) -> Result<Arc<dyn Source>, SourceError> {
        let mut pg_config = postgres::Config::new();
        pg_config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password)
            .dbname(&self.database);
        let manager = PostgresConnectionManager::new(pg_config, NoTls);
        let pool = tokio::task::spawn_blocking(move || {
            let pool = r2d2::Pool::builder()
                .connection_timeout(POOL_CHECKOUT_TIMEOUT)
                .build(manager)
                .map_err(|err| SourceError::Connect(err.to_string()))?;
            // Connectivity probe; a bad DSN fails the load, not the first call.
            let mut connection =
                pool.get().map_err(|err| SourceError::Connect(err.to_string()))?;
            connection
                .simple_query("SELECT 1")
                .map_err(|err| SourceError::Connect(err.to_string()))?;
            Ok::<_, SourceError>(pool)
        })
        .await
        .map_err(|err| SourceError::Connect(err.to_string()))??;

        Ok(Arc::new(PostgresSource {
            name: self.name.clone(),
            pool,
            query_timeout: self.query_timeout.map(Duration::from_secs),
        }))
    }
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Long-lived postgres pool shared by every bound tool.
pub struct PostgresSource {
    /// Configured source name.
    pub name: String,
    /// Connection pool.
    pool: PostgresPool,
    /// Per-invocation timeout, when configured.
    query_timeout: Option<Duration>,
}

impl PostgresSource {
    /// Shared pool handle for bound tools.
    #[must_use]
    pub fn pool(&self) -> PostgresPool {
        self.pool.clone()
    }

    /// Configured per-invocation timeout.
    #[must_use]
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }
}

impl Source for PostgresSource {
    fn kind(&self) -> &'static str {
        SOURCE_KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
