//! PostgreSQL pool for the building and issue repositories
//!
//! Issue creation holds one connection for its whole transaction, so
//! `max_connections` bounds how many creates can run at once.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a request waits for a free connection before failing.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool sizing, normally taken from the `[database]` settings
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

impl PoolConfig {
    fn options(&self) -> PgPoolOptions {
        // A zero-sized pool would block every request forever
        PgPoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .acquire_timeout(self.acquire_timeout)
    }
}

/// Create a pool with [`PoolConfig::default`].
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, &PoolConfig::default()).await
}

/// Create a pool sized by `config`.
///
/// ```ignore
/// let config = PoolConfig { max_connections: 10, ..PoolConfig::default() };
/// let pool = create_pool_with_options("postgres://localhost/indoormap", &config).await?;
/// ```
pub async fn create_pool_with_options(
    database_url: &str,
    config: &PoolConfig,
) -> Result<PgPool, sqlx::Error> {
    let pool = config.options().connect(database_url).await?;
    tracing::debug!(
        max_connections = config.max_connections,
        "database pool ready"
    );
    Ok(pool)
}
