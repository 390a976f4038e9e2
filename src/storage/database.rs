//! Database pool construction and liveness checks

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, error, info};

use crate::config::Config;

/// Shared PostgreSQL pool. Cloning is cheap; all clones use the same pool.
#[derive(Clone)]
pub struct Database {
    pub(super) pool: PgPool,
}

impl Database {
    /// Open the pool and verify one connection. Fails if the server is not
    /// reachable, so the process never starts serving without a database.
    pub async fn connect(config: &Config) -> Result<Self> {
        info!(
            host = %config.db_server,
            port = config.db_port,
            database = config.db_name.as_deref().unwrap_or(""),
            max_connections = config.db_max_connections,
            "Connecting to database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(config.connect_options())
            .await
            .map_err(|e| {
                error!(host = %config.db_server, error = %e, "Failed to connect to database");
                e
            })
            .context("Failed to connect to database")?;

        let server_version: String = sqlx::query_scalar("SHOW server_version")
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|_| "unknown".to_string());
        debug!(server_version = %server_version, "PostgreSQL version");

        info!(
            host = %config.db_server,
            server_version = %server_version,
            "Connected to database"
        );

        Ok(Self { pool })
    }

    /// Wrap an already built pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Round trip a trivial statement. Used by the readiness probe.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

#[cfg(test)]
pub(crate) fn unreachable_database() -> Database {
    use sqlx::postgres::PgConnectOptions;
    use std::time::Duration;

    // Nothing listens on port 1; every acquire fails fast.
    let options = PgConnectOptions::new()
        .host("127.0.0.1")
        .port(1)
        .username("report")
        .database("report");
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(500))
        .connect_lazy_with(options);
    Database::from_pool(pool)
}
