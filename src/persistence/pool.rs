//! Database connection pool for the parent-record store

use crate::persistence::error::PersistenceError;
use crate::persistence::PersistenceConfig;
use sqlx::{any::AnyPoolOptions, AnyPool};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
    Mysql,
}

impl DatabaseBackend {
    /// Detect the backend from a connection URL scheme
    pub fn from_url(url: &str) -> Result<Self, PersistenceError> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            other => Err(PersistenceError::Connection(format!(
                "Unsupported database URL scheme '{}'. Expected sqlite:, postgres: or mysql:",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite",
            Self::Postgres => "PostgreSQL",
            Self::Mysql => "MySQL",
        }
    }

    /// In-memory SQLite databases are per connection, so the pool must hold one
    pub fn is_in_memory(url: &str) -> bool {
        url.starts_with("sqlite::memory:") || url.contains("mode=memory")
    }
}

/// Pool handle tagged with its backend
#[derive(Clone)]
pub struct ConnectionPool {
    pool: AnyPool,
    backend: DatabaseBackend,
}

impl ConnectionPool {
    pub async fn connect(config: &PersistenceConfig) -> Result<Self, PersistenceError> {
        sqlx::any::install_default_drivers();

        let backend = DatabaseBackend::from_url(&config.url)?;
        let max_connections = if DatabaseBackend::is_in_memory(&config.url) {
            1
        } else {
            config.max_connections
        };

        info!(
            backend = backend.name(),
            max_connections, "Connecting to parent-record store"
        );

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| PersistenceError::Connection(e.to_string()))?;

        Ok(Self { pool, backend })
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    pub async fn health_check(&self) -> Result<(), PersistenceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| PersistenceError::Connection(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
