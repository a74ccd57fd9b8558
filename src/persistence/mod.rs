//! Parent-record store
//!
//! Workflow templates and campaigns are kept as opaque JSON definitions with a
//! version column for optimistic locking and soft deletes. The layout adapters
//! only need the [`ParentRecordRepository`] trait; [`DataStore`] wires up the
//! SQL implementation for SQLite, PostgreSQL or MySQL.
//!
//! # Example
//!
//! ```rust,no_run
//! use funnelforge::persistence::{DataStore, PersistenceConfig};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PersistenceConfig {
//!         url: "sqlite://funnelforge.db?mode=rwc".to_string(),
//!         ..PersistenceConfig::default()
//!     };
//!     let store = DataStore::new(&config).await?;
//!     let records = store.records();
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod memory;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::PersistenceError;
pub use memory::InMemoryParentRecordRepository;
pub use migrations::{MigrationResult, MigrationRunner, MigrationStatus};
pub use pool::{ConnectionPool, DatabaseBackend};
pub use repository::{ParentRecordRepository, SqlxParentRecordRepository, StoredRecord};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PersistenceConfig {
    /// `sqlite://funnelforge.db`, `sqlite::memory:`, `postgres://...` or `mysql://...`
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Apply pending migrations when the store is opened
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_auto_migrate() -> bool {
    true
}

fn default_connect_timeout_secs() -> u64 {
    30
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://funnelforge.db".to_string(),
            max_connections: default_max_connections(),
            auto_migrate: default_auto_migrate(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Clone)]
pub struct DataStore {
    pool: ConnectionPool,
    config: PersistenceConfig,
    records: Arc<SqlxParentRecordRepository>,
}

impl DataStore {
    /// Connect and, when `auto_migrate` is set, bring the schema up to date
    pub async fn new(config: &PersistenceConfig) -> Result<Self, PersistenceError> {
        let pool = ConnectionPool::connect(config).await?;
        let store = Self {
            records: Arc::new(SqlxParentRecordRepository::new(pool.clone())),
            pool,
            config: config.clone(),
        };

        if config.auto_migrate {
            let result = store.migrate().await?;
            info!(
                applied = result.applied,
                skipped = result.skipped,
                "Parent-record schema ready"
            );
        }

        Ok(store)
    }

    pub fn records(&self) -> Arc<SqlxParentRecordRepository> {
        Arc::clone(&self.records)
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.pool.backend()
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub async fn migrate(&self) -> Result<MigrationResult, PersistenceError> {
        MigrationRunner::new(self.pool.clone()).migrate_up().await
    }

    pub async fn migration_status(&self) -> Result<Vec<MigrationStatus>, PersistenceError> {
        MigrationRunner::new(self.pool.clone()).status().await
    }

    pub async fn health_check(&self) -> Result<(), PersistenceError> {
        self.pool.health_check().await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
