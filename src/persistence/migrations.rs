//! Versioned schema migrations for the parent-record store

use crate::persistence::error::PersistenceError;
use crate::persistence::pool::ConnectionPool;
use sqlx::Row;
use tracing::{debug, info};

const MIGRATION_001_PARENT_RECORDS: &str = r#"
-- Workflow templates and campaigns, stored as opaque JSON definitions
CREATE TABLE IF NOT EXISTS parent_records (
    id TEXT NOT NULL,
    kind TEXT NOT NULL,
    definition TEXT NOT NULL,
    version INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT,
    PRIMARY KEY (kind, id)
);

CREATE INDEX IF NOT EXISTS idx_parent_records_kind ON parent_records(kind);
CREATE INDEX IF NOT EXISTS idx_parent_records_deleted ON parent_records(deleted_at)
"#;

struct Migration {
    name: &'static str,
    sql: &'static str,
}

fn migrations() -> Vec<Migration> {
    vec![Migration {
        name: "001_parent_records",
        sql: MIGRATION_001_PARENT_RECORDS,
    }]
}

pub struct MigrationRunner {
    pool: ConnectionPool,
}

impl MigrationRunner {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Apply every migration not yet recorded
    pub async fn migrate_up(&self) -> Result<MigrationResult, PersistenceError> {
        self.ensure_migrations_table().await?;

        let mut result = MigrationResult::default();
        for migration in migrations() {
            if self.is_applied(migration.name).await? {
                debug!(migration = migration.name, "Migration already applied");
                result.skipped += 1;
                continue;
            }

            info!(migration = migration.name, "Applying migration");
            for statement in statements(migration.sql) {
                sqlx::query(&statement)
                    .execute(self.pool.pool())
                    .await
                    .map_err(|e| {
                        PersistenceError::Migration(format!("{}: {}", migration.name, e))
                    })?;
            }
            self.record(migration.name).await?;
            result.applied += 1;
        }

        Ok(result)
    }

    pub async fn status(&self) -> Result<Vec<MigrationStatus>, PersistenceError> {
        self.ensure_migrations_table().await?;

        let mut statuses = Vec::new();
        for migration in migrations() {
            let row = sqlx::query("SELECT applied_at FROM _funnelforge_migrations WHERE name = ?")
                .bind(migration.name)
                .fetch_optional(self.pool.pool())
                .await?;
            let applied_at = match row {
                Some(row) => Some(row.try_get::<String, _>("applied_at")?),
                None => None,
            };
            statuses.push(MigrationStatus {
                name: migration.name.to_string(),
                applied: applied_at.is_some(),
                applied_at,
            });
        }
        Ok(statuses)
    }

    async fn ensure_migrations_table(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS _funnelforge_migrations (name TEXT PRIMARY KEY, applied_at TEXT NOT NULL)",
        )
        .execute(self.pool.pool())
        .await
        .map_err(|e| PersistenceError::Migration(format!("migrations table: {}", e)))?;
        Ok(())
    }

    async fn is_applied(&self, name: &str) -> Result<bool, PersistenceError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM _funnelforge_migrations WHERE name = ?")
            .bind(name)
            .fetch_one(self.pool.pool())
            .await?;
        let count: i64 = row.try_get("count")?;
        Ok(count > 0)
    }

    async fn record(&self, name: &str) -> Result<(), PersistenceError> {
        sqlx::query("INSERT INTO _funnelforge_migrations (name, applied_at) VALUES (?, ?)")
            .bind(name)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(self.pool.pool())
            .await?;
        Ok(())
    }
}

/// Split a migration script into executable statements, dropping comment lines
fn statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|chunk| {
            chunk
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|statement| !statement.is_empty())
        .collect()
}

#[derive(Debug, Default)]
pub struct MigrationResult {
    pub applied: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub name: String,
    pub applied: bool,
    pub applied_at: Option<String>,
}
