//! Parent-record repository trait and its SQL implementation

use crate::domain::{ParentRecordRef, RecordKind};
use crate::persistence::error::PersistenceError;
use crate::persistence::pool::ConnectionPool;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::any::AnyRow;
use sqlx::Row;

/// A parent record as held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub reference: ParentRecordRef,
    /// Opaque record body; only the step list is ever interpreted
    pub definition: Value,
    pub version: u64,
    pub updated_at: String,
}

/// Storage for workflow templates and campaigns
#[async_trait]
pub trait ParentRecordRepository: Send + Sync {
    async fn get(&self, record: &ParentRecordRef) -> Result<Option<StoredRecord>, PersistenceError>;

    async fn list(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, PersistenceError>;

    /// Insert a record, returning its initial version
    async fn create(&self, record: &ParentRecordRef, definition: &Value) -> Result<u64, PersistenceError>;

    /// Replace a record's definition, returning the new version
    ///
    /// With `expected_version` set the write only happens if the stored version
    /// still matches; otherwise `VersionConflict` is returned.
    async fn update(
        &self,
        record: &ParentRecordRef,
        definition: &Value,
        expected_version: Option<u64>,
    ) -> Result<u64, PersistenceError>;

    /// Soft delete; returns false if there was nothing to delete
    async fn delete(&self, record: &ParentRecordRef) -> Result<bool, PersistenceError>;
}

pub(crate) fn not_found(record: &ParentRecordRef) -> PersistenceError {
    PersistenceError::NotFound {
        entity_type: record.kind.to_string(),
        identifier: record.id.clone(),
    }
}

pub struct SqlxParentRecordRepository {
    pool: ConnectionPool,
}

impl SqlxParentRecordRepository {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, record: &ParentRecordRef) -> Result<Option<u64>, PersistenceError> {
        let row = sqlx::query(
            "SELECT version FROM parent_records WHERE kind = ? AND id = ? AND deleted_at IS NULL",
        )
        .bind(record.kind.as_str())
        .bind(&record.id)
        .fetch_optional(self.pool.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_get::<i64, _>("version")? as u64)),
            None => Ok(None),
        }
    }
}

fn decode_row(row: &AnyRow) -> Result<StoredRecord, PersistenceError> {
    let kind: String = row.try_get("kind")?;
    let kind = RecordKind::parse(&kind)
        .ok_or_else(|| PersistenceError::Serialization(format!("unknown record kind '{}'", kind)))?;
    let id: String = row.try_get("id")?;
    let definition: String = row.try_get("definition")?;
    let version: i64 = row.try_get("version")?;

    Ok(StoredRecord {
        reference: ParentRecordRef::new(kind, id),
        definition: serde_json::from_str(&definition)?,
        version: version as u64,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl ParentRecordRepository for SqlxParentRecordRepository {
    async fn get(&self, record: &ParentRecordRef) -> Result<Option<StoredRecord>, PersistenceError> {
        let row = sqlx::query(
            "SELECT id, kind, definition, version, updated_at FROM parent_records WHERE kind = ? AND id = ? AND deleted_at IS NULL",
        )
        .bind(record.kind.as_str())
        .bind(&record.id)
        .fetch_optional(self.pool.pool())
        .await?;

        row.as_ref().map(decode_row).transpose()
    }

    async fn list(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, PersistenceError> {
        let rows = sqlx::query(
            "SELECT id, kind, definition, version, updated_at FROM parent_records WHERE kind = ? AND deleted_at IS NULL ORDER BY id",
        )
        .bind(kind.as_str())
        .fetch_all(self.pool.pool())
        .await?;

        rows.iter().map(decode_row).collect()
    }

    async fn create(&self, record: &ParentRecordRef, definition: &Value) -> Result<u64, PersistenceError> {
        let now = chrono::Utc::now().to_rfc3339();
        let body = serde_json::to_string(definition)?;

        let existing = sqlx::query(
            "SELECT version, deleted_at FROM parent_records WHERE kind = ? AND id = ?",
        )
        .bind(record.kind.as_str())
        .bind(&record.id)
        .fetch_optional(self.pool.pool())
        .await?;

        if let Some(row) = existing {
            let deleted_at: Option<String> = row.try_get("deleted_at")?;
            if deleted_at.is_none() {
                return Err(PersistenceError::Duplicate {
                    entity_type: record.kind.to_string(),
                    identifier: record.id.clone(),
                });
            }

            // Revive a soft-deleted record, keeping its version history moving forward
            let version = row.try_get::<i64, _>("version")? + 1;
            sqlx::query(
                "UPDATE parent_records SET definition = ?, version = ?, updated_at = ?, deleted_at = NULL WHERE kind = ? AND id = ?",
            )
            .bind(&body)
            .bind(version)
            .bind(&now)
            .bind(record.kind.as_str())
            .bind(&record.id)
            .execute(self.pool.pool())
            .await?;
            return Ok(version as u64);
        }

        sqlx::query(
            "INSERT INTO parent_records (id, kind, definition, version, created_at, updated_at) VALUES (?, ?, ?, 1, ?, ?)",
        )
        .bind(&record.id)
        .bind(record.kind.as_str())
        .bind(&body)
        .bind(&now)
        .bind(&now)
        .execute(self.pool.pool())
        .await?;

        tracing::debug!(record = %record, "Created parent record");
        Ok(1)
    }

    async fn update(
        &self,
        record: &ParentRecordRef,
        definition: &Value,
        expected_version: Option<u64>,
    ) -> Result<u64, PersistenceError> {
        let current = self
            .current_version(record)
            .await?
            .ok_or_else(|| not_found(record))?;
        if let Some(expected) = expected_version {
            if expected != current {
                return Err(PersistenceError::VersionConflict {
                    expected,
                    actual: current,
                });
            }
        }

        let result = sqlx::query(
            "UPDATE parent_records SET definition = ?, version = version + 1, updated_at = ? WHERE kind = ? AND id = ? AND version = ? AND deleted_at IS NULL",
        )
        .bind(serde_json::to_string(definition)?)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(record.kind.as_str())
        .bind(&record.id)
        .bind(current as i64)
        .execute(self.pool.pool())
        .await?;

        if result.rows_affected() == 0 {
            // Lost a race between the version read and the write.
            return match self.current_version(record).await? {
                Some(actual) => Err(PersistenceError::VersionConflict {
                    expected: current,
                    actual,
                }),
                None => Err(not_found(record)),
            };
        }

        Ok(current + 1)
    }

    async fn delete(&self, record: &ParentRecordRef) -> Result<bool, PersistenceError> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE parent_records SET deleted_at = ?, updated_at = ? WHERE kind = ? AND id = ? AND deleted_at IS NULL",
        )
        .bind(&now)
        .bind(&now)
        .bind(record.kind.as_str())
        .bind(&record.id)
        .execute(self.pool.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
