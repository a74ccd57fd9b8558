//! In-process parent-record store

use crate::domain::{ParentRecordRef, RecordKind};
use crate::persistence::error::PersistenceError;
use crate::persistence::repository::{not_found, ParentRecordRepository, StoredRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A stored record plus its soft-delete mark
#[derive(Debug, Clone)]
struct Entry {
    record: StoredRecord,
    deleted: bool,
}

/// Repository backed by a shared map; clones see the same records
///
/// Deletes are soft: the entry keeps its version so that re-creating the
/// record continues the sequence, as the SQL store does.
#[derive(Clone, Default)]
pub struct InMemoryParentRecordRepository {
    records: Arc<RwLock<HashMap<ParentRecordRef, Entry>>>,
}

impl InMemoryParentRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (not deleted) records
    pub async fn len(&self) -> usize {
        self.records.read().await.values().filter(|e| !e.deleted).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[async_trait]
impl ParentRecordRepository for InMemoryParentRecordRepository {
    async fn get(&self, record: &ParentRecordRef) -> Result<Option<StoredRecord>, PersistenceError> {
        Ok(self
            .records
            .read()
            .await
            .get(record)
            .filter(|e| !e.deleted)
            .map(|e| e.record.clone()))
    }

    async fn list(&self, kind: RecordKind) -> Result<Vec<StoredRecord>, PersistenceError> {
        let records = self.records.read().await;
        let mut matching: Vec<StoredRecord> = records
            .values()
            .filter(|e| !e.deleted && e.record.reference.kind == kind)
            .map(|e| e.record.clone())
            .collect();
        matching.sort_by(|a, b| a.reference.id.cmp(&b.reference.id));
        Ok(matching)
    }

    async fn create(&self, record: &ParentRecordRef, definition: &Value) -> Result<u64, PersistenceError> {
        let mut records = self.records.write().await;
        let version = match records.get(record) {
            Some(entry) if !entry.deleted => {
                return Err(PersistenceError::Duplicate {
                    entity_type: record.kind.to_string(),
                    identifier: record.id.clone(),
                });
            }
            Some(entry) => entry.record.version + 1,
            None => 1,
        };
        records.insert(
            record.clone(),
            Entry {
                record: StoredRecord {
                    reference: record.clone(),
                    definition: definition.clone(),
                    version,
                    updated_at: timestamp(),
                },
                deleted: false,
            },
        );
        Ok(version)
    }

    async fn update(
        &self,
        record: &ParentRecordRef,
        definition: &Value,
        expected_version: Option<u64>,
    ) -> Result<u64, PersistenceError> {
        let mut records = self.records.write().await;
        let stored = records
            .get_mut(record)
            .filter(|e| !e.deleted)
            .map(|e| &mut e.record)
            .ok_or_else(|| not_found(record))?;
        if let Some(expected) = expected_version {
            if expected != stored.version {
                return Err(PersistenceError::VersionConflict {
                    expected,
                    actual: stored.version,
                });
            }
        }
        stored.definition = definition.clone();
        stored.version += 1;
        stored.updated_at = timestamp();
        Ok(stored.version)
    }

    async fn delete(&self, record: &ParentRecordRef) -> Result<bool, PersistenceError> {
        let mut records = self.records.write().await;
        match records.get_mut(record) {
            Some(entry) if !entry.deleted => {
                entry.deleted = true;
                entry.record.updated_at = timestamp();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
