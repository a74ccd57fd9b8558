//! Open and save step layouts against the parent-record store

use crate::adapters::default_layouts::DefaultLayoutFactory;
use crate::adapters::layout_persistence::LayoutPersistence;
use crate::config::Settings;
use crate::domain::{LayoutDocument, ParentRecordRef, StepRole};
use crate::persistence::repository::not_found;
use crate::persistence::{ParentRecordRepository, PersistenceError};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Where an opened document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutSource {
    Saved,
    /// Built by the default-layout factory; nothing has been written yet
    Synthesized,
}

#[derive(Debug, Clone)]
pub struct OpenedLayout {
    pub document: LayoutDocument,
    pub source: LayoutSource,
    /// Parent-record version the document was read at
    pub record_version: u64,
}

#[derive(Clone)]
pub struct LayoutService {
    repository: Arc<dyn ParentRecordRepository>,
    adapter: LayoutPersistence,
    factory: DefaultLayoutFactory,
}

impl LayoutService {
    pub fn new(
        repository: Arc<dyn ParentRecordRepository>,
        adapter: LayoutPersistence,
        factory: DefaultLayoutFactory,
    ) -> Self {
        Self {
            repository,
            adapter,
            factory,
        }
    }

    pub fn from_settings(repository: Arc<dyn ParentRecordRepository>, settings: &Settings) -> Self {
        Self::new(
            repository,
            LayoutPersistence::new(settings.editor.steps_field.clone()),
            DefaultLayoutFactory::from_settings(settings),
        )
    }

    pub fn factory(&self) -> &DefaultLayoutFactory {
        &self.factory
    }

    /// Load the step's saved layout, or synthesize one from its role and label
    pub async fn open(&self, record: &ParentRecordRef, step_id: &str) -> Result<OpenedLayout, PersistenceError> {
        let stored = self
            .repository
            .get(record)
            .await?
            .ok_or_else(|| not_found(record))?;

        if let Some(document) = self.adapter.load(&stored.definition, step_id)? {
            return Ok(OpenedLayout {
                document: document.normalized(),
                source: LayoutSource::Saved,
                record_version: stored.version,
            });
        }

        let step = self.adapter.step(&stored.definition, step_id)?;
        let role = StepRole::parse(step.get("role").and_then(Value::as_str).unwrap_or_default());
        let label = step.get("label").and_then(Value::as_str).unwrap_or_default();

        info!(record = %record, step = step_id, role = role.as_str(), "Synthesizing default layout");
        Ok(OpenedLayout {
            document: self.factory.synthesize(&role, label),
            source: LayoutSource::Synthesized,
            record_version: stored.version,
        })
    }

    /// Write `document` into the current version of the record, returning the new version
    ///
    /// The record is re-read first so edits other operators made to other steps
    /// are kept. Failures are reported, never retried.
    pub async fn save(
        &self,
        record: &ParentRecordRef,
        step_id: &str,
        document: &LayoutDocument,
    ) -> Result<u64, PersistenceError> {
        let result = self.write(record, step_id, document).await;
        match &result {
            Ok(version) => info!(record = %record, step = step_id, version, "Saved step layout"),
            Err(e) => error!(record = %record, step = step_id, error = %e, "Failed to save step layout"),
        }
        result
    }

    async fn write(
        &self,
        record: &ParentRecordRef,
        step_id: &str,
        document: &LayoutDocument,
    ) -> Result<u64, PersistenceError> {
        let current = self
            .repository
            .get(record)
            .await?
            .ok_or_else(|| not_found(record))?;
        let updated = self.adapter.save(&current.definition, step_id, document)?;
        self.repository
            .update(record, &updated, Some(current.version))
            .await
    }
}
