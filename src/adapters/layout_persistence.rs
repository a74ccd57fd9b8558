//! Persistence Adapter
//!
//! Reads and writes one step's layout inside an opaque parent record. The
//! record is only interpreted as far as `<steps_field>[*].id` and the step's
//! `page_layout`; everything else passes through untouched.

use crate::domain::LayoutDocument;
use crate::persistence::PersistenceError;
use serde_json::Value;

pub const PAGE_LAYOUT_FIELD: &str = "page_layout";
pub const DEFAULT_STEPS_FIELD: &str = "steps";

#[derive(Debug, Clone)]
pub struct LayoutPersistence {
    steps_field: String,
}

impl Default for LayoutPersistence {
    fn default() -> Self {
        Self::new(DEFAULT_STEPS_FIELD)
    }
}

/// Step ids may be stored as strings or numbers
fn id_matches(step: &Value, step_id: &str) -> bool {
    match step.get("id") {
        Some(Value::String(id)) => id == step_id,
        Some(Value::Number(id)) => id.to_string() == step_id,
        _ => false,
    }
}

impl LayoutPersistence {
    pub fn new(steps_field: impl Into<String>) -> Self {
        Self {
            steps_field: steps_field.into(),
        }
    }

    pub fn steps_field(&self) -> &str {
        &self.steps_field
    }

    fn steps<'a>(&self, record: &'a Value) -> Result<&'a Vec<Value>, PersistenceError> {
        record
            .get(&self.steps_field)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                PersistenceError::Serialization(format!(
                    "parent record has no '{}' array",
                    self.steps_field
                ))
            })
    }

    /// The step descriptor with this id
    pub fn step<'a>(&self, record: &'a Value, step_id: &str) -> Result<&'a Value, PersistenceError> {
        self.steps(record)?
            .iter()
            .find(|step| id_matches(step, step_id))
            .ok_or_else(|| PersistenceError::ParentRecordMissingStep {
                step_id: step_id.to_string(),
            })
    }

    pub fn step_ids(&self, record: &Value) -> Result<Vec<String>, PersistenceError> {
        Ok(self
            .steps(record)?
            .iter()
            .filter_map(|step| match step.get("id")? {
                Value::String(id) => Some(id.clone()),
                Value::Number(id) => Some(id.to_string()),
                _ => None,
            })
            .collect())
    }

    /// The saved layout for `step_id`, or `None` if the step has never been laid out
    ///
    /// The document is returned exactly as stored; order values are not re-keyed.
    pub fn load(&self, record: &Value, step_id: &str) -> Result<Option<LayoutDocument>, PersistenceError> {
        match self.step(record, step_id)?.get(PAGE_LAYOUT_FIELD) {
            None | Some(Value::Null) => Ok(None),
            Some(raw) => LayoutDocument::from_value(raw.clone())
                .map(Some)
                .map_err(|e| {
                    PersistenceError::Serialization(format!(
                        "step '{}' has an unreadable {}: {}",
                        step_id, PAGE_LAYOUT_FIELD, e
                    ))
                }),
        }
    }

    /// A copy of `record` with only `step_id`'s `page_layout` replaced
    pub fn save(
        &self,
        record: &Value,
        step_id: &str,
        document: &LayoutDocument,
    ) -> Result<Value, PersistenceError> {
        let layout = document.to_value()?;
        let mut next = record.clone();

        let steps = next
            .get_mut(&self.steps_field)
            .and_then(Value::as_array_mut)
            .ok_or_else(|| {
                PersistenceError::Serialization(format!(
                    "parent record has no '{}' array",
                    self.steps_field
                ))
            })?;
        let step = steps
            .iter_mut()
            .filter(|step| id_matches(step, step_id))
            .find_map(Value::as_object_mut)
            .ok_or_else(|| PersistenceError::ParentRecordMissingStep {
                step_id: step_id.to_string(),
            })?;

        step.insert(PAGE_LAYOUT_FIELD.to_string(), layout);
        Ok(next)
    }
}
