//! Persistence layer error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Database connection error: {0}")]
    Connection(String),

    /// The parent record itself does not exist (or was deleted)
    #[error("Item not found: {entity_type} with identifier '{identifier}'")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    /// The parent record no longer has a step with this id
    #[error("Parent record has no step '{step_id}'")]
    ParentRecordMissingStep { step_id: String },

    #[error("Duplicate entry: {entity_type} with identifier '{identifier}' already exists")]
    Duplicate {
        entity_type: String,
        identifier: String,
    },

    /// Optimistic lock failure
    #[error("Version conflict: expected version {expected}, but found version {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    #[error("Migration error: {0}")]
    Migration(String),

    /// The parent record is not shaped as expected
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistenceError {
    /// Whether repeating the same save may succeed without reloading first
    ///
    /// A missing record or step, a malformed record and a version conflict all
    /// need a fresh load; connection and database faults may be transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Database(_) | Self::Internal(_)
        )
    }
}
