//! Errors raised by block mutations

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// The referenced block is not in the document
    #[error("Block not found: '{id}'")]
    NotFound { id: String },

    /// A field or tag belonging to another variant was applied to a block
    #[error("Field '{field}' is not valid for a '{current}' block")]
    InvalidVariantTransition { current: String, field: String },

    /// A field value could not be decoded for the block's variant
    #[error("Invalid value for {field}: {reason}")]
    InvalidFieldValue { field: String, reason: String },
}
