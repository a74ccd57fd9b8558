//! Domain types: block schema, layout documents and parent-record vocabulary

pub mod block;
pub mod error;
pub mod layout;
pub mod record;

pub use block::{
    Alignment, Block, BlockId, BlockKind, BlockPatch, ButtonSize, ButtonVariant, FieldKind,
    SelectOption,
};
pub use error::LayoutError;
pub use layout::{LayoutDocument, PageDefaults, ProgressIndicator};
pub use record::{ParentRecordRef, RecordKind, StepRole};
