pub mod default_layouts;
pub mod editor;
pub mod layout_persistence;
pub mod layout_service;
pub mod mutation_engine;
pub mod selection;

pub use default_layouts::DefaultLayoutFactory;
pub use editor::{
    DragEvent, DragPreview, DropTarget, LayoutEditor, OutlineRow, PendingSave, PropertyIntent,
    SaveOutcome, SaveStatus,
};
pub use layout_persistence::{LayoutPersistence, PAGE_LAYOUT_FIELD};
pub use layout_service::{LayoutService, LayoutSource, OpenedLayout};
pub use selection::{Selection, SelectionController};
