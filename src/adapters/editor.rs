//! Editing session for one step layout
//!
//! [`LayoutEditor`] owns the working document and the selection, translates
//! property-panel intents and drag events into mutation-engine calls, and
//! tracks save state. Saves run off a snapshot so editing can continue while a
//! write is in flight; a failed save never rolls the document back.

use crate::adapters::layout_service::{LayoutService, LayoutSource};
use crate::adapters::mutation_engine;
use crate::adapters::selection::{Selection, SelectionController};
use crate::domain::{Block, BlockId, BlockKind, BlockPatch, LayoutDocument, ParentRecordRef};
use crate::persistence::PersistenceError;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

/// Request from the property-editing panel
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyIntent {
    Update { id: BlockId, patch: BlockPatch },
    Delete { id: BlockId },
    Duplicate { id: BlockId },
    MoveUp { id: BlockId },
    MoveDown { id: BlockId },
}

/// What a drag is hovering over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Block(BlockId),
    /// Drop zone before the block currently at this index (or at the end)
    Gap(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Start(BlockId),
    Over(DropTarget),
    End {
        id: BlockId,
        destination: Option<DropTarget>,
    },
    Cancel,
}

/// Highlight state while a drag is in progress; never touches the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPreview {
    pub dragged: BlockId,
    pub over: Option<DropTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved { version: u64 },
    Failed { message: String, retryable: bool },
}

/// One row of the structural list view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineRow {
    pub id: BlockId,
    pub tag: String,
    pub depth: usize,
    pub summary: String,
    pub selected: bool,
}

/// A save detached from the editor
pub struct PendingSave {
    service: LayoutService,
    record: ParentRecordRef,
    step_id: String,
    snapshot: LayoutDocument,
}

impl PendingSave {
    pub fn snapshot(&self) -> &LayoutDocument {
        &self.snapshot
    }

    pub async fn run(self) -> SaveOutcome {
        let result = self
            .service
            .save(&self.record, &self.step_id, &self.snapshot)
            .await;
        SaveOutcome {
            snapshot: self.snapshot,
            result,
        }
    }
}

pub struct SaveOutcome {
    pub snapshot: LayoutDocument,
    pub result: Result<u64, PersistenceError>,
}

pub struct LayoutEditor {
    service: LayoutService,
    record: ParentRecordRef,
    step_id: String,
    document: LayoutDocument,
    /// Last document known to be in the store; `None` until the first save of a synthesized layout
    saved: Option<LayoutDocument>,
    selection: SelectionController,
    drag: Option<DragPreview>,
    save_status: SaveStatus,
}

impl LayoutEditor {
    /// Open the step through the service (saved layout or synthesized default)
    pub async fn open(
        service: LayoutService,
        record: ParentRecordRef,
        step_id: impl Into<String>,
    ) -> Result<Self, PersistenceError> {
        let step_id = step_id.into();
        let opened = service.open(&record, &step_id).await?;
        let saved = match opened.source {
            LayoutSource::Saved => Some(opened.document.clone()),
            LayoutSource::Synthesized => None,
        };

        Ok(Self {
            service,
            record,
            step_id,
            document: opened.document,
            saved,
            selection: SelectionController::new(),
            drag: None,
            save_status: SaveStatus::Idle,
        })
    }

    pub fn document(&self) -> &LayoutDocument {
        &self.document
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    pub fn record(&self) -> &ParentRecordRef {
        &self.record
    }

    pub fn selection(&self) -> Selection {
        self.selection.current()
    }

    pub fn subscribe_selection(&self) -> watch::Receiver<Selection> {
        self.selection.subscribe()
    }

    pub fn selected_block(&self) -> Option<&Block> {
        let id = self.selection.selected_id()?;
        self.document.find(&id)
    }

    pub fn drag_preview(&self) -> Option<&DragPreview> {
        self.drag.as_ref()
    }

    pub fn save_status(&self) -> &SaveStatus {
        &self.save_status
    }

    /// True when the working document differs from what was last stored
    pub fn is_dirty(&self) -> bool {
        self.saved.as_ref() != Some(&self.document)
    }

    /// Replace the working document, e.g. after reloading the parent record
    pub fn load(&mut self, document: LayoutDocument) {
        self.document = document.normalized();
        self.saved = Some(self.document.clone());
        self.drag = None;
        self.save_status = SaveStatus::Idle;
        self.selection.document_loaded();
    }

    /// Select a block from the list or the canvas; unknown ids are ignored
    pub fn select(&mut self, id: &str) {
        if self.document.contains(id) {
            self.selection.select(id);
        } else {
            debug!(block = id, "Ignoring selection of unknown block");
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn add(&mut self, template: BlockKind) -> BlockId {
        let (document, id) = mutation_engine::add_with_id(&self.document, template);
        self.document = document;
        self.selection.block_added(&id);
        id
    }

    /// Add a palette entry by tag; `None` for tags outside the palette
    pub fn add_tag(&mut self, tag: &str) -> Option<BlockId> {
        BlockKind::template(tag).map(|template| self.add(template))
    }

    pub fn add_to_card(&mut self, card_id: &str, template: BlockKind) -> Option<BlockId> {
        match mutation_engine::try_add_to_card(&self.document, card_id, template) {
            Ok((document, id)) => {
                self.document = document;
                self.selection.block_added(&id);
                Some(id)
            }
            Err(e) => {
                debug!(card = card_id, error = %e, "Add to card ignored");
                None
            }
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.document = mutation_engine::remove(&self.document, id);
        self.selection.block_removed(id, &self.document);
    }

    /// Apply a property patch; a renamed block keeps its selection
    pub fn update(&mut self, id: &str, patch: &BlockPatch) {
        match mutation_engine::try_update(&self.document, id, patch) {
            Ok(document) => {
                self.document = document;
                if let Some(new_id) = patch.get("id").and_then(Value::as_str) {
                    self.selection.block_renamed(id, new_id);
                }
                self.selection.retain_existing(&self.document);
            }
            Err(e) => {
                debug!(block = id, error = %e, "Update ignored");
            }
        }
    }

    pub fn duplicate(&mut self, id: &str) -> Option<BlockId> {
        match mutation_engine::try_duplicate(&self.document, id) {
            Ok((document, clone_id)) => {
                self.document = document;
                self.selection.block_duplicated(&clone_id);
                Some(clone_id)
            }
            Err(e) => {
                debug!(block = id, error = %e, "Duplicate ignored");
                None
            }
        }
    }

    pub fn move_up(&mut self, id: &str) {
        self.document = mutation_engine::move_up(&self.document, id);
    }

    pub fn move_down(&mut self, id: &str) {
        self.document = mutation_engine::move_down(&self.document, id);
    }

    pub fn apply_intent(&mut self, intent: PropertyIntent) {
        match intent {
            PropertyIntent::Update { id, patch } => self.update(&id, &patch),
            PropertyIntent::Delete { id } => self.remove(&id),
            PropertyIntent::Duplicate { id } => {
                self.duplicate(&id);
            }
            PropertyIntent::MoveUp { id } => self.move_up(&id),
            PropertyIntent::MoveDown { id } => self.move_down(&id),
        }
    }

    /// Only `End` mutates the document; `Start` and `Over` drive the preview
    pub fn handle_drag(&mut self, event: DragEvent) {
        match event {
            DragEvent::Start(id) => {
                self.drag = self.document.contains(&id).then(|| DragPreview {
                    dragged: id,
                    over: None,
                });
            }
            DragEvent::Over(target) => {
                if let Some(preview) = self.drag.as_mut() {
                    preview.over = Some(target);
                }
            }
            DragEvent::End { id, destination } => {
                self.drag = None;
                match destination {
                    Some(DropTarget::Block(over)) => {
                        self.document = mutation_engine::swap_by_drag_exact(&self.document, &id, &over);
                    }
                    Some(DropTarget::Gap(gap)) => {
                        let Some(from) = mutation_engine::position_of(&self.document, &id) else {
                            debug!(block = %id, "Drop of unknown block ignored");
                            return;
                        };
                        // The gap index counts the dragged block, which is taken out first.
                        let target = if gap > from { gap - 1 } else { gap };
                        self.document = mutation_engine::reorder_by_drag(&self.document, &id, target);
                    }
                    None => {}
                }
            }
            DragEvent::Cancel => self.drag = None,
        }
    }

    /// Rows for the list view, depth first, with the selected row flagged
    pub fn outline(&self) -> Vec<OutlineRow> {
        let selection = self.selection.current();
        let mut rows = Vec::new();
        collect_rows(&self.document.blocks, 0, &selection, &mut rows);
        rows
    }

    /// Snapshot the document and mark the session as saving
    pub fn begin_save(&mut self) -> PendingSave {
        self.save_status = SaveStatus::Saving;
        PendingSave {
            service: self.service.clone(),
            record: self.record.clone(),
            step_id: self.step_id.clone(),
            snapshot: self.document.clone(),
        }
    }

    /// Record the result of a save started with [`begin_save`](Self::begin_save)
    pub fn finish_save(&mut self, outcome: SaveOutcome) -> &SaveStatus {
        self.save_status = match outcome.result {
            Ok(version) => {
                self.saved = Some(outcome.snapshot);
                SaveStatus::Saved { version }
            }
            Err(e) => SaveStatus::Failed {
                message: e.to_string(),
                retryable: e.is_retryable(),
            },
        };
        &self.save_status
    }

    /// Save and wait for the result
    pub async fn save(&mut self) -> &SaveStatus {
        let outcome = self.begin_save().run().await;
        self.finish_save(outcome)
    }
}

fn collect_rows(blocks: &[Block], depth: usize, selection: &Selection, rows: &mut Vec<OutlineRow>) {
    for block in blocks {
        rows.push(OutlineRow {
            id: block.id.clone(),
            tag: block.tag().to_string(),
            depth,
            summary: block.summary(),
            selected: selection.is_selected(&block.id),
        });
        if let Some(children) = block.kind.children() {
            collect_rows(children, depth + 1, selection, rows);
        }
    }
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
