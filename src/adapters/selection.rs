//! Selection Controller
//!
//! One owned selection value per editing session. The list view and the canvas
//! both read it through [`SelectionController::subscribe`], so they observe the
//! same state and are woken on the same changes.

use crate::domain::{BlockId, LayoutDocument};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(BlockId),
}

impl Selection {
    pub fn block_id(&self) -> Option<&str> {
        match self {
            Selection::Unselected => None,
            Selection::Selected(id) => Some(id),
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.block_id() == Some(id)
    }
}

#[derive(Debug)]
pub struct SelectionController {
    tx: watch::Sender<Selection>,
}

impl SelectionController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Selection::Unselected);
        Self { tx }
    }

    pub fn current(&self) -> Selection {
        self.tx.borrow().clone()
    }

    pub fn selected_id(&self) -> Option<BlockId> {
        self.tx.borrow().block_id().map(str::to_string)
    }

    /// Receiver for a view; changes are only published when the value differs
    pub fn subscribe(&self) -> watch::Receiver<Selection> {
        self.tx.subscribe()
    }

    /// Select a block by id, typically from a click in the list or the canvas
    pub fn select(&self, id: impl Into<BlockId>) {
        self.set(Selection::Selected(id.into()));
    }

    pub fn clear(&self) {
        self.set(Selection::Unselected);
    }

    pub fn block_added(&self, id: &str) {
        self.select(id);
    }

    pub fn block_duplicated(&self, clone_id: &str) {
        self.select(clone_id);
    }

    /// Clear the selection if it pointed at `id` or at anything no longer in `after`
    pub fn block_removed(&self, id: &str, after: &LayoutDocument) {
        self.tx.send_if_modified(|selection| {
            let stale = selection
                .block_id()
                .is_some_and(|selected| selected == id || !after.contains(selected));
            if stale {
                debug!(block = id, "Selection cleared by removal");
                *selection = Selection::Unselected;
            }
            stale
        });
    }

    /// Follow a block whose id was changed by an update
    pub fn block_renamed(&self, old_id: &str, new_id: &str) {
        self.tx.send_if_modified(|selection| {
            if !selection.is_selected(old_id) || old_id == new_id {
                return false;
            }
            debug!(from = old_id, to = new_id, "Selection follows renamed block");
            *selection = Selection::Selected(new_id.to_string());
            true
        });
    }

    /// Clear the selection if it points at a block missing from `document`
    pub fn retain_existing(&self, document: &LayoutDocument) {
        self.tx.send_if_modified(|selection| {
            let stale = selection
                .block_id()
                .is_some_and(|selected| !document.contains(selected));
            if stale {
                *selection = Selection::Unselected;
            }
            stale
        });
    }

    pub fn document_loaded(&self) {
        self.clear();
    }

    fn set(&self, next: Selection) {
        self.tx.send_if_modified(|selection| {
            if *selection == next {
                return false;
            }
            *selection = next;
            true
        });
    }
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}
