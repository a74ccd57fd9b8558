//! Mutation Engine - pure structural edits on layout documents
//!
//! Every operation takes a document by reference and returns a new one; the input
//! is never modified. Operations locate the target in whichever sibling set holds
//! it (top level or a card's children) and leave that set with dense `order`
//! values `0..n-1` matching array position before returning.
//!
//! The plain operations never fail: a stale id or a patch for the wrong variant
//! degrades to returning the input unchanged. The `try_*` variants report why.

use crate::domain::block::{normalize, reindex, Block, BlockId, BlockKind, BlockPatch};
use crate::domain::{LayoutDocument, LayoutError};
use std::collections::HashSet;
use tracing::debug;

/// Index path from the top level down to a block
type Path = Vec<usize>;

fn locate(blocks: &[Block], id: &str) -> Option<Path> {
    for (idx, block) in blocks.iter().enumerate() {
        if block.id == id {
            return Some(vec![idx]);
        }
        if let Some(children) = block.kind.children() {
            if let Some(mut rest) = locate(children, id) {
                rest.insert(0, idx);
                return Some(rest);
            }
        }
    }
    None
}

/// The sibling set reached by following `parent` through card children
fn siblings_mut<'a>(mut blocks: &'a mut Vec<Block>, parent: &[usize]) -> Option<&'a mut Vec<Block>> {
    for &idx in parent {
        let block = blocks.get_mut(idx)?;
        blocks = match &mut block.kind {
            BlockKind::Card { children } => children,
            _ => return None,
        };
    }
    Some(blocks)
}

fn siblings_of<'a>(document: &'a LayoutDocument, id: &str) -> Option<(Path, &'a [Block])> {
    let path = locate(&document.blocks, id)?;
    let (_, parent) = path.split_last()?;
    let mut blocks: &[Block] = &document.blocks;
    for &idx in parent {
        blocks = blocks.get(idx)?.kind.children()?;
    }
    Some((parent.to_vec(), blocks))
}

fn swallow(document: &LayoutDocument, op: &str, result: Result<LayoutDocument, LayoutError>) -> LayoutDocument {
    match result {
        Ok(next) => next,
        Err(err) => {
            debug!(operation = op, error = %err, "Layout mutation ignored");
            document.clone()
        }
    }
}

/// Re-derive dense order values for every sibling set in the document
pub fn normalize_document(document: &LayoutDocument) -> LayoutDocument {
    document.clone().normalized()
}

/// Position of a block within its own sibling set, by order
pub fn position_of(document: &LayoutDocument, id: &str) -> Option<usize> {
    let (_, siblings) = siblings_of(document, id)?;
    let mut ordered: Vec<&Block> = siblings.iter().collect();
    ordered.sort_by(|a, b| a.order.total_cmp(&b.order));
    ordered.iter().position(|b| b.id == id)
}

/// Append a new block built from `template` to the top level
pub fn add(document: &LayoutDocument, template: BlockKind) -> LayoutDocument {
    add_with_id(document, template).0
}

/// Like [`add`], also returning the id assigned to the new block
pub fn add_with_id(document: &LayoutDocument, template: BlockKind) -> (LayoutDocument, BlockId) {
    let mut next = document.clone();
    normalize(&mut next.blocks);

    let mut block = Block::new(template);
    block.order = next.blocks.len() as f64;
    let id = block.id.clone();
    next.blocks.push(block);
    (next, id)
}

/// Append a new block to the children of the card `card_id`
pub fn try_add_to_card(
    document: &LayoutDocument,
    card_id: &str,
    template: BlockKind,
) -> Result<(LayoutDocument, BlockId), LayoutError> {
    let card = document.find(card_id).ok_or_else(|| LayoutError::NotFound {
        id: card_id.to_string(),
    })?;
    if !matches!(card.kind, BlockKind::Card { .. }) {
        return Err(LayoutError::InvalidVariantTransition {
            current: card.tag().to_string(),
            field: "children".to_string(),
        });
    }

    let path = locate(&document.blocks, card_id).ok_or_else(|| LayoutError::NotFound {
        id: card_id.to_string(),
    })?;
    let mut next = document.clone();
    let children = siblings_mut(&mut next.blocks, &path).ok_or_else(|| LayoutError::NotFound {
        id: card_id.to_string(),
    })?;
    normalize(children);

    let mut block = Block::new(template);
    block.order = children.len() as f64;
    let id = block.id.clone();
    children.push(block);
    Ok((next, id))
}

pub fn add_to_card(document: &LayoutDocument, card_id: &str, template: BlockKind) -> LayoutDocument {
    swallow(
        document,
        "add_to_card",
        try_add_to_card(document, card_id, template).map(|(next, _)| next),
    )
}

/// Delete a block and its subtree; absent ids leave the document unchanged
pub fn remove(document: &LayoutDocument, id: &str) -> LayoutDocument {
    let mut next = document.clone();
    let found = apply_in_siblings(&mut next, id, |set, position| {
        set.remove(position);
        reindex(set);
    });
    if found {
        next
    } else {
        document.clone()
    }
}

/// Ids introduced by an update must be unique within the new subtree and must
/// not belong to any block outside the one being replaced.
fn check_subtree_ids(document: &LayoutDocument, current: &Block, updated: &Block) -> Result<(), LayoutError> {
    let replaced: HashSet<&str> = current.subtree_ids().into_iter().collect();
    let mut seen = HashSet::new();
    for (position, new_id) in updated.subtree_ids().into_iter().enumerate() {
        let clash = !seen.insert(new_id) || (!replaced.contains(new_id) && document.contains(new_id));
        if clash {
            return Err(LayoutError::InvalidFieldValue {
                field: if position == 0 { "id" } else { "children" }.to_string(),
                reason: format!("id '{}' is already used by another block", new_id),
            });
        }
    }
    Ok(())
}

/// Merge partial fields into the block `id`
///
/// A `children` patch on a card is re-keyed like any other sibling set.
pub fn try_update(
    document: &LayoutDocument,
    id: &str,
    patch: &BlockPatch,
) -> Result<LayoutDocument, LayoutError> {
    let current = document.find(id).ok_or_else(|| LayoutError::NotFound { id: id.to_string() })?;
    let mut updated = current.apply_patch(patch)?;
    check_subtree_ids(document, current, &updated)?;
    updated.normalize_children();

    let path = locate(&document.blocks, id).ok_or_else(|| LayoutError::NotFound { id: id.to_string() })?;
    let (index, parent) = path
        .split_last()
        .ok_or_else(|| LayoutError::NotFound { id: id.to_string() })?;

    let mut next = document.clone();
    let set = siblings_mut(&mut next.blocks, parent)
        .ok_or_else(|| LayoutError::NotFound { id: id.to_string() })?;
    let slot = set
        .get_mut(*index)
        .ok_or_else(|| LayoutError::NotFound { id: id.to_string() })?;
    *slot = updated;
    normalize(set);
    Ok(next)
}

pub fn update(document: &LayoutDocument, id: &str, patch: &BlockPatch) -> LayoutDocument {
    swallow(document, "update", try_update(document, id, patch))
}

fn shift(document: &LayoutDocument, id: &str, up: bool) -> LayoutDocument {
    let mut next = document.clone();
    let mut moved = false;
    apply_in_siblings(&mut next, id, |set, position| {
        let neighbor = if up {
            position.checked_sub(1)
        } else {
            Some(position + 1).filter(|n| *n < set.len())
        };
        if let Some(neighbor) = neighbor {
            set.swap(position, neighbor);
            reindex(set);
            moved = true;
        }
    });
    if moved {
        next
    } else {
        debug!(block = id, up, "Layout move ignored");
        document.clone()
    }
}

/// Run `edit` against the normalized sibling set of `id` inside `document`
fn apply_in_siblings<F>(document: &mut LayoutDocument, id: &str, edit: F) -> bool
where
    F: FnOnce(&mut Vec<Block>, usize),
{
    let Some(path) = locate(&document.blocks, id) else {
        return false;
    };
    let Some((_, parent)) = path.split_last() else {
        return false;
    };
    let Some(set) = siblings_mut(&mut document.blocks, parent) else {
        return false;
    };
    normalize(set);
    match set.iter().position(|b| b.id == id) {
        Some(position) => {
            edit(set, position);
            true
        }
        None => false,
    }
}

/// Swap with the previous sibling; no-op for the first block
pub fn move_up(document: &LayoutDocument, id: &str) -> LayoutDocument {
    shift(document, id, true)
}

/// Swap with the next sibling; no-op for the last block
pub fn move_down(document: &LayoutDocument, id: &str) -> LayoutDocument {
    shift(document, id, false)
}

/// Clone a block right after the original, returning the clone's id
///
/// The clone is keyed halfway between the original and its successor (or half a
/// step past the end), then the set is re-sorted and re-keyed to dense integers.
pub fn try_duplicate(document: &LayoutDocument, id: &str) -> Result<(LayoutDocument, BlockId), LayoutError> {
    let mut next = document.clone();
    let mut clone_id = None;
    let found = apply_in_siblings(&mut next, id, |set, position| {
        let original = &set[position];
        let mut clone = original.clone();
        clone.reassign_ids();
        clone.order = match set.get(position + 1) {
            Some(successor) => (original.order + successor.order) / 2.0,
            None => original.order + 0.5,
        };
        clone_id = Some(clone.id.clone());
        set.push(clone);
        normalize(set);
    });

    match (found, clone_id) {
        (true, Some(clone_id)) => Ok((next, clone_id)),
        _ => Err(LayoutError::NotFound { id: id.to_string() }),
    }
}

pub fn duplicate(document: &LayoutDocument, id: &str) -> LayoutDocument {
    swallow(
        document,
        "duplicate",
        try_duplicate(document, id).map(|(next, _)| next),
    )
}

/// Move a block to `target_index` within its sibling set in one splice
///
/// The index is interpreted after the block has been taken out and is clamped
/// to the end of the set.
pub fn try_reorder_by_drag(
    document: &LayoutDocument,
    dragged_id: &str,
    target_index: usize,
) -> Result<LayoutDocument, LayoutError> {
    let mut next = document.clone();
    let found = apply_in_siblings(&mut next, dragged_id, |set, position| {
        let block = set.remove(position);
        let target = target_index.min(set.len());
        set.insert(target, block);
        reindex(set);
    });
    if found {
        Ok(next)
    } else {
        Err(LayoutError::NotFound {
            id: dragged_id.to_string(),
        })
    }
}

pub fn reorder_by_drag(document: &LayoutDocument, dragged_id: &str, target_index: usize) -> LayoutDocument {
    swallow(
        document,
        "reorder_by_drag",
        try_reorder_by_drag(document, dragged_id, target_index),
    )
}

/// Drop `dragged_id` directly onto `over_id`: the dragged block takes the
/// position `over_id` currently holds. Both must share a sibling set.
pub fn try_swap_by_drag_exact(
    document: &LayoutDocument,
    dragged_id: &str,
    over_id: &str,
) -> Result<LayoutDocument, LayoutError> {
    let (dragged_parent, _) = siblings_of(document, dragged_id).ok_or_else(|| LayoutError::NotFound {
        id: dragged_id.to_string(),
    })?;
    let (over_parent, _) = siblings_of(document, over_id).ok_or_else(|| LayoutError::NotFound {
        id: over_id.to_string(),
    })?;
    if dragged_parent != over_parent || dragged_id == over_id {
        return Ok(document.clone());
    }

    let target = position_of(document, over_id).ok_or_else(|| LayoutError::NotFound {
        id: over_id.to_string(),
    })?;
    try_reorder_by_drag(document, dragged_id, target)
}

pub fn swap_by_drag_exact(document: &LayoutDocument, dragged_id: &str, over_id: &str) -> LayoutDocument {
    swallow(
        document,
        "swap_by_drag_exact",
        try_swap_by_drag_exact(document, dragged_id, over_id),
    )
}

#[cfg(test)]
#[path = "mutation_engine_test.rs"]
mod tests;
