use super::*;
use crate::adapters::default_layouts::DefaultLayoutFactory;
use crate::adapters::layout_persistence::LayoutPersistence;
use crate::domain::{Alignment, PageDefaults};
use crate::persistence::{InMemoryParentRecordRepository, ParentRecordRepository};
use serde_json::json;
use std::sync::Arc;

async fn editor_for(step: serde_json::Value) -> (LayoutEditor, InMemoryParentRecordRepository) {
    let repo = InMemoryParentRecordRepository::new();
    let record = ParentRecordRef::campaign("c-1");
    repo.create(&record, &json!({ "steps": [step] })).await.unwrap();

    let service = LayoutService::new(
        Arc::new(repo.clone()),
        LayoutPersistence::default(),
        DefaultLayoutFactory::new(PageDefaults::default()),
    );
    let editor = LayoutEditor::open(service, record, "s1").await.unwrap();
    (editor, repo)
}

async fn empty_editor() -> LayoutEditor {
    let (editor, _) = editor_for(json!({
        "id": "s1",
        "page_layout": {"components": [], "backgroundColor": "", "containerWidth": "480px", "padding": "24px"}
    }))
    .await;
    editor
}

fn ids(editor: &LayoutEditor) -> Vec<String> {
    editor.document().blocks.iter().map(|b| b.id.clone()).collect()
}

fn orders(editor: &LayoutEditor) -> Vec<f64> {
    editor.document().blocks.iter().map(|b| b.order).collect()
}

#[tokio::test]
async fn test_add_selects_new_block() {
    let mut editor = empty_editor().await;
    assert_eq!(editor.selection(), Selection::Unselected);

    editor.add_tag("heading").unwrap();
    let text = editor.add_tag("text").unwrap();

    assert_eq!(orders(&editor), vec![0.0, 1.0]);
    assert_eq!(editor.selection(), Selection::Selected(text.clone()));
    assert_eq!(editor.selected_block().unwrap().id, text);
    assert!(editor.add_tag("carousel").is_none());
}

#[tokio::test]
async fn test_duplicate_intent_selects_clone() {
    let mut editor = empty_editor().await;
    let h = editor.add_tag("heading").unwrap();
    let t = editor.add_tag("text").unwrap();
    let i = editor.add_tag("image").unwrap();

    editor.apply_intent(PropertyIntent::Duplicate { id: t.clone() });

    let after = ids(&editor);
    assert_eq!(after.len(), 4);
    assert_eq!(after[0], h);
    assert_eq!(after[1], t);
    assert_eq!(after[3], i);
    assert_ne!(after[2], t);
    assert_eq!(editor.selection(), Selection::Selected(after[2].clone()));
    assert_eq!(orders(&editor), vec![0.0, 1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn test_delete_intent_clears_selection() {
    let mut editor = empty_editor().await;
    let h = editor.add_tag("heading").unwrap();
    let t = editor.add_tag("text").unwrap();

    editor.apply_intent(PropertyIntent::Delete { id: t });
    assert_eq!(editor.selection(), Selection::Unselected);
    assert_eq!(ids(&editor), vec![h.clone()]);

    editor.select(&h);
    editor.apply_intent(PropertyIntent::Delete { id: "stale".to_string() });
    assert!(editor.selection().is_selected(&h));
}

#[tokio::test]
async fn test_update_and_move_intents() {
    let mut editor = empty_editor().await;
    let h = editor.add_tag("heading").unwrap();
    let t = editor.add_tag("text").unwrap();

    let mut patch = BlockPatch::new();
    patch.insert("content".to_string(), json!("Olá"));
    patch.insert("alignment".to_string(), json!("right"));
    editor.apply_intent(PropertyIntent::Update {
        id: t.clone(),
        patch,
    });
    assert_eq!(
        editor.document().find(&t).unwrap().kind,
        BlockKind::Text {
            content: "Olá".to_string(),
            alignment: Alignment::Right
        }
    );

    editor.apply_intent(PropertyIntent::MoveUp { id: t.clone() });
    assert_eq!(ids(&editor), vec![t.clone(), h.clone()]);
    editor.apply_intent(PropertyIntent::MoveDown { id: t.clone() });
    assert_eq!(ids(&editor), vec![h, t]);
}

#[tokio::test]
async fn test_renaming_selected_block_keeps_selection() {
    let mut editor = empty_editor().await;
    let id = editor.add_tag("heading").unwrap();

    let mut patch = BlockPatch::new();
    patch.insert("id".to_string(), json!("renamed"));
    editor.update(&id, &patch);

    assert!(editor.document().contains("renamed"));
    assert!(!editor.document().contains(&id));
    assert_eq!(editor.selection(), Selection::Selected("renamed".to_string()));
    assert_eq!(editor.selected_block().unwrap().id, "renamed");
}

#[tokio::test]
async fn test_children_patch_clears_dropped_selection() {
    let mut editor = empty_editor().await;
    let card = editor.add(BlockKind::Card { children: vec![] });
    editor.add_to_card(&card, BlockKind::Divider).unwrap();

    let mut patch = BlockPatch::new();
    patch.insert("children".to_string(), json!([]));
    editor.update(&card, &patch);

    assert!(editor.document().find(&card).unwrap().kind.children().unwrap().is_empty());
    assert_eq!(editor.selection(), Selection::Unselected);
    assert!(editor.selected_block().is_none());
}

#[tokio::test]
async fn test_drag_over_does_not_mutate() {
    let mut editor = empty_editor().await;
    let a = editor.add_tag("heading").unwrap();
    let b = editor.add_tag("text").unwrap();
    let before = editor.document().clone();

    editor.handle_drag(DragEvent::Start(a.clone()));
    editor.handle_drag(DragEvent::Over(DropTarget::Block(b.clone())));
    editor.handle_drag(DragEvent::Over(DropTarget::Gap(2)));

    assert_eq!(editor.document(), &before);
    assert_eq!(
        editor.drag_preview(),
        Some(&DragPreview {
            dragged: a,
            over: Some(DropTarget::Gap(2))
        })
    );

    editor.handle_drag(DragEvent::Cancel);
    assert!(editor.drag_preview().is_none());
    assert_eq!(editor.document(), &before);
}

#[tokio::test]
async fn test_drag_end_over_block_and_gap() {
    let mut editor = empty_editor().await;
    let a = editor.add_tag("heading").unwrap();
    let b = editor.add_tag("text").unwrap();
    let c = editor.add_tag("divider").unwrap();

    // Drop A onto C: A takes C's position.
    editor.handle_drag(DragEvent::Start(a.clone()));
    editor.handle_drag(DragEvent::End {
        id: a.clone(),
        destination: Some(DropTarget::Block(c.clone())),
    });
    assert_eq!(ids(&editor), vec![b.clone(), c.clone(), a.clone()]);
    assert!(editor.drag_preview().is_none());

    // Drop A into the gap before C (index 1): [B, A, C].
    editor.handle_drag(DragEvent::End {
        id: a.clone(),
        destination: Some(DropTarget::Gap(1)),
    });
    assert_eq!(ids(&editor), vec![b.clone(), a.clone(), c.clone()]);

    // Drop B into the trailing gap.
    editor.handle_drag(DragEvent::End {
        id: b.clone(),
        destination: Some(DropTarget::Gap(3)),
    });
    assert_eq!(ids(&editor), vec![a.clone(), c.clone(), b.clone()]);

    // Dropping outside any target changes nothing.
    editor.handle_drag(DragEvent::End {
        id: b,
        destination: None,
    });
    assert_eq!(orders(&editor), vec![0.0, 1.0, 2.0]);
}

#[tokio::test]
async fn test_outline_rows() {
    let mut editor = empty_editor().await;
    let card = editor.add(BlockKind::Card { children: vec![] });
    let child = editor
        .add_to_card(&card, BlockKind::template("button").unwrap())
        .unwrap();
    assert!(editor.add_to_card("missing", BlockKind::Divider).is_none());

    let rows = editor.outline();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].depth, 0);
    assert_eq!(rows[0].tag, "card");
    assert_eq!(rows[1].id, child);
    assert_eq!(rows[1].depth, 1);
    assert_eq!(rows[1].summary, "Continue");
    assert!(rows[1].selected);
    assert!(!rows[0].selected);
}

#[tokio::test]
async fn test_synthesized_layout_is_dirty_until_saved() {
    let (mut editor, repo) = editor_for(json!({
        "id": "s1", "role": "size_selection", "label": "Escolha o tamanho"
    }))
    .await;
    assert!(editor.is_dirty());
    assert_eq!(editor.save_status(), &SaveStatus::Idle);

    let status = editor.save().await.clone();
    assert_eq!(status, SaveStatus::Saved { version: 2 });
    assert!(!editor.is_dirty());

    let stored = repo.get(editor.record()).await.unwrap().unwrap();
    assert_eq!(
        LayoutPersistence::default().load(&stored.definition, "s1").unwrap().as_ref(),
        Some(editor.document())
    );
}

#[tokio::test]
async fn test_editing_continues_during_save() {
    let mut editor = empty_editor().await;
    editor.add_tag("heading");

    let pending = editor.begin_save();
    assert_eq!(editor.save_status(), &SaveStatus::Saving);
    let handle = tokio::spawn(pending.run());

    // Local edit while the write is in flight.
    editor.add_tag("text");

    let outcome = handle.await.unwrap();
    assert_eq!(outcome.snapshot.len(), 1);
    editor.finish_save(outcome);

    assert!(matches!(editor.save_status(), SaveStatus::Saved { .. }));
    assert_eq!(editor.document().len(), 2);
    assert!(editor.is_dirty());
}

#[tokio::test]
async fn test_failed_save_keeps_document() {
    let (mut editor, repo) = editor_for(json!({"id": "s1", "role": "initial_data"})).await;
    editor.add_tag("spacer");
    let before = editor.document().clone();

    // The step disappears under us.
    repo.update(editor.record(), &json!({"steps": []}), None)
        .await
        .unwrap();

    match editor.save().await {
        SaveStatus::Failed { message, retryable } => {
            assert!(message.contains("s1"));
            assert!(!retryable);
        }
        other => panic!("expected failed save, got {:?}", other),
    }
    assert_eq!(editor.document(), &before);
    assert!(editor.is_dirty());
}

#[tokio::test]
async fn test_load_resets_session() {
    let mut editor = empty_editor().await;
    let id = editor.add_tag("heading").unwrap();
    editor.handle_drag(DragEvent::Start(id));

    editor.load(LayoutDocument::default());
    assert_eq!(editor.selection(), Selection::Unselected);
    assert!(editor.drag_preview().is_none());
    assert!(editor.document().is_empty());
    assert!(!editor.is_dirty());
}

#[tokio::test]
async fn test_selection_is_shared_with_subscribers() {
    let mut editor = empty_editor().await;
    let mut canvas = editor.subscribe_selection();

    let id = editor.add_tag("image").unwrap();
    canvas.changed().await.unwrap();
    assert!(canvas.borrow().is_selected(&id));

    editor.select("nope");
    assert!(editor.selection().is_selected(&id));
}
