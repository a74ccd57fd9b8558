use funnelforge::adapters::{LayoutEditor, LayoutService, SaveStatus};
use funnelforge::config::Settings;
use funnelforge::domain::{ParentRecordRef, RecordKind};
use funnelforge::persistence::{
    DataStore, ParentRecordRepository, PersistenceConfig, PersistenceError,
};
use serde_json::json;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn memory_store() -> DataStore {
    init_tracing();
    let config = PersistenceConfig {
        url: "sqlite::memory:".to_string(),
        ..PersistenceConfig::default()
    };
    DataStore::new(&config).await.unwrap()
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let store = memory_store().await;

    let again = store.migrate().await.unwrap();
    assert_eq!(again.applied, 0);
    assert_eq!(again.skipped, 1);

    let status = store.migration_status().await.unwrap();
    assert!(status.iter().all(|s| s.applied));
    store.health_check().await.unwrap();
}

#[tokio::test]
async fn test_record_lifecycle() {
    let store = memory_store().await;
    let repo = store.records();
    let campaign = ParentRecordRef::campaign("verao");

    let version = repo
        .create(&campaign, &json!({"name": "Verão", "steps": []}))
        .await
        .unwrap();
    assert_eq!(version, 1);
    assert!(matches!(
        repo.create(&campaign, &json!({})).await,
        Err(PersistenceError::Duplicate { .. })
    ));

    let version = repo
        .update(&campaign, &json!({"name": "Verão 2", "steps": []}), Some(1))
        .await
        .unwrap();
    assert_eq!(version, 2);

    let stale = repo
        .update(&campaign, &json!({"name": "old"}), Some(1))
        .await
        .unwrap_err();
    assert!(matches!(
        stale,
        PersistenceError::VersionConflict {
            expected: 1,
            actual: 2
        }
    ));

    let stored = repo.get(&campaign).await.unwrap().unwrap();
    assert_eq!(stored.definition["name"], "Verão 2");
    assert_eq!(stored.version, 2);

    assert!(repo.delete(&campaign).await.unwrap());
    assert!(repo.get(&campaign).await.unwrap().is_none());
    assert!(matches!(
        repo.update(&campaign, &json!({}), None).await,
        Err(PersistenceError::NotFound { .. })
    ));

    // Re-creating a soft-deleted record continues its version sequence.
    let revived = repo.create(&campaign, &json!({"steps": []})).await.unwrap();
    assert_eq!(revived, 3);
}

#[tokio::test]
async fn test_list_by_kind() {
    let store = memory_store().await;
    let repo = store.records();
    repo.create(&ParentRecordRef::workflow_template("b"), &json!({}))
        .await
        .unwrap();
    repo.create(&ParentRecordRef::workflow_template("a"), &json!({}))
        .await
        .unwrap();
    repo.create(&ParentRecordRef::campaign("c"), &json!({}))
        .await
        .unwrap();

    let templates = repo.list(RecordKind::WorkflowTemplate).await.unwrap();
    let ids: Vec<&str> = templates.iter().map(|r| r.reference.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(repo.list(RecordKind::Campaign).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_editor_round_trip_through_sqlite() {
    let store = memory_store().await;
    let settings = Settings::default();
    let record = ParentRecordRef::workflow_template("camisetas");
    store
        .records()
        .create(
            &record,
            &json!({
                "steps": [
                    {"id": "dados", "role": "initial_data", "label": "Seus Dados"},
                    {"id": "frente", "role": "customize_front", "label": "Frente"}
                ]
            }),
        )
        .await
        .unwrap();

    let service = LayoutService::from_settings(store.records(), &settings);
    let mut editor = LayoutEditor::open(service.clone(), record.clone(), "dados")
        .await
        .unwrap();
    let spacer = editor.add_tag("spacer").unwrap();
    assert_eq!(editor.save().await, &SaveStatus::Saved { version: 2 });

    let reopened = LayoutEditor::open(service, record.clone(), "dados")
        .await
        .unwrap();
    assert_eq!(reopened.document(), editor.document());
    assert!(reopened.document().contains(&spacer));
    assert!(!reopened.is_dirty());

    let stored = store.records().get(&record).await.unwrap().unwrap();
    assert!(stored.definition["steps"][1].get("page_layout").is_none());
}
