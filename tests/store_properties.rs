//! End-to-end behaviour of the board store against both gateways.

use std::collections::BTreeSet;
use std::sync::Arc;
use taskboard::{
    BoardError, BoardStore, FileGateway, MemoryGateway, NewTask, PersistenceGateway, Priority,
    Snapshot, TaskUpdate,
};
use tempfile::TempDir;

fn memory_store() -> (Arc<MemoryGateway>, BoardStore) {
    let gateway = Arc::new(MemoryGateway::new());
    let store = BoardStore::new(gateway.clone());
    (gateway, store)
}

async fn column_ids(store: &BoardStore) -> BTreeSet<String> {
    store
        .columns()
        .await
        .into_iter()
        .flat_map(|c| c.tasks.into_iter().map(|t| t.id))
        .collect()
}

async fn flat_ids(store: &BoardStore) -> BTreeSet<String> {
    store.tasks().await.into_iter().map(|t| t.id).collect()
}

#[tokio::test]
async fn test_flat_list_and_columns_agree_after_mixed_operations() {
    let (_gateway, store) = memory_store();
    let columns = ["todo", "in-progress", "done"];
    let mut ids = Vec::new();

    // Deterministic walk over the operations.
    let mut seed: u64 = 7;
    for step in 0..60 {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let pick = (seed >> 33) as usize;
        match pick % 4 {
            0 => {
                let task = store
                    .add_task(NewTask::new(format!("task {}", step)).in_column(columns[pick % 3]))
                    .await
                    .unwrap();
                ids.push(task.id);
            }
            1 if !ids.is_empty() => {
                let id = &ids[pick % ids.len()];
                let update = TaskUpdate::default()
                    .title(format!("renamed {}", step))
                    .column(columns[(pick / 3) % 3]);
                let _ = store.update_task(id, update).await;
            }
            2 if !ids.is_empty() => {
                let id = &ids[pick % ids.len()];
                let _ = store
                    .move_task(id, columns[pick % 3], columns[(pick / 5) % 3])
                    .await;
            }
            3 if !ids.is_empty() => {
                let id = ids.remove(pick % ids.len());
                store.delete_task(&id).await.unwrap();
            }
            _ => {}
        }

        assert_eq!(flat_ids(&store).await, column_ids(&store).await, "step {}", step);
        store.verify().await.unwrap();
    }

    for task in store.tasks().await {
        let column = store.column_by_id(&task.column_id).await.unwrap();
        assert!(column.tasks.iter().any(|t| t.id == task.id));
    }
}

#[tokio::test]
async fn test_add_task_defaults_and_reloads() {
    let (gateway, store) = memory_store();
    let task = store
        .add_task(NewTask::new("X").with_priority(Priority::High))
        .await
        .unwrap();

    assert_eq!(task.column_id, "todo");
    assert_eq!(store.columns().await[0].tasks[0].id, task.id);

    let loaded = gateway.load().await.unwrap();
    let reloaded = loaded.tasks.iter().find(|t| t.id == task.id).unwrap();
    assert_eq!(reloaded.title, "X");
    assert_eq!(reloaded.priority, Priority::High);
}

#[tokio::test]
async fn test_move_task_is_idempotent_in_membership() {
    let (_gateway, store) = memory_store();
    let task = store.add_task(NewTask::new("X")).await.unwrap();

    store.move_task(&task.id, "todo", "done").await.unwrap();
    store.move_task(&task.id, "todo", "done").await.unwrap();

    assert!(store.tasks_by_column("todo").await.is_empty());
    let done = store.tasks_by_column("done").await;
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].column_id, "done");
    assert_eq!(store.task_by_id(&task.id).await.unwrap().column_id, "done");
}

#[tokio::test]
async fn test_move_unknown_task_fails() {
    let (_gateway, store) = memory_store();
    let err = store.move_task("missing", "todo", "done").await.unwrap_err();
    assert!(matches!(err, BoardError::TaskNotFound { .. }));
    assert!(!store.is_loading());
}

#[tokio::test]
async fn test_delete_unknown_leaves_state_unchanged() {
    let (_gateway, store) = memory_store();
    store.add_task(NewTask::new("keep")).await.unwrap();
    let before = store.snapshot().await;

    store.delete_task("unknown").await.unwrap();

    assert_eq!(store.snapshot().await, before);
    assert!(store.error().is_none());
}

#[tokio::test]
async fn test_update_unknown_task_is_not_found() {
    let (_gateway, store) = memory_store();
    let err = store
        .update_task("unknown", TaskUpdate::default().title("x"))
        .await
        .unwrap_err();

    assert!(matches!(err, BoardError::TaskNotFound { ref id } if id == "unknown"));
    assert!(!store.is_loading());
    assert_eq!(store.error().as_deref(), Some("task not found: unknown"));
}

#[tokio::test]
async fn test_update_to_unknown_column_is_rejected() {
    let (_gateway, store) = memory_store();
    let task = store.add_task(NewTask::new("x")).await.unwrap();
    let err = store
        .update_task(&task.id, TaskUpdate::default().column("archive"))
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::ColumnNotFound { .. }));
    assert_eq!(store.task_by_id(&task.id).await.unwrap().column_id, "todo");
}

#[tokio::test]
async fn test_toggle_dark_mode_twice_restores_saved_record() {
    let (gateway, store) = memory_store();
    store.add_task(NewTask::new("x")).await.unwrap();
    let before = gateway.load().await.unwrap();

    assert!(store.toggle_dark_mode().await.unwrap());
    assert!(gateway.load().await.unwrap().dark_mode);
    assert!(!store.toggle_dark_mode().await.unwrap());

    assert!(!store.dark_mode().await);
    assert_eq!(gateway.load().await.unwrap(), before);
}

#[tokio::test]
async fn test_save_then_load_strips_unknown_fields() {
    let gateway = MemoryGateway::with_record(
        r#"{
            "columns": [
                { "id": "todo", "title": "A fazer", "wip": 3, "tasks": [
                    { "id": "1", "title": "a", "description": "", "priority": "low",
                      "columnId": "todo", "createdAt": "2024-05-01T09:30:00Z", "selected": true }
                ]}
            ],
            "tasks": [
                { "id": "1", "title": "a", "description": "", "priority": "low",
                  "columnId": "todo", "createdAt": "2024-05-01T09:30:00Z", "selected": true }
            ],
            "darkMode": false,
            "isLoading": true
        }"#,
    );
    let loaded = gateway.load().await.unwrap();

    gateway.save(&loaded).await.unwrap();
    let raw = gateway.raw().unwrap();
    assert!(!raw.contains("selected"));
    assert!(!raw.contains("wip"));
    assert!(!raw.contains("isLoading"));
    assert_eq!(gateway.load().await.unwrap(), loaded.normalized());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_lose_nothing() {
    let (gateway, store) = memory_store();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move { store.add_task(NewTask::new(format!("t{}", i))).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.total_tasks().await, 32);
    assert_eq!(flat_ids(&store).await.len(), 32);
    let saved = gateway.load().await.unwrap();
    assert_eq!(saved.tasks.len(), 32);
    assert_eq!(saved.columns[0].tasks.len(), 32);
}

#[tokio::test]
async fn test_file_store_survives_restart() {
    let temp = TempDir::new().unwrap();

    let first = BoardStore::new(Arc::new(FileGateway::new(temp.path())));
    first.initialize().await;
    let task = first
        .add_task(
            NewTask::new("Comprar pão")
                .with_description("padaria")
                .with_voice_transcript("comprar pão na padaria"),
        )
        .await
        .unwrap();
    first.move_task(&task.id, "todo", "in-progress").await.unwrap();
    first.toggle_dark_mode().await.unwrap();
    let expected = first.snapshot().await;

    let second = BoardStore::new(Arc::new(FileGateway::new(temp.path())));
    second.initialize().await;
    assert_eq!(second.snapshot().await, expected);
    assert!(second.dark_mode().await);
    let restored = second.task_by_id(&task.id).await.unwrap();
    assert_eq!(restored.voice_transcript.as_deref(), Some("comprar pão na padaria"));
    assert_eq!(second.tasks_by_column("in-progress").await.len(), 1);
}

#[tokio::test]
async fn test_legacy_record_without_version_loads() {
    let gateway = Arc::new(MemoryGateway::with_record(
        r#"{
            "columns": [
                { "id": "todo", "title": "A fazer", "taskIds": ["1700000000000"] },
                { "id": "done", "title": "Concluído", "taskIds": ["1700000000001"] }
            ],
            "tasks": [
                { "id": "1700000000000", "title": "a", "priority": "medium", "columnId": "todo", "createdAt": "2023-11-14T22:13:20.000Z" },
                { "id": "1700000000001", "title": "b", "priority": "high", "columnId": "done", "createdAt": "2023-11-14T22:13:20.001Z" }
            ],
            "darkMode": false
        }"#,
    ));
    let store = BoardStore::new(gateway);
    store.initialize().await;

    assert_eq!(store.total_tasks().await, 2);
    assert_eq!(store.completed_tasks().await, 1);
    assert_eq!(store.progress_percentage().await, 50);
    store.verify().await.unwrap();

    let snapshot: Snapshot = store.snapshot().await;
    assert_eq!(snapshot.version, 1);
    assert_eq!(snapshot.columns.len(), 3);
}

#[tokio::test]
async fn test_add_task_after_largest_possible_id_fails_cleanly() {
    let gateway = Arc::new(MemoryGateway::with_record(
        r#"{
            "columns": [],
            "tasks": [
                { "id": "9223372036854775807", "title": "a", "priority": "medium", "columnId": "todo", "createdAt": "2024-05-01T09:30:00Z" }
            ],
            "darkMode": false
        }"#,
    ));
    let store = BoardStore::new(gateway.clone());
    store.initialize().await;

    let err = store.add_task(NewTask::new("b")).await.unwrap_err();
    assert!(matches!(err, BoardError::Operation { .. }));
    assert!(err.to_string().contains("task id space exhausted"));
    assert_eq!(store.total_tasks().await, 1);
    assert!(!store.is_loading());
    store.verify().await.unwrap();
}
