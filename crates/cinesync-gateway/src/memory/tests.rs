use super::*;
use serde_json::json;
use std::time::Duration;

fn path(uid: &str) -> DocumentPath {
    DocumentPath::new("users", uid)
}

async fn next_snapshot(listener: &mut DocumentListener) -> Option<Value> {
    tokio::time::timeout(Duration::from_secs(1), listener.snapshots.recv())
        .await
        .expect("snapshot should arrive")
        .expect("listener should still be attached")
}

#[tokio::test]
async fn test_get_missing_document() {
    let store = MemoryDocumentStore::new();
    assert_eq!(store.get(&path("u1")).await.unwrap(), None);
    assert_eq!(store.reads(), 1);
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_set_then_get() {
    let store = MemoryDocumentStore::new();
    store.set(&path("u1"), json!({"watchlist": []})).await.unwrap();
    assert_eq!(
        store.get(&path("u1")).await.unwrap(),
        Some(json!({"watchlist": []}))
    );
}

#[tokio::test]
async fn test_set_rejects_non_object() {
    let store = MemoryDocumentStore::new();
    let err = store.set(&path("u1"), json!([1, 2])).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_update_missing_document_fails() {
    let store = MemoryDocumentStore::new();
    let err = store
        .update(&path("u1"), vec![("watchlist".to_string(), FieldUpdate::Set(json!([])))])
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound("users/u1".to_string()));
    assert_eq!(store.peek(&path("u1")), None);
}

#[tokio::test]
async fn test_array_union_skips_deep_equal_elements() {
    let store = MemoryDocumentStore::new();
    store.set(&path("u1"), json!({"list": [{"id": 1, "at": "a"}]})).await.unwrap();

    store
        .update(
            &path("u1"),
            vec![(
                "list".to_string(),
                FieldUpdate::ArrayUnion(vec![
                    json!({"id": 1, "at": "a"}),
                    json!({"id": 1, "at": "b"}),
                    json!({"id": 1, "at": "b"}),
                ]),
            )],
        )
        .await
        .unwrap();

    assert_eq!(
        store.peek(&path("u1")).unwrap()["list"],
        json!([{"id": 1, "at": "a"}, {"id": 1, "at": "b"}])
    );
}

#[tokio::test]
async fn test_array_remove_removes_all_deep_equal() {
    let store = MemoryDocumentStore::new();
    store
        .set(&path("u1"), json!({"list": [1, 2, 1, 3]}))
        .await
        .unwrap();
    store
        .update(
            &path("u1"),
            vec![("list".to_string(), FieldUpdate::ArrayRemove(vec![json!(1)]))],
        )
        .await
        .unwrap();
    assert_eq!(store.peek(&path("u1")).unwrap()["list"], json!([2, 3]));
}

#[tokio::test]
async fn test_offline_fails_reads_and_writes() {
    let store = MemoryDocumentStore::new();
    store.set_offline(true);
    assert!(matches!(
        store.get(&path("u1")).await,
        Err(StoreError::Unavailable(_))
    ));
    assert!(matches!(
        store.set(&path("u1"), json!({})).await,
        Err(StoreError::Unavailable(_))
    ));
    assert!(matches!(
        store.listen(&path("u1")).await,
        Err(StoreError::Unavailable(_))
    ));

    store.set_offline(false);
    assert!(store.set(&path("u1"), json!({})).await.is_ok());
}

#[tokio::test]
async fn test_rejected_write_leaves_document_unchanged() {
    let store = MemoryDocumentStore::new();
    store.set(&path("u1"), json!({"n": 1})).await.unwrap();
    store.set_reject_writes(true);

    let err = store.set(&path("u1"), json!({"n": 2})).await.unwrap_err();
    assert_eq!(err, StoreError::PermissionDenied("users/u1".to_string()));
    assert_eq!(store.peek(&path("u1")), Some(json!({"n": 1})));
    assert_eq!(store.writes(), 2);
}

#[tokio::test]
async fn test_listener_receives_current_then_commits_in_order() {
    let store = MemoryDocumentStore::new();
    let mut listener = store.listen(&path("u1")).await.unwrap();
    assert_eq!(next_snapshot(&mut listener).await, None);

    store.set(&path("u1"), json!({"n": 1})).await.unwrap();
    store
        .update(&path("u1"), vec![("n".to_string(), FieldUpdate::Set(json!(2)))])
        .await
        .unwrap();

    assert_eq!(next_snapshot(&mut listener).await, Some(json!({"n": 1})));
    assert_eq!(next_snapshot(&mut listener).await, Some(json!({"n": 2})));
}

#[tokio::test]
async fn test_listener_ignores_other_documents() {
    let store = MemoryDocumentStore::new();
    let mut listener = store.listen(&path("u1")).await.unwrap();
    let _ = next_snapshot(&mut listener).await;

    store.set(&path("u2"), json!({"n": 1})).await.unwrap();
    assert!(listener.snapshots.try_recv().is_err());
}

#[tokio::test]
async fn test_detach_stops_deliveries() {
    let store = MemoryDocumentStore::new();
    let mut listener = store.listen(&path("u1")).await.unwrap();
    assert_eq!(store.listener_count(&path("u1")), 1);

    listener.registration.detach();
    assert_eq!(store.listener_count(&path("u1")), 0);

    store.set(&path("u1"), json!({"n": 1})).await.unwrap();
    // Only the initial snapshot was ever sent; the channel is now closed.
    assert_eq!(listener.snapshots.recv().await, Some(None));
    assert_eq!(listener.snapshots.recv().await, None);
}

#[tokio::test]
async fn test_dropping_listener_detaches() {
    let store = MemoryDocumentStore::new();
    let listener = store.listen(&path("u1")).await.unwrap();
    drop(listener);
    assert_eq!(store.listener_count(&path("u1")), 0);
}

#[tokio::test]
async fn test_held_writes_commit_in_release_order() {
    let store = MemoryDocumentStore::new();
    store.set(&path("u1"), json!({"n": 0})).await.unwrap();
    store.hold_writes();

    let first = {
        let store = store.clone();
        tokio::spawn(async move { store.set(&path("u1"), json!({"n": 1})).await })
    };
    store.wait_for_parked_writes(1).await;
    let second = {
        let store = store.clone();
        tokio::spawn(async move { store.set(&path("u1"), json!({"n": 2})).await })
    };
    store.wait_for_parked_writes(2).await;
    assert_eq!(store.peek(&path("u1")), Some(json!({"n": 0})));

    store.release_writes(1);
    first.await.unwrap().unwrap();
    assert_eq!(store.peek(&path("u1")), Some(json!({"n": 1})));

    store.resume_writes();
    second.await.unwrap().unwrap();
    assert_eq!(store.peek(&path("u1")), Some(json!({"n": 2})));
    assert_eq!(store.inner.gate.parked(), 0);
}

#[tokio::test]
async fn test_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("nested").join("documents.json");

    {
        let store = MemoryDocumentStore::open(&file).unwrap();
        assert_eq!(store.persist_path(), Some(file.as_path()));
        store.set(&path("u1"), json!({"n": 1})).await.unwrap();
    }
    assert!(file.exists());

    let reopened = MemoryDocumentStore::open(&file).unwrap();
    assert_eq!(reopened.get(&path("u1")).await.unwrap(), Some(json!({"n": 1})));
}

#[tokio::test]
async fn test_corrupt_persistence_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("documents.json");
    std::fs::write(&file, "{ not json").unwrap();

    let store = MemoryDocumentStore::open(&file).unwrap();
    assert_eq!(store.get(&path("u1")).await.unwrap(), None);

    store.set(&path("u1"), json!({"n": 1})).await.unwrap();
    let content = std::fs::read_to_string(&file).unwrap();
    assert!(content.contains("users/u1"));
}

#[tokio::test]
async fn test_reload_delivers_commits_from_another_process() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("documents.json");
    let writer = MemoryDocumentStore::open(&file).unwrap();
    let reader = MemoryDocumentStore::open(&file).unwrap();

    let mut listener = reader.listen(&path("u1")).await.unwrap();
    assert_eq!(next_snapshot(&mut listener).await, None);

    writer.set(&path("u1"), json!({"n": 1})).await.unwrap();
    writer.set(&path("u2"), json!({"n": 2})).await.unwrap();
    assert_eq!(reader.reload().unwrap(), 2);
    assert_eq!(next_snapshot(&mut listener).await, Some(json!({"n": 1})));

    // Nothing new on disk.
    assert_eq!(reader.reload().unwrap(), 0);
    assert!(listener.snapshots.try_recv().is_err());
}

#[tokio::test]
async fn test_reload_keeps_memory_when_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("documents.json");
    let store = MemoryDocumentStore::open(&file).unwrap();
    store.set(&path("u1"), json!({"n": 1})).await.unwrap();

    std::fs::write(&file, "{ truncated").unwrap();
    assert!(matches!(store.reload(), Err(StoreError::Persistence(_))));
    assert_eq!(store.peek(&path("u1")), Some(json!({"n": 1})));
}

#[test]
fn test_reload_without_persistence_is_a_noop() {
    let store = MemoryDocumentStore::new();
    assert_eq!(store.reload().unwrap(), 0);
}
