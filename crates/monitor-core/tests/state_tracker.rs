use monitor_core::mocks::{MemoryBlobStore, MemoryStateBackend};
use monitor_core::state::{BlobStateBackend, FileStateBackend, DEFAULT_STATE_BLOB};
use monitor_core::{PersistedState, ProcessedSet, SessionId, StateBackend, StateTracker};
use std::sync::Arc;
use tempfile::TempDir;

fn ids(set: &ProcessedSet) -> Vec<String> {
    set.iter().map(|id| id.as_str().to_string()).collect()
}

#[tokio::test]
async fn test_load_with_no_state_anywhere_is_empty() {
    let tmp = TempDir::new().unwrap();
    let blobs = Arc::new(MemoryBlobStore::new());
    let tracker = StateTracker::new(vec![
        Arc::new(BlobStateBackend::new(blobs, DEFAULT_STATE_BLOB)),
        Arc::new(FileStateBackend::new(tmp.path().join("processed_sessions.json"))),
    ]);

    assert!(tracker.load().await.is_empty());
}

#[tokio::test]
async fn test_durable_reachable_but_empty_falls_back_to_local_file() {
    let tmp = TempDir::new().unwrap();
    let local = tmp.path().join("processed_sessions.json");
    std::fs::write(&local, r#"{"processed_sessions":["s1"]}"#).unwrap();

    let blobs = Arc::new(MemoryBlobStore::new());
    let tracker = StateTracker::new(vec![
        Arc::new(BlobStateBackend::new(blobs.clone(), DEFAULT_STATE_BLOB)),
        Arc::new(FileStateBackend::new(&local)),
    ]);

    let set = tracker.load().await;
    assert_eq!(ids(&set), vec!["s1"]);

    // An empty document in the durable store must not mask the local one either.
    blobs.insert(DEFAULT_STATE_BLOB, br#"{"processed_sessions":[],"last_updated":"2025-01-01T00:00:00Z"}"#);
    assert_eq!(ids(&tracker.load().await), vec!["s1"]);
}

#[tokio::test]
async fn test_durable_copy_is_authoritative_when_present() {
    let tmp = TempDir::new().unwrap();
    let local = tmp.path().join("state.json");
    std::fs::write(&local, r#"{"processed_sessions":["old"]}"#).unwrap();

    let blobs = Arc::new(MemoryBlobStore::new());
    blobs.insert(DEFAULT_STATE_BLOB, br#"{"processed_sessions":["a","b"]}"#);
    let tracker = StateTracker::new(vec![
        Arc::new(BlobStateBackend::new(blobs, DEFAULT_STATE_BLOB)),
        Arc::new(FileStateBackend::new(&local)),
    ]);

    assert_eq!(ids(&tracker.load().await), vec!["a", "b"]);
}

#[tokio::test]
async fn test_unreachable_durable_store_degrades_to_local_file() {
    let tmp = TempDir::new().unwrap();
    let local = tmp.path().join("state.json");

    let blobs = Arc::new(MemoryBlobStore::new());
    blobs.set_unreachable(true);
    let tracker = StateTracker::new(vec![
        Arc::new(BlobStateBackend::new(blobs.clone(), DEFAULT_STATE_BLOB)),
        Arc::new(FileStateBackend::new(&local)),
    ]);

    let set = tracker.mark_processed(&SessionId::new("s9")).await;
    assert_eq!(ids(&set), vec!["s9"]);
    assert!(local.exists());
    assert!(!blobs.contains(DEFAULT_STATE_BLOB));

    assert_eq!(ids(&tracker.load().await), vec!["s9"]);
}

#[tokio::test]
async fn test_malformed_documents_are_treated_as_absent() {
    let tmp = TempDir::new().unwrap();
    let local = tmp.path().join("state.json");
    std::fs::write(&local, "{not json").unwrap();

    let blobs = Arc::new(MemoryBlobStore::new());
    blobs.insert(DEFAULT_STATE_BLOB, b"<html>502</html>");
    let tracker = StateTracker::new(vec![
        Arc::new(BlobStateBackend::new(blobs, DEFAULT_STATE_BLOB)),
        Arc::new(FileStateBackend::new(&local)),
    ]);

    assert!(tracker.load().await.is_empty());
}

#[tokio::test]
async fn test_save_writes_every_backend() {
    let tmp = TempDir::new().unwrap();
    let local = tmp.path().join("nested/dir/state.json");
    let blobs = Arc::new(MemoryBlobStore::new());
    let tracker = StateTracker::new(vec![
        Arc::new(BlobStateBackend::new(blobs.clone(), DEFAULT_STATE_BLOB)),
        Arc::new(FileStateBackend::new(&local)),
    ]);

    let set: ProcessedSet = ["x", "y"].iter().map(|s| SessionId::new(*s)).collect();
    assert_eq!(tracker.save(&set).await, 2);

    let durable = blobs.json(DEFAULT_STATE_BLOB).unwrap();
    assert_eq!(durable["processed_sessions"], serde_json::json!(["x", "y"]));
    assert!(durable["last_updated"].as_str().unwrap().ends_with('Z'));

    let on_disk: serde_json::Value = serde_json::from_slice(&std::fs::read(&local).unwrap()).unwrap();
    assert_eq!(on_disk["processed_sessions"], serde_json::json!(["x", "y"]));
}

#[tokio::test]
async fn test_save_survives_a_failing_backend() {
    let down = Arc::new(MemoryStateBackend::new());
    down.set_unreachable(true);
    let up = Arc::new(MemoryStateBackend::new());
    let tracker = StateTracker::new(vec![down.clone(), up.clone()]);

    let set: ProcessedSet = [SessionId::new("s1")].into_iter().collect();
    assert_eq!(tracker.save(&set).await, 1);
    assert_eq!(up.document().unwrap().processed_sessions, vec![SessionId::new("s1")]);
}

#[tokio::test]
async fn test_save_of_load_round_trips_the_session_list() {
    let tmp = TempDir::new().unwrap();
    let local = tmp.path().join("state.json");
    std::fs::write(
        &local,
        r#"{"processed_sessions":["a","b","c"],"last_updated":"2024-05-01T10:00:00.000000"}"#,
    )
    .unwrap();
    let backend = Arc::new(FileStateBackend::new(&local));
    let tracker = StateTracker::new(vec![backend.clone()]);

    let before = backend.load().await.unwrap().unwrap();
    tracker.save(&tracker.load().await).await;
    let after = backend.load().await.unwrap().unwrap();

    assert_eq!(before.processed_sessions, after.processed_sessions);
    assert_ne!(before.last_updated, after.last_updated);
}

#[tokio::test]
async fn test_round_trip_normalises_unsorted_and_duplicate_ids() {
    let tmp = TempDir::new().unwrap();
    let local = tmp.path().join("state.json");
    std::fs::write(&local, r#"{"processed_sessions":["b","a","a"],"last_updated":null}"#).unwrap();
    let backend = Arc::new(FileStateBackend::new(&local));
    let tracker = StateTracker::new(vec![backend.clone()]);

    let loaded = tracker.load().await;
    assert_eq!(ids(&loaded), vec!["a", "b"]);

    tracker.save(&loaded).await;
    let rewritten = backend.load().await.unwrap().unwrap();
    let as_strings: Vec<&str> = rewritten.processed_sessions.iter().map(|id| id.as_str()).collect();
    assert_eq!(as_strings, vec!["a", "b"]);

    // Same set either way; only the listing is canonical.
    assert_eq!(ids(&tracker.load().await), ids(&loaded));
}

#[tokio::test]
async fn test_mark_processed_is_read_modify_write() {
    let backend = Arc::new(MemoryStateBackend::with_sessions(&["s1"]));
    let tracker = StateTracker::new(vec![backend.clone()]);

    tracker.mark_processed(&SessionId::new("s2")).await;
    tracker.mark_processed(&SessionId::new("s2")).await;

    let doc: PersistedState = backend.document().unwrap();
    assert_eq!(doc.processed_sessions, vec![SessionId::new("s1"), SessionId::new("s2")]);
    assert_eq!(backend.save_count(), 2);
}
