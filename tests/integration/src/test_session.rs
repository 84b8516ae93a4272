//! Session lifecycle: handle validity, identity isolation, logout, eviction.

use std::collections::HashMap;
use std::time::Duration;

use docstore_core::{DocStoreConfig, DocStoreError, DocStoreService};
use docstore_model::Handle;

use crate::{root_uri, seeded_service};

async fn open_root_handle(service: &DocStoreService, identity: &str) -> Handle {
    service
        .open_root_collection(identity, &root_uri(), &HashMap::new())
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("root collection missing"))
        .handle
}

#[tokio::test]
async fn test_should_keep_handles_private_to_identity() {
    let service = seeded_service();
    let alice_handle = open_root_handle(&service, "alice").await;

    let result = service.collection_count("bob", alice_handle).await;
    assert!(matches!(
        result,
        Err(DocStoreError::UnknownCollectionHandle { .. })
    ));
    assert_eq!(service.sessions().len(), 2);
}

#[tokio::test]
async fn test_should_invalidate_handles_on_close() {
    let service = seeded_service();
    let root = open_root_handle(&service, "alice").await;

    let meta = service
        .open_resource("alice", root, "test1.xml")
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("resource missing"));

    service
        .close_resource("alice", meta.handle)
        .await
        .unwrap_or_else(|e| panic!("close failed: {e}"));

    let result = service.download_resource("alice", meta.handle, 8);
    assert!(matches!(
        result,
        Err(DocStoreError::UnknownResourceHandle { .. })
    ));
}

#[tokio::test]
async fn test_should_release_all_handles_on_logout() {
    let service = seeded_service();
    let root = open_root_handle(&service, "alice").await;
    let _ = service
        .open_resource("alice", root, "test1.xml")
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("resource missing"));

    assert!(service.close_session("alice"));
    assert!(service.sessions().get("alice").is_none());

    // Handles from the closed session no longer resolve in a new one.
    let result = service.collection_count("alice", root).await;
    assert!(matches!(
        result,
        Err(DocStoreError::UnknownCollectionHandle { .. })
    ));
}

#[tokio::test]
async fn test_should_evict_idle_sessions_only() {
    let db = {
        let db = docstore_core::engine::MemoryDatabase::new("testdatabase");
        let _ = db.add_collection("/db");
        db
    };
    let config = DocStoreConfig::builder()
        .session_idle_timeout_secs(0)
        .build();
    let service = DocStoreService::new(std::sync::Arc::new(db), config);

    let _ = open_root_handle(&service, "idle").await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    // With a zero-second timeout, the slept-over session is idle.
    let evicted = service.evict_idle_sessions();
    assert_eq!(evicted, 1);
    assert!(service.sessions().is_empty());
}

#[tokio::test]
async fn test_should_survive_concurrent_opens_and_closes() {
    let service = seeded_service();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16 {
        let service = service.clone();
        tasks.spawn(async move {
            let identity = if i % 2 == 0 { "alice" } else { "bob" };
            let handle = open_root_handle(&service, identity).await;
            let count = service
                .resource_count(identity, handle)
                .await
                .unwrap_or_else(|e| panic!("count failed: {e}"));
            assert_eq!(count, 2);
            service
                .close_collection(identity, handle)
                .await
                .unwrap_or_else(|e| panic!("close failed: {e}"));
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap_or_else(|e| panic!("task failed: {e}"));
    }

    // Every handle was closed; both sessions remain, empty.
    assert_eq!(service.sessions().len(), 2);
    for identity in ["alice", "bob"] {
        let session = service
            .sessions()
            .get(identity)
            .unwrap_or_else(|| panic!("session missing"));
        assert_eq!(session.open_collection_count(), 0);
    }
}
