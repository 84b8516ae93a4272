//! Browsing: open collections, counts, lists, resource metadata.

use std::collections::HashMap;

use docstore_core::DocStoreError;
use docstore_model::ResourceKind;
use futures::StreamExt;

use crate::{root_uri, seeded_service};

#[tokio::test]
async fn test_should_browse_root_collection() {
    let service = seeded_service();

    let root = service
        .open_root_collection("alice", &root_uri(), &HashMap::new())
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("root collection missing"));
    assert_eq!(root.name, "/db");

    let child_count = service
        .collection_count("alice", root.handle)
        .await
        .unwrap_or_else(|e| panic!("count failed: {e}"));
    assert_eq!(child_count, 1);

    let resource_count = service
        .resource_count("alice", root.handle)
        .await
        .unwrap_or_else(|e| panic!("count failed: {e}"));
    assert_eq!(resource_count, 2);

    let mut resource_ids: Vec<String> = service
        .list_resources("alice", root.handle)
        .unwrap_or_else(|e| panic!("list failed: {e}"))
        .collect()
        .await;
    resource_ids.sort();
    assert_eq!(resource_ids, vec!["test1.xml", "test2.bin"]);
}

#[tokio::test]
async fn test_should_descend_into_child_collection() {
    let service = seeded_service();

    let root = service
        .open_root_collection("alice", &root_uri(), &HashMap::new())
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("root collection missing"));

    let names: Vec<String> = service
        .child_collections("alice", root.handle)
        .unwrap_or_else(|e| panic!("list failed: {e}"))
        .collect()
        .await;
    assert_eq!(names, vec!["child"]);

    let child = service
        .open_child_collection("alice", root.handle, "child")
        .await
        .unwrap_or_else(|e| panic!("open child failed: {e}"))
        .unwrap_or_else(|| panic!("child missing"));
    assert_eq!(child.name, "/db/child");

    let ids: Vec<String> = service
        .list_resources("alice", child.handle)
        .unwrap_or_else(|e| panic!("list failed: {e}"))
        .collect()
        .await;
    assert_eq!(ids, vec!["test3.bin"]);
}

#[tokio::test]
async fn test_should_expose_resource_metadata() {
    let service = seeded_service();

    let root = service
        .open_root_collection("alice", &root_uri(), &HashMap::new())
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("root collection missing"));

    let xml = service
        .open_resource("alice", root.handle, "test1.xml")
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("resource missing"));
    assert_eq!(xml.kind, ResourceKind::Xml);
    assert_eq!(xml.kind.content_type(), "application/xml");

    let binary = service
        .open_resource("alice", root.handle, "test2.bin")
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("resource missing"));
    assert_eq!(binary.kind, ResourceKind::Binary);
    assert_ne!(xml.handle, binary.handle);
}

#[tokio::test]
async fn test_should_report_not_found_as_empty_result() {
    let service = seeded_service();

    let missing_root = service
        .open_root_collection("alice", "docstore://localhost/nope", &HashMap::new())
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"));
    assert!(missing_root.is_none());

    let root = service
        .open_root_collection("alice", &root_uri(), &HashMap::new())
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("root collection missing"));

    let missing_resource = service
        .open_resource("alice", root.handle, "nope.xml")
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"));
    assert!(missing_resource.is_none());
}

#[tokio::test]
async fn test_should_reject_malformed_uri() {
    let service = seeded_service();
    let result = service
        .open_root_collection("alice", "not-a-docstore-uri", &HashMap::new())
        .await;
    assert!(matches!(result, Err(DocStoreError::InvalidUri { .. })));
}

#[tokio::test]
async fn test_should_report_system_info() {
    let service = seeded_service();
    let info = service.system_info();
    assert!(!info.server_version.is_empty());
}
