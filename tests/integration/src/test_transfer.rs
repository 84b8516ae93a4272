//! Chunked transfer: download fidelity, upload outcomes, round-trips.

use std::collections::HashMap;

use bytes::Bytes;
use docstore_model::{Handle, ResourceKind, StoreRequest, TransferStatus};
use futures::{StreamExt, stream};

use crate::{root_uri, seeded_service, test_resource_id};

async fn open_root_handle(service: &docstore_core::DocStoreService) -> Handle {
    service
        .open_root_collection("alice", &root_uri(), &HashMap::new())
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("root collection missing"))
        .handle
}

async fn download_bytes(
    service: &docstore_core::DocStoreService,
    handle: Handle,
    chunk_size: usize,
) -> Vec<Vec<u8>> {
    service
        .download_resource("alice", handle, chunk_size)
        .unwrap_or_else(|e| panic!("download failed: {e}"))
        .map(|item| item.unwrap_or_else(|e| panic!("stream failed: {e}")))
        .map(|chunk| chunk.data.to_vec())
        .collect()
        .await
}

#[tokio::test]
async fn test_should_download_seeded_resource_in_chunks() {
    let service = seeded_service();
    let root = open_root_handle(&service).await;

    let meta = service
        .open_resource("alice", root, "test2.bin")
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("resource missing"));

    let chunks = download_bytes(&service, meta.handle, 2).await;
    assert_eq!(chunks, vec![vec![0x10, 0x20], vec![0x30]]);
}

#[tokio::test]
async fn test_should_round_trip_binary_upload_and_download() {
    let service = seeded_service();
    let root = open_root_handle(&service).await;
    let id = test_resource_id("blob");

    let created = service
        .create_resource("alice", root, &id, ResourceKind::Binary)
        .await
        .unwrap_or_else(|e| panic!("create failed: {e}"));

    // Upload [0x01, 0x02], [0x03] with chunk size 2.
    let outcome = service
        .store_resource(
            "alice",
            stream::iter(vec![
                StoreRequest::new(created.handle, vec![0x01u8, 0x02]),
                StoreRequest::chunk(vec![0x03u8]),
            ]),
        )
        .await;
    assert_eq!(outcome.status, TransferStatus::Success);
    let stored = outcome.meta.unwrap_or_else(|| panic!("meta missing"));
    assert_eq!(stored.handle, created.handle);
    assert_eq!(stored.id, id);

    // Download with chunk size 1: exactly [0x01], [0x02], [0x03].
    let reopened = service
        .open_resource("alice", root, &id)
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("resource missing"));
    let chunks = download_bytes(&service, reopened.handle, 1).await;
    assert_eq!(chunks, vec![vec![0x01], vec![0x02], vec![0x03]]);
}

#[tokio::test]
async fn test_should_round_trip_xml_upload_and_download() {
    let service = seeded_service();
    let root = open_root_handle(&service).await;
    let id = test_resource_id("doc");

    let created = service
        .create_resource("alice", root, &id, ResourceKind::Xml)
        .await
        .unwrap_or_else(|e| panic!("create failed: {e}"));

    let payload = b"<doc><title>integration</title></doc>";
    let outcome = service
        .store_resource(
            "alice",
            stream::iter(vec![
                StoreRequest::new(created.handle, Bytes::from_static(&payload[..10])),
                StoreRequest::chunk(Bytes::from_static(&payload[10..])),
            ]),
        )
        .await;
    assert_eq!(outcome.status, TransferStatus::Success);

    let reopened = service
        .open_resource("alice", root, &id)
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("resource missing"));
    assert_eq!(reopened.kind, ResourceKind::Xml);

    let chunks = download_bytes(&service, reopened.handle, 16).await;
    let reassembled: Vec<u8> = chunks.into_iter().flatten().collect();
    assert_eq!(reassembled, payload);
}

#[tokio::test]
async fn test_should_download_empty_resource_as_zero_chunks() {
    let service = seeded_service();
    let root = open_root_handle(&service).await;
    let id = test_resource_id("empty");

    let created = service
        .create_resource("alice", root, &id, ResourceKind::Binary)
        .await
        .unwrap_or_else(|e| panic!("create failed: {e}"));

    let chunks = download_bytes(&service, created.handle, 8).await;
    assert!(chunks.is_empty());
}

#[tokio::test]
async fn test_should_report_invalid_upload_without_store() {
    let service = seeded_service();
    let root = open_root_handle(&service).await;

    let before = service
        .resource_count("alice", root)
        .await
        .unwrap_or_else(|e| panic!("count failed: {e}"));

    let outcome = service
        .store_resource(
            "alice",
            stream::iter(vec![StoreRequest::new(
                docstore_core::session::new_handle(),
                vec![1u8, 2, 3],
            )]),
        )
        .await;
    assert_eq!(outcome.status, TransferStatus::Invalid);
    assert!(outcome.meta.is_none());

    let after = service
        .resource_count("alice", root)
        .await
        .unwrap_or_else(|e| panic!("count failed: {e}"));
    assert_eq!(before, after, "a rejected upload must not store anything");
}

#[tokio::test]
async fn test_should_invalidate_upload_handle_after_transfer() {
    let service = seeded_service();
    let root = open_root_handle(&service).await;
    let id = test_resource_id("once");

    let created = service
        .create_resource("alice", root, &id, ResourceKind::Binary)
        .await
        .unwrap_or_else(|e| panic!("create failed: {e}"));

    let outcome = service
        .store_resource(
            "alice",
            stream::iter(vec![StoreRequest::new(created.handle, vec![9u8])]),
        )
        .await;
    assert_eq!(outcome.status, TransferStatus::Success);

    // The upload consumed the handle; a second upload through it is invalid.
    let second = service
        .store_resource(
            "alice",
            stream::iter(vec![StoreRequest::new(created.handle, vec![8u8])]),
        )
        .await;
    assert_eq!(second.status, TransferStatus::Invalid);

    // The stored content is the first upload's.
    let reopened = service
        .open_resource("alice", root, &id)
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("resource missing"));
    let chunks = download_bytes(&service, reopened.handle, 4).await;
    assert_eq!(chunks, vec![vec![9u8]]);
}

#[tokio::test]
async fn test_should_stop_download_on_cancellation() {
    let service = seeded_service();
    let root = open_root_handle(&service).await;
    let id = test_resource_id("large");

    let created = service
        .create_resource("alice", root, &id, ResourceKind::Binary)
        .await
        .unwrap_or_else(|e| panic!("create failed: {e}"));
    let outcome = service
        .store_resource(
            "alice",
            stream::iter(vec![StoreRequest::new(created.handle, vec![0x5Au8; 64])]),
        )
        .await;
    assert_eq!(outcome.status, TransferStatus::Success);

    let reopened = service
        .open_resource("alice", root, &id)
        .await
        .unwrap_or_else(|e| panic!("open failed: {e}"))
        .unwrap_or_else(|| panic!("resource missing"));

    // Take one of the expected chunks, then cancel by dropping the stream.
    let mut download = service
        .download_resource("alice", reopened.handle, 16)
        .unwrap_or_else(|e| panic!("download failed: {e}"));
    let first = download
        .next()
        .await
        .unwrap_or_else(|| panic!("expected a chunk"))
        .unwrap_or_else(|e| panic!("stream failed: {e}"));
    assert_eq!(first.data.len(), 16);
    drop(download);

    // The resource stays open and downloadable after a cancelled stream.
    let chunks = download_bytes(&service, reopened.handle, 64).await;
    assert_eq!(chunks, vec![vec![0x5Au8; 64]]);
}
