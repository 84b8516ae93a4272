//! Integration tests for the DocStore service.
//!
//! These tests drive the service facade end-to-end over the in-memory
//! storage engine: browsing, chunked transfer round-trips, and session
//! lifecycle.

use std::sync::Arc;
use std::sync::Once;

use docstore_core::engine::{MemoryDatabase, ResourceContent};
use docstore_core::{DocStoreConfig, DocStoreService};
use docstore_model::ResourceKind;

#[cfg(test)]
mod test_browse;
#[cfg(test)]
mod test_session;
#[cfg(test)]
mod test_transfer;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Build a service over an engine seeded with the standard test layout:
///
/// ```text
/// /db            test1.xml (XML), test2.bin (binary)
/// /db/child      test3.bin (binary)
/// ```
#[must_use]
pub fn seeded_service() -> DocStoreService {
    init_tracing();

    let db = MemoryDatabase::new("testdatabase");
    let root = db.add_collection("/db");
    let child = db.add_collection("/db/child");
    root.add_child("child", child.clone());

    seed_resource(&root, "test1.xml", ResourceContent::Xml("<test>one</test>".to_owned()));
    seed_resource(
        &root,
        "test2.bin",
        ResourceContent::Binary(bytes::Bytes::from_static(&[0x10, 0x20, 0x30])),
    );
    seed_resource(
        &child,
        "test3.bin",
        ResourceContent::Binary(bytes::Bytes::from_static(&[0xAA])),
    );

    DocStoreService::new(Arc::new(db), DocStoreConfig::default())
}

fn seed_resource(
    collection: &Arc<docstore_core::engine::MemoryCollection>,
    id: &str,
    content: ResourceContent,
) {
    use docstore_core::engine::{Collection, Resource};

    let kind = match content {
        ResourceContent::Binary(_) => ResourceKind::Binary,
        ResourceContent::Xml(_) => ResourceKind::Xml,
    };
    let resource = collection
        .create_resource(id, kind)
        .unwrap_or_else(|e| panic!("seed create {id} failed: {e}"));
    resource
        .set_content(content)
        .unwrap_or_else(|e| panic!("seed content {id} failed: {e}"));
    collection
        .store(&resource)
        .unwrap_or_else(|e| panic!("seed store {id} failed: {e}"));
}

/// The root collection URI accepted by the default configuration.
#[must_use]
pub fn root_uri() -> String {
    "docstore://localhost/db".to_owned()
}

/// Generate a unique resource identifier for a test.
#[must_use]
pub fn test_resource_id(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("{prefix}-{id}")
}
