//! In-memory storage engine.
//!
//! [`MemoryDatabase`] implements the [`Database`] capability over concurrent
//! in-memory maps. It backs tests and local deployments; a production
//! deployment plugs a real document store into the same seam.
//!
//! Each open hands out a fresh [`MemoryResource`] *view* over the shared
//! stored document, so closing one opened instance never invalidates the
//! stored content or other concurrently open instances. [`Collection::store`]
//! snapshots the offered resource through the capability interface, which
//! keeps the engine usable with any [`Resource`] implementation.
//!
//! # Thread Safety
//!
//! All types are `Send + Sync`. Concurrent access is handled via `DashMap`
//! for the collection and document tables, `parking_lot::RwLock` for
//! document content, and atomic flags for open/closed state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use docstore_model::ResourceKind;
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::{Collection, Database, EngineError, Resource, ResourceContent};

// ---------------------------------------------------------------------------
// MemoryDatabase
// ---------------------------------------------------------------------------

/// In-memory [`Database`] holding root collections by path.
pub struct MemoryDatabase {
    name: String,
    collections: DashMap<String, Arc<MemoryCollection>>,
}

impl std::fmt::Debug for MemoryDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDatabase")
            .field("name", &self.name)
            .field("collection_count", &self.collections.len())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl MemoryDatabase {
    /// Create a new, empty engine instance.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collections: DashMap::new(),
        }
    }

    /// Get or create the root collection registered at `path`.
    #[must_use]
    pub fn add_collection(&self, path: &str) -> Arc<MemoryCollection> {
        self.collections
            .entry(path.to_owned())
            .or_insert_with(|| {
                debug!(path, "creating collection");
                MemoryCollection::create(path)
            })
            .clone()
    }
}

impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn open_collection(
        &self,
        identity: &str,
        path: &str,
        _options: &HashMap<String, String>,
    ) -> Result<Option<Arc<dyn Collection>>, EngineError> {
        if identity.is_empty() {
            return Err(EngineError::AccessRejected {
                identity: identity.to_owned(),
            });
        }
        trace!(identity, path, "opening collection");
        Ok(self
            .collections
            .get(path)
            .map(|c| c.clone() as Arc<dyn Collection>))
    }
}

// ---------------------------------------------------------------------------
// MemoryCollection
// ---------------------------------------------------------------------------

/// In-memory [`Collection`].
///
/// Resources created via [`Collection::create_resource`] are not listed
/// until they are stored, matching the create/store split of the capability
/// interface.
pub struct MemoryCollection {
    name: String,
    created_at: DateTime<Utc>,
    children: DashMap<String, Arc<MemoryCollection>>,
    docs: DashMap<String, Arc<StoredDoc>>,
    open: AtomicBool,
    self_ref: Weak<MemoryCollection>,
}

impl std::fmt::Debug for MemoryCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCollection")
            .field("name", &self.name)
            .field("child_count", &self.children.len())
            .field("resource_count", &self.docs.len())
            .finish_non_exhaustive()
    }
}

impl MemoryCollection {
    /// Create a new collection with the given name.
    #[must_use]
    pub fn create(name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|weak| Self {
            name,
            created_at: Utc::now(),
            children: DashMap::new(),
            docs: DashMap::new(),
            open: AtomicBool::new(true),
            self_ref: weak.clone(),
        })
    }

    /// Link `child` under this collection with the given short name.
    pub fn add_child(&self, name: impl Into<String>, child: Arc<MemoryCollection>) {
        self.children.insert(name.into(), child);
    }
}

impl Collection for MemoryCollection {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn child_collection_count(&self) -> usize {
        self.children.len()
    }

    fn child_collection_names(&self) -> Vec<String> {
        self.children.iter().map(|e| e.key().clone()).collect()
    }

    fn child_collection(&self, name: &str) -> Option<Arc<dyn Collection>> {
        self.children
            .get(name)
            .map(|c| c.clone() as Arc<dyn Collection>)
    }

    fn resource_count(&self) -> usize {
        self.docs.len()
    }

    fn resource_ids(&self) -> Vec<String> {
        self.docs.iter().map(|e| e.key().clone()).collect()
    }

    fn resource(&self, id: &str) -> Option<Arc<dyn Resource>> {
        self.docs.get(id).map(|doc| {
            Arc::new(MemoryResource::view(doc.clone(), self.self_ref.clone()))
                as Arc<dyn Resource>
        })
    }

    fn create_resource(
        &self,
        id: &str,
        kind: ResourceKind,
    ) -> Result<Arc<dyn Resource>, EngineError> {
        debug!(collection = %self.name, id, %kind, "creating resource");
        Ok(Arc::new(MemoryResource::new(
            id,
            kind,
            self.self_ref.clone(),
        )))
    }

    fn store(&self, resource: &Arc<dyn Resource>) -> Result<(), EngineError> {
        // Snapshot through the capability interface so any Resource
        // implementation can be stored, not just our own views.
        let mut buf = Vec::new();
        resource.write_content_to(&mut buf)?;
        let content = match resource.kind() {
            ResourceKind::Binary => ResourceContent::Binary(Bytes::from(buf)),
            ResourceKind::Xml => ResourceContent::Xml(String::from_utf8(buf).map_err(|e| {
                EngineError::Internal(anyhow::anyhow!(
                    "stored XML content is not valid UTF-8: {e}"
                ))
            })?),
        };

        debug!(collection = %self.name, id = resource.id(), len = content.len(), "storing resource");
        let doc = Arc::new(StoredDoc {
            id: resource.id().to_owned(),
            kind: resource.kind(),
            created_at: resource.created_at(),
            state: RwLock::new(DocState {
                content,
                modified_at: resource.modified_at(),
            }),
        });
        self.docs.insert(doc.id.clone(), doc);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<bool, EngineError> {
        let removed = self.docs.remove(id).is_some();
        if removed {
            debug!(collection = %self.name, id, "removed resource");
        }
        Ok(removed)
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    fn close(&self) {
        self.open.store(false, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// MemoryResource
// ---------------------------------------------------------------------------

/// Mutable content plus the timestamp it was last replaced.
#[derive(Debug)]
struct DocState {
    content: ResourceContent,
    modified_at: DateTime<Utc>,
}

/// Canonical stored document, shared by every open view of the resource.
#[derive(Debug)]
struct StoredDoc {
    id: String,
    kind: ResourceKind,
    created_at: DateTime<Utc>,
    state: RwLock<DocState>,
}

/// In-memory [`Resource`]: one open view over a shared document.
///
/// Closing a view marks only that view closed; the stored document and
/// other open views are unaffected.
#[derive(Debug)]
pub struct MemoryResource {
    doc: Arc<StoredDoc>,
    parent: Weak<MemoryCollection>,
    closed: AtomicBool,
}

impl MemoryResource {
    /// Create a view over a new, empty document of the given kind.
    #[must_use]
    pub fn new(id: &str, kind: ResourceKind, parent: Weak<MemoryCollection>) -> Self {
        let now = Utc::now();
        let content = match kind {
            ResourceKind::Binary => ResourceContent::Binary(Bytes::new()),
            ResourceKind::Xml => ResourceContent::Xml(String::new()),
        };
        Self::view(
            Arc::new(StoredDoc {
                id: id.to_owned(),
                kind,
                created_at: now,
                state: RwLock::new(DocState {
                    content,
                    modified_at: now,
                }),
            }),
            parent,
        )
    }

    fn view(doc: Arc<StoredDoc>, parent: Weak<MemoryCollection>) -> Self {
        Self {
            doc,
            parent,
            closed: AtomicBool::new(false),
        }
    }

    /// Snapshot of the current content.
    #[must_use]
    pub fn content(&self) -> ResourceContent {
        self.doc.state.read().content.clone()
    }
}

impl Resource for MemoryResource {
    fn id(&self) -> &str {
        &self.doc.id
    }

    fn kind(&self) -> ResourceKind {
        self.doc.kind
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.doc.created_at
    }

    fn modified_at(&self) -> DateTime<Utc> {
        self.doc.state.read().modified_at
    }

    fn parent_collection(&self) -> Option<Arc<dyn Collection>> {
        self.parent.upgrade().map(|c| c as Arc<dyn Collection>)
    }

    fn write_content_to(&self, sink: &mut dyn std::io::Write) -> Result<(), EngineError> {
        if self.is_closed() {
            return Err(EngineError::Closed {
                id: self.doc.id.clone(),
            });
        }
        let state = self.doc.state.read();
        match &state.content {
            ResourceContent::Binary(data) => sink.write_all(data)?,
            ResourceContent::Xml(text) => sink.write_all(text.as_bytes())?,
        }
        Ok(())
    }

    fn set_content(&self, content: ResourceContent) -> Result<(), EngineError> {
        if self.is_closed() {
            return Err(EngineError::Closed {
                id: self.doc.id.clone(),
            });
        }
        if content.kind() != self.doc.kind {
            return Err(EngineError::KindMismatch {
                id: self.doc.id.clone(),
                expected: self.doc.kind,
                actual: content.kind(),
            });
        }
        trace!(id = %self.doc.id, len = content.len(), "replacing resource content");
        let mut state = self.doc.state.write();
        state.content = content;
        state.modified_at = Utc::now();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
