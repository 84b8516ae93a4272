//! Per-identity handle registry.
//!
//! A [`Session`] is the single source of truth for "is this handle currently
//! valid". It owns two independent handle maps -- open collections and open
//! resources -- so a handle from one space can never resolve in the other.
//! [`SessionRegistry`] creates sessions lazily per authenticated identity
//! and implements the eviction policy (explicit logout plus idle sweep).
//!
//! # Thread Safety
//!
//! All maps are `DashMap`s; registration, lookup, and close are
//! linearizable with respect to each other without caller-side locking.
//! Close removes the entry from the map *before* closing the underlying
//! object, so no concurrent lookup can observe a closed object through the
//! registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use docstore_model::{Handle, ResourceKind, ResourceMeta};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::engine::{Collection, EngineError, Resource};

/// Allocate a fresh opaque handle.
///
/// Two independent 64-bit random words from a v4 UUID; effectively unique
/// for the process lifetime at any realistic handle volume.
#[must_use]
pub fn new_handle() -> Handle {
    let (msb, lsb) = Uuid::new_v4().as_u64_pair();
    Handle::from_halves(msb, lsb)
}

// ---------------------------------------------------------------------------
// ResourceEntry
// ---------------------------------------------------------------------------

/// Binds one opened resource handle to the underlying resource and the
/// identifier it was opened under.
///
/// The entry owns the resource's close lifecycle: whoever holds the entry
/// last (the session, or an upload that claimed it) must call
/// [`close`](Self::close).
#[derive(Debug)]
pub struct ResourceEntry {
    resource: Arc<dyn Resource>,
    original_id: String,
}

impl ResourceEntry {
    /// Create an entry for a freshly opened resource.
    #[must_use]
    pub fn new(resource: Arc<dyn Resource>, original_id: String) -> Self {
        Self {
            resource,
            original_id,
        }
    }

    /// The underlying resource.
    #[must_use]
    pub fn resource(&self) -> &Arc<dyn Resource> {
        &self.resource
    }

    /// The identifier the resource was opened or created under.
    #[must_use]
    pub fn original_id(&self) -> &str {
        &self.original_id
    }

    /// Content kind of the underlying resource.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }

    /// Write the full resource content into `sink`.
    ///
    /// # Errors
    ///
    /// Propagates engine failures from the underlying resource.
    pub fn write_content_to(&self, sink: &mut dyn std::io::Write) -> Result<(), EngineError> {
        self.resource.write_content_to(sink)
    }

    /// The parent collection of the underlying resource, if reachable.
    #[must_use]
    pub fn parent_collection(&self) -> Option<Arc<dyn Collection>> {
        self.resource.parent_collection()
    }

    /// Build the metadata record for this entry under the given handle.
    #[must_use]
    pub fn meta(&self, handle: Handle) -> ResourceMeta {
        ResourceMeta {
            handle,
            id: self.original_id.clone(),
            kind: self.resource.kind(),
            created_at: self.resource.created_at(),
            modified_at: self.resource.modified_at(),
        }
    }

    /// Close the underlying resource.
    pub fn close(&self) {
        self.resource.close();
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Per-identity container of open handles.
pub struct Session {
    identity: String,
    collections: DashMap<Handle, Arc<dyn Collection>>,
    resources: DashMap<Handle, Arc<ResourceEntry>>,
    last_access: Mutex<Instant>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity)
            .field("open_collections", &self.collections.len())
            .field("open_resources", &self.resources.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    fn new(identity: String) -> Self {
        Self {
            identity,
            collections: DashMap::new(),
            resources: DashMap::new(),
            last_access: Mutex::new(Instant::now()),
        }
    }

    /// The identity this session belongs to.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Register an opened collection under a fresh handle.
    ///
    /// Every call allocates a new handle, even for an object that is
    /// already registered -- open calls never share handles.
    #[must_use]
    pub fn register_collection(&self, collection: Arc<dyn Collection>) -> Handle {
        let handle = new_handle();
        self.collections.insert(handle, collection);
        debug!(identity = %self.identity, %handle, "registered collection");
        handle
    }

    /// Register an opened resource under a fresh handle.
    #[must_use]
    pub fn register_resource(&self, resource: Arc<dyn Resource>, original_id: String) -> Handle {
        let handle = new_handle();
        self.resources
            .insert(handle, Arc::new(ResourceEntry::new(resource, original_id)));
        debug!(identity = %self.identity, %handle, "registered resource");
        handle
    }

    /// Look up an open collection. `None` means the handle is not (or no
    /// longer) valid in this session.
    #[must_use]
    pub fn lookup_collection(&self, handle: Handle) -> Option<Arc<dyn Collection>> {
        self.collections.get(&handle).map(|c| c.clone())
    }

    /// Look up an open resource entry.
    #[must_use]
    pub fn lookup_resource(&self, handle: Handle) -> Option<Arc<ResourceEntry>> {
        self.resources.get(&handle).map(|e| e.clone())
    }

    /// Remove a resource entry from the session, transferring ownership of
    /// its close lifecycle to the caller.
    ///
    /// Used by the upload path: the accumulator claims the entry and is then
    /// responsible for closing it on every exit path.
    #[must_use]
    pub fn take_resource(&self, handle: Handle) -> Option<Arc<ResourceEntry>> {
        self.resources.remove(&handle).map(|(_, entry)| entry)
    }

    /// Close an open collection. Returns whether the handle was found;
    /// closing an unknown handle is a logged no-op.
    pub fn close_collection(&self, handle: Handle) -> bool {
        match self.collections.remove(&handle) {
            Some((_, collection)) => {
                info!(identity = %self.identity, name = %collection.name(), "closing collection");
                collection.close();
                true
            }
            None => {
                warn!(identity = %self.identity, %handle, "collection not found");
                false
            }
        }
    }

    /// Close an open resource. Returns whether the handle was found;
    /// closing an unknown handle is a logged no-op.
    pub fn close_resource(&self, handle: Handle) -> bool {
        match self.resources.remove(&handle) {
            Some((_, entry)) => {
                info!(identity = %self.identity, id = entry.original_id(), "closing resource");
                entry.close();
                true
            }
            None => {
                warn!(identity = %self.identity, %handle, "resource not found");
                false
            }
        }
    }

    /// Number of currently open collection handles.
    #[must_use]
    pub fn open_collection_count(&self) -> usize {
        self.collections.len()
    }

    /// Number of currently open resource handles.
    #[must_use]
    pub fn open_resource_count(&self) -> usize {
        self.resources.len()
    }

    /// Record activity on this session.
    pub fn touch(&self) {
        *self.last_access.lock() = Instant::now();
    }

    /// How long the session has been idle.
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_access.lock().elapsed()
    }

    /// Close every handle still open in this session.
    fn close_all(&self) {
        let collection_handles: Vec<Handle> = self.collections.iter().map(|e| *e.key()).collect();
        for handle in collection_handles {
            let _ = self.close_collection(handle);
        }
        let resource_handles: Vec<Handle> = self.resources.iter().map(|e| *e.key()).collect();
        for handle in resource_handles {
            let _ = self.close_resource(handle);
        }
    }
}

// ---------------------------------------------------------------------------
// SessionRegistry
// ---------------------------------------------------------------------------

/// Identity-keyed store of [`Session`]s.
///
/// Sessions are created lazily on first request for an identity and live
/// until explicitly closed or evicted by the idle sweep.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Session>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("session_count", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Create a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Get or lazily create the session for `identity`, marking it active.
    #[must_use]
    pub fn get_or_create(&self, identity: &str) -> Arc<Session> {
        let session = self
            .sessions
            .entry(identity.to_owned())
            .or_insert_with(|| {
                info!(identity, "creating session");
                Arc::new(Session::new(identity.to_owned()))
            })
            .clone();
        session.touch();
        session
    }

    /// Get the session for `identity`, if one exists.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<Arc<Session>> {
        self.sessions.get(identity).map(|s| s.clone())
    }

    /// Explicit logout: remove the identity's session and close every
    /// handle it still holds. Returns whether a session existed.
    pub fn close_session(&self, identity: &str) -> bool {
        match self.sessions.remove(identity) {
            Some((_, session)) => {
                info!(identity, "closing session");
                session.close_all();
                true
            }
            None => false,
        }
    }

    /// Evict every session idle for longer than `max_idle`, closing all of
    /// its handles. Returns the number of sessions evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let idle: Vec<String> = self
            .sessions
            .iter()
            .filter(|e| e.value().idle_for() > max_idle)
            .map(|e| e.key().clone())
            .collect();

        let mut evicted = 0;
        for identity in idle {
            // Re-check under removal: the session may have been touched
            // between the scan and now.
            if let Some((_, session)) = self
                .sessions
                .remove_if(&identity, |_, s| s.idle_for() > max_idle)
            {
                info!(identity = %identity, "evicting idle session");
                session.close_all();
                evicted += 1;
            }
        }
        evicted
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the registry has no live sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
