//! Storage engine capability interface.
//!
//! The transfer core never talks to a concrete document store; it calls
//! through the small capability seam defined here:
//!
//! - [`Database`] -- opens root collections for an identity
//! - [`Collection`] -- enumerates and owns child collections and resources
//! - [`Resource`] -- exposes content as a push-style byte source and a
//!   whole-value setter
//!
//! [`MemoryDatabase`] provides the in-memory implementation used by tests
//! and local deployments.
//!
//! All traits are synchronous: the underlying document API is blocking, and
//! the transfer core bridges it onto the async runtime where needed (see
//! [`crate::download`]).

pub(crate) mod memory;

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use docstore_model::ResourceKind;

pub use memory::{MemoryCollection, MemoryDatabase, MemoryResource};

/// Error type for storage engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine rejected the caller's identity during an open call.
    #[error("access rejected for identity: {identity}")]
    AccessRejected {
        /// The rejected identity.
        identity: String,
    },

    /// Content of one kind was applied to a resource of another kind.
    #[error("content kind mismatch for resource {id}: expected {expected}, got {actual}")]
    KindMismatch {
        /// The resource identifier.
        id: String,
        /// The resource's declared kind.
        expected: ResourceKind,
        /// The kind of the offered content.
        actual: ResourceKind,
    },

    /// Operation attempted on a closed resource.
    #[error("resource is closed: {id}")]
    Closed {
        /// The resource identifier.
        id: String,
    },

    /// I/O failure while producing or consuming content.
    #[error("content I/O error: {0}")]
    Io(#[from] io::Error),

    /// Internal engine error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Content of a resource, tagged by kind.
///
/// The commit path of an upload dispatches on this union rather than on a
/// subclass hierarchy.
#[derive(Clone)]
pub enum ResourceContent {
    /// Raw binary content.
    Binary(Bytes),
    /// XML text content (UTF-8).
    Xml(String),
}

impl ResourceContent {
    /// The kind tag matching this content variant.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Binary(_) => ResourceKind::Binary,
            Self::Xml(_) => ResourceKind::Xml,
        }
    }

    /// Content length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Binary(data) => data.len(),
            Self::Xml(text) => text.len(),
        }
    }

    /// Returns true if the content is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ResourceContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(data) => f.debug_struct("Binary").field("len", &data.len()).finish(),
            Self::Xml(text) => f.debug_struct("Xml").field("len", &text.len()).finish(),
        }
    }
}

/// Entry point of the storage engine: opens root collections.
pub trait Database: Send + Sync + fmt::Debug {
    /// Engine instance name.
    fn name(&self) -> &str;

    /// Open the root collection at `path` for the given identity.
    ///
    /// Returns `Ok(None)` if no collection exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::AccessRejected`] if the engine refuses the
    /// identity.
    fn open_collection(
        &self,
        identity: &str,
        path: &str,
        options: &HashMap<String, String>,
    ) -> Result<Option<Arc<dyn Collection>>, EngineError>;
}

/// A collection of resources and child collections.
pub trait Collection: Send + Sync + fmt::Debug {
    /// Collection name, as registered with the engine.
    fn name(&self) -> String;

    /// Creation timestamp.
    fn created_at(&self) -> DateTime<Utc>;

    /// Number of direct child collections.
    fn child_collection_count(&self) -> usize;

    /// Names of all direct child collections.
    fn child_collection_names(&self) -> Vec<String>;

    /// Look up a direct child collection by name.
    fn child_collection(&self, name: &str) -> Option<Arc<dyn Collection>>;

    /// Number of resources directly in this collection.
    fn resource_count(&self) -> usize;

    /// Identifiers of all resources directly in this collection.
    fn resource_ids(&self) -> Vec<String>;

    /// Look up a resource by identifier.
    fn resource(&self, id: &str) -> Option<Arc<dyn Resource>>;

    /// Create a new, empty resource of the given kind.
    ///
    /// The resource is not listed in the collection until
    /// [`store`](Self::store) is called for it.
    fn create_resource(&self, id: &str, kind: ResourceKind)
    -> Result<Arc<dyn Resource>, EngineError>;

    /// Store (insert or replace) a resource under its identifier.
    fn store(&self, resource: &Arc<dyn Resource>) -> Result<(), EngineError>;

    /// Remove a resource by identifier. Returns whether it existed.
    fn remove(&self, id: &str) -> Result<bool, EngineError>;

    /// Whether the collection is still open.
    fn is_open(&self) -> bool;

    /// Close the collection, releasing engine-side state.
    fn close(&self);
}

/// A single document resource.
pub trait Resource: Send + Sync + fmt::Debug {
    /// Resource identifier within its parent collection.
    fn id(&self) -> &str;

    /// Content kind discriminator.
    fn kind(&self) -> ResourceKind;

    /// Creation timestamp.
    fn created_at(&self) -> DateTime<Utc>;

    /// Last modification timestamp.
    fn modified_at(&self) -> DateTime<Utc>;

    /// The collection this resource belongs to, if still reachable.
    fn parent_collection(&self) -> Option<Arc<dyn Collection>>;

    /// Write the full content into `sink` (push-style byte source).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] if the resource was closed, or
    /// [`EngineError::Io`] if the sink fails.
    fn write_content_to(&self, sink: &mut dyn io::Write) -> Result<(), EngineError>;

    /// Replace the resource content (whole-value store).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::KindMismatch`] if the content variant does not
    /// match the resource kind, or [`EngineError::Closed`] if the resource
    /// was closed.
    fn set_content(&self, content: ResourceContent) -> Result<(), EngineError>;

    /// Whether the resource has been closed.
    fn is_closed(&self) -> bool;

    /// Close the resource, releasing engine-side state.
    fn close(&self);
}
