//! Collection operation handlers.
//!
//! Implements root/child open, close, the two counts, and the streaming
//! name lists. Opens return `Ok(None)` for paths or names that do not
//! resolve; operations on a handle that is not registered fail with
//! [`DocStoreError::UnknownCollectionHandle`]; close is an idempotent
//! acknowledgment.

use std::collections::HashMap;
use std::sync::Arc;

use docstore_model::{CollectionMeta, Handle};
use futures::Stream;
use futures::stream;
use tracing::{debug, info};

use crate::engine::Collection;
use crate::error::{DocStoreError, DocStoreResult};
use crate::provider::DocStoreService;
use crate::session::Session;

/// Register an opened collection and build its metadata record.
fn register_collection_meta(session: &Session, collection: Arc<dyn Collection>) -> CollectionMeta {
    let name = collection.name();
    let created_at = collection.created_at();
    let handle = session.register_collection(collection);
    CollectionMeta {
        handle,
        name,
        created_at,
    }
}

// These handlers stay async to match the remote-call boundary; most of the
// underlying registry work is synchronous.
#[allow(clippy::unused_async)]
impl DocStoreService {
    /// Open a root collection by URI.
    ///
    /// The URI must carry the configured prefix; the collection path is the
    /// part starting at the first `/` after the authority. Returns
    /// `Ok(None)` if the engine has no collection at that path.
    ///
    /// # Errors
    ///
    /// - [`DocStoreError::InvalidUri`] for URIs that don't match the prefix
    ///   or carry no path.
    /// - [`DocStoreError::Engine`] for engine failures, including rejected
    ///   identities.
    pub async fn open_root_collection(
        &self,
        identity: &str,
        uri: &str,
        options: &HashMap<String, String>,
    ) -> DocStoreResult<Option<CollectionMeta>> {
        info!(identity, uri, "opening root collection");
        let path = self.collection_path(uri)?;
        let Some(collection) = self.database.open_collection(identity, &path, options)? else {
            debug!(identity, path, "collection not found");
            return Ok(None);
        };
        let session = self.session(identity);
        Ok(Some(register_collection_meta(&session, collection)))
    }

    /// Open a child collection of an already-open parent.
    ///
    /// Returns `Ok(None)` if the parent has no child with that name.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::UnknownCollectionHandle`] if the parent
    /// handle is not registered.
    pub async fn open_child_collection(
        &self,
        identity: &str,
        parent: Handle,
        child_name: &str,
    ) -> DocStoreResult<Option<CollectionMeta>> {
        let session = self.session(identity);
        let parent_collection = session
            .lookup_collection(parent)
            .ok_or(DocStoreError::UnknownCollectionHandle { handle: parent })?;
        info!(identity, parent = %parent_collection.name(), child = child_name, "opening child collection");

        let Some(child) = parent_collection.child_collection(child_name) else {
            debug!(identity, child = child_name, "child collection not found");
            return Ok(None);
        };
        Ok(Some(register_collection_meta(&session, child)))
    }

    /// Close an open collection. Idempotent: closing an unknown or
    /// already-closed handle is a logged no-op.
    pub async fn close_collection(&self, identity: &str, handle: Handle) -> DocStoreResult<()> {
        debug!(identity, %handle, "close_collection");
        let _ = self.session(identity).close_collection(handle);
        Ok(())
    }

    /// Number of direct child collections of an open collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::UnknownCollectionHandle`] if the handle is
    /// not registered.
    pub async fn collection_count(&self, identity: &str, handle: Handle) -> DocStoreResult<u64> {
        debug!(identity, %handle, "collection_count");
        let collection = self
            .session(identity)
            .lookup_collection(handle)
            .ok_or(DocStoreError::UnknownCollectionHandle { handle })?;
        Ok(collection.child_collection_count() as u64)
    }

    /// Number of resources directly in an open collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::UnknownCollectionHandle`] if the handle is
    /// not registered.
    pub async fn resource_count(&self, identity: &str, handle: Handle) -> DocStoreResult<u64> {
        debug!(identity, %handle, "resource_count");
        let collection = self
            .session(identity)
            .lookup_collection(handle)
            .ok_or(DocStoreError::UnknownCollectionHandle { handle })?;
        Ok(collection.resource_count() as u64)
    }

    /// Stream the names of all direct child collections.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::UnknownCollectionHandle`] if the handle is
    /// not registered.
    pub fn child_collections(
        &self,
        identity: &str,
        handle: Handle,
    ) -> DocStoreResult<impl Stream<Item = String> + use<>> {
        debug!(identity, %handle, "child_collections");
        let collection = self
            .session(identity)
            .lookup_collection(handle)
            .ok_or(DocStoreError::UnknownCollectionHandle { handle })?;
        Ok(stream::iter(collection.child_collection_names()))
    }

    /// Stream the identifiers of all resources in an open collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::UnknownCollectionHandle`] if the handle is
    /// not registered.
    pub fn list_resources(
        &self,
        identity: &str,
        handle: Handle,
    ) -> DocStoreResult<impl Stream<Item = String> + use<>> {
        debug!(identity, %handle, "list_resources");
        let collection = self
            .session(identity)
            .lookup_collection(handle)
            .ok_or(DocStoreError::UnknownCollectionHandle { handle })?;
        Ok(stream::iter(collection.resource_ids()))
    }

    /// Extract the collection path from a prefixed URI.
    fn collection_path(&self, uri: &str) -> DocStoreResult<String> {
        let rest = uri
            .strip_prefix(self.config.uri_prefix.as_str())
            .ok_or_else(|| DocStoreError::InvalidUri {
                uri: uri.to_owned(),
            })?;
        let path_start = rest.find('/').ok_or_else(|| DocStoreError::InvalidUri {
            uri: uri.to_owned(),
        })?;
        Ok(rest[path_start..].to_owned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
