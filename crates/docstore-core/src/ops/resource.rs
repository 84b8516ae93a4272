//! Resource operation handlers.
//!
//! Implements open, create, remove, and close for resources. Open returns
//! `Ok(None)` for identifiers that do not resolve; create either succeeds
//! or fails; close is an idempotent acknowledgment.

use std::sync::Arc;

use docstore_model::{Handle, ResourceKind, ResourceMeta};
use tracing::{debug, info};

use crate::engine::Resource;
use crate::error::{DocStoreError, DocStoreResult};
use crate::provider::DocStoreService;
use crate::session::Session;

/// Register an opened resource and build its metadata record.
fn register_resource_meta(
    session: &Session,
    resource: Arc<dyn Resource>,
    id: &str,
) -> ResourceMeta {
    let kind = resource.kind();
    let created_at = resource.created_at();
    let modified_at = resource.modified_at();
    let handle = session.register_resource(resource, id.to_owned());
    ResourceMeta {
        handle,
        id: id.to_owned(),
        kind,
        created_at,
        modified_at,
    }
}

// These handlers stay async to match the remote-call boundary; most of the
// underlying registry work is synchronous.
#[allow(clippy::unused_async)]
impl DocStoreService {
    /// Open a resource of an open collection by identifier.
    ///
    /// Returns `Ok(None)` if the collection holds no resource with that
    /// identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::UnknownCollectionHandle`] if the collection
    /// handle is not registered.
    pub async fn open_resource(
        &self,
        identity: &str,
        collection: Handle,
        resource_id: &str,
    ) -> DocStoreResult<Option<ResourceMeta>> {
        let session = self.session(identity);
        let parent = session
            .lookup_collection(collection)
            .ok_or(DocStoreError::UnknownCollectionHandle { handle: collection })?;
        debug!(identity, collection = %parent.name(), id = resource_id, "opening resource");

        let Some(resource) = parent.resource(resource_id) else {
            debug!(identity, id = resource_id, "resource not found");
            return Ok(None);
        };
        Ok(Some(register_resource_meta(&session, resource, resource_id)))
    }

    /// Create a new, empty resource in an open collection and open it.
    ///
    /// The resource is not listed in the collection until content is stored
    /// for it (see [`DocStoreService::store_resource`]).
    ///
    /// # Errors
    ///
    /// - [`DocStoreError::UnknownCollectionHandle`] if the collection
    ///   handle is not registered.
    /// - [`DocStoreError::Engine`] if the engine refuses the creation.
    pub async fn create_resource(
        &self,
        identity: &str,
        collection: Handle,
        resource_id: &str,
        kind: ResourceKind,
    ) -> DocStoreResult<ResourceMeta> {
        let session = self.session(identity);
        let parent = session
            .lookup_collection(collection)
            .ok_or(DocStoreError::UnknownCollectionHandle { handle: collection })?;
        info!(identity, collection = %parent.name(), id = resource_id, %kind, "creating resource");

        let resource = parent.create_resource(resource_id, kind)?;
        Ok(register_resource_meta(&session, resource, resource_id))
    }

    /// Remove a resource from an open collection. Returns whether the
    /// resource existed.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::UnknownCollectionHandle`] if the collection
    /// handle is not registered.
    pub async fn remove_resource(
        &self,
        identity: &str,
        collection: Handle,
        resource_id: &str,
    ) -> DocStoreResult<bool> {
        let session = self.session(identity);
        let parent = session
            .lookup_collection(collection)
            .ok_or(DocStoreError::UnknownCollectionHandle { handle: collection })?;
        info!(identity, collection = %parent.name(), id = resource_id, "removing resource");
        Ok(parent.remove(resource_id)?)
    }

    /// Close an open resource. Idempotent: closing an unknown or
    /// already-closed handle is a logged no-op.
    pub async fn close_resource(&self, identity: &str, handle: Handle) -> DocStoreResult<()> {
        debug!(identity, %handle, "close_resource");
        let _ = self.session(identity).close_resource(handle);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
