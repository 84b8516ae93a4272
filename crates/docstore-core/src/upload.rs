//! Upload accumulator: chunk sequence to committed resource content.
//!
//! [`StoreContext`] consumes one stream of [`StoreRequest`]s. The first
//! request pins the target resource: its handle is resolved against the
//! session exactly once, and the entry is *taken* out of the session map so
//! the accumulator owns its close lifecycle. If the handle does not resolve
//! the context degrades to a no-op sink -- it keeps draining the stream
//! without error so the transport completes normally, and reports
//! [`TransferStatus::Invalid`] at the end.
//!
//! Payloads are buffered in arrival order and committed as a whole on
//! [`finish`](StoreContext::finish): the content setter is selected by the
//! resource's kind, the resource is stored through its parent collection,
//! and the stored resource's metadata is returned tagged with the original
//! handle. Commit failures produce [`TransferStatus::Failure`]; `finish`
//! never fails past this boundary.
//!
//! The claimed entry is released on *every* exit path: `finish` closes it
//! after the commit attempt, and the `Drop` guard closes it when an aborted
//! transport stream discards the context early.
//!
//! Merging two partially-filled contexts is intentionally unsupported; the
//! protocol is single-writer, single-stream per resource.

use std::mem;
use std::sync::Arc;

use bytes::BytesMut;
use docstore_model::{Handle, ResourceKind, StoreRequest, TransferResult, TransferStatus};
use tracing::{debug, error, trace, warn};

use crate::engine::{Collection, Resource, ResourceContent};
use crate::session::{ResourceEntry, Session};

/// Accumulates the chunks of one upload stream and commits them atomically.
pub struct StoreContext {
    session: Arc<Session>,
    status: TransferStatus,
    handle: Option<Handle>,
    entry: Option<Arc<ResourceEntry>>,
    buf: BytesMut,
}

impl std::fmt::Debug for StoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreContext")
            .field("status", &self.status)
            .field("handle", &self.handle)
            .field("buffered", &self.buf.len())
            .finish_non_exhaustive()
    }
}

impl StoreContext {
    /// Create an accumulator bound to the caller's session.
    #[must_use]
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            status: TransferStatus::Undefined,
            handle: None,
            entry: None,
            buf: BytesMut::new(),
        }
    }

    /// Current transfer status.
    #[must_use]
    pub fn status(&self) -> TransferStatus {
        self.status
    }

    /// Process one inbound request.
    ///
    /// Never fails: once the context is rejected or failed it silently
    /// discards further payloads.
    pub fn accept(&mut self, request: StoreRequest) {
        trace!(len = request.data.len(), "accept");
        if self.status == TransferStatus::Undefined {
            self.start(request.handle);
        } else if let Some(handle) = request.handle {
            if self.handle != Some(handle) {
                // First chunk pins the target; flag misbehaving clients.
                warn!(%handle, "ignoring mismatched handle on upload chunk");
            }
        }

        if self.status == TransferStatus::Success {
            self.buf.extend_from_slice(&request.data);
            trace!(buffered = self.buf.len(), "written chunk to buffer");
        } else {
            debug!(status = %self.status, "ignoring chunk as resource is not ready to write to");
        }
    }

    /// Resolve the target resource from the first request.
    fn start(&mut self, handle: Option<Handle>) {
        let Some(handle) = handle else {
            warn!("first upload chunk carries no resource handle");
            self.status = TransferStatus::Invalid;
            return;
        };
        self.handle = Some(handle);
        match self.session.take_resource(handle) {
            Some(entry) => {
                debug!(%handle, id = entry.original_id(), "prepared buffer for chunk data");
                self.entry = Some(entry);
                self.status = TransferStatus::Success;
            }
            None => {
                warn!(%handle, "resource not found to write to");
                self.status = TransferStatus::Invalid;
            }
        }
    }

    /// Complete the stream: commit the buffered content and release the
    /// claimed entry.
    ///
    /// Always returns a well-formed [`TransferResult`]; commit failures are
    /// reported through [`TransferStatus::Failure`], never as a panic or
    /// error.
    #[must_use]
    pub fn finish(mut self) -> TransferResult {
        debug!(status = %self.status, buffered = self.buf.len(), "finish");
        let status = self.status;
        let (Some(entry), Some(handle)) = (self.entry.take(), self.handle) else {
            return TransferResult::with_status(status);
        };

        let result = if status == TransferStatus::Success {
            Self::commit(&entry, handle, mem::take(&mut self.buf))
        } else {
            TransferResult::with_status(status)
        };
        entry.close();
        result
    }

    /// Apply the buffered bytes to the resource and store it through its
    /// parent collection.
    fn commit(entry: &ResourceEntry, handle: Handle, buf: BytesMut) -> TransferResult {
        let bytes = buf.freeze();
        let content = match entry.kind() {
            ResourceKind::Binary => ResourceContent::Binary(bytes),
            ResourceKind::Xml => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => ResourceContent::Xml(text),
                Err(err) => {
                    error!(id = entry.original_id(), error = %err, "uploaded XML content is not valid UTF-8");
                    return TransferResult::with_status(TransferStatus::Failure);
                }
            },
        };

        if let Err(err) = entry.resource().set_content(content) {
            error!(id = entry.original_id(), error = %err, "error storing new content to resource");
            return TransferResult::with_status(TransferStatus::Failure);
        }

        let Some(parent) = entry.parent_collection() else {
            error!(id = entry.original_id(), "resource has no reachable parent collection");
            return TransferResult::with_status(TransferStatus::Failure);
        };
        if let Err(err) = parent.store(entry.resource()) {
            error!(id = entry.original_id(), error = %err, "error storing resource in collection");
            return TransferResult::with_status(TransferStatus::Failure);
        }

        TransferResult::success(entry.meta(handle))
    }
}

impl Drop for StoreContext {
    fn drop(&mut self) {
        // Reached only when the context is discarded without finish(), e.g.
        // on a transport-level stream abort.
        if let Some(entry) = self.entry.take() {
            debug!(id = entry.original_id(), "releasing resource entry of abandoned upload");
            entry.close();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
