//! Streaming transfer handlers.
//!
//! Wires the session registry to the download streamer and the upload
//! accumulator. Downloads negotiate the chunk size against the configured
//! maximum before any stream state is created; uploads drain the inbound
//! stream to completion and always produce a terminal
//! [`TransferResult`](docstore_model::TransferResult), never an error.

use std::pin::pin;

use docstore_model::{Handle, StoreRequest, TransferResult};
use futures::{Stream, StreamExt};
use tracing::info;

use crate::download::ChunkStream;
use crate::error::{DocStoreError, DocStoreResult};
use crate::provider::DocStoreService;
use crate::upload::StoreContext;

impl DocStoreService {
    /// Start a chunked download of an open resource.
    ///
    /// The effective chunk size is `min(chunk_size, max_chunk_size)`. The
    /// returned stream yields chunks in source order and respects consumer
    /// demand; dropping it cancels the download.
    ///
    /// # Errors
    ///
    /// - [`DocStoreError::InvalidChunkSize`] for a zero chunk size.
    /// - [`DocStoreError::UnknownResourceHandle`] if the handle is not
    ///   registered.
    pub fn download_resource(
        &self,
        identity: &str,
        handle: Handle,
        chunk_size: usize,
    ) -> DocStoreResult<ChunkStream> {
        let chunk_size = self.config.negotiate_chunk_size(chunk_size)?;
        let entry = self
            .session(identity)
            .lookup_resource(handle)
            .ok_or(DocStoreError::UnknownResourceHandle { handle })?;
        info!(identity, %handle, chunk_size, id = entry.original_id(), "starting resource download");
        Ok(ChunkStream::open(
            entry.resource().clone(),
            chunk_size,
            self.config.pipe_capacity,
        ))
    }

    /// Consume an upload stream and commit it to the resource named by the
    /// first request's handle.
    ///
    /// Infallible at this boundary: every failure mode is reported through
    /// the returned [`TransferResult`]. The claimed resource entry is
    /// released on all exit paths, including an aborted inbound stream.
    pub async fn store_resource<S>(&self, identity: &str, requests: S) -> TransferResult
    where
        S: Stream<Item = StoreRequest>,
    {
        info!(identity, "starting resource upload");
        let mut context = StoreContext::new(self.session(identity));
        let mut requests = pin!(requests);
        while let Some(request) = requests.next().await {
            context.accept(request);
        }
        context.finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
