//! Service-level error types.
//!
//! [`DocStoreError`] covers the failures a caller of the service facade can
//! observe. Not-found conditions on *open* operations are not errors -- they
//! surface as `Ok(None)` -- while read or write operations against a handle
//! that is no longer registered fail with one of the unknown-handle
//! variants. Storage collaborator failures are wrapped via
//! [`EngineError`](crate::engine::EngineError).

use docstore_model::Handle;

use crate::engine::EngineError;

/// Error type for service facade operations.
#[derive(Debug, thiserror::Error)]
pub enum DocStoreError {
    // -----------------------------------------------------------------------
    // Request validation
    // -----------------------------------------------------------------------
    /// The collection URI does not match the configured prefix or carries no
    /// path component.
    #[error("invalid collection URI: {uri}")]
    InvalidUri {
        /// The URI that failed to parse.
        uri: String,
    },

    /// The requested download chunk size is zero.
    #[error("invalid chunk size: {size} (must be at least 1)")]
    InvalidChunkSize {
        /// The rejected chunk size.
        size: usize,
    },

    // -----------------------------------------------------------------------
    // Handle resolution
    // -----------------------------------------------------------------------
    /// The collection handle is not registered in the caller's session.
    #[error("unknown collection handle: {handle}")]
    UnknownCollectionHandle {
        /// The handle that failed to resolve.
        handle: Handle,
    },

    /// The resource handle is not registered in the caller's session.
    #[error("unknown resource handle: {handle}")]
    UnknownResourceHandle {
        /// The handle that failed to resolve.
        handle: Handle,
    },

    // -----------------------------------------------------------------------
    // Collaborators
    // -----------------------------------------------------------------------
    /// Failure reported by the storage engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for service operations.
pub type DocStoreResult<T> = Result<T, DocStoreError>;
