//! Chunked-transfer units and upload outcomes.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::handle::Handle;
use crate::meta::ResourceMeta;
use crate::types::ResourceKind;

/// One bounded unit of resource content emitted by a download stream.
///
/// The payload never exceeds the negotiated chunk size. End-of-stream is
/// signalled by stream termination, not by a marker chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentChunk {
    /// Content kind of the resource this chunk belongs to.
    pub kind: ResourceKind,
    /// The chunk payload.
    pub data: Bytes,
}

impl ContentChunk {
    /// Create a new chunk.
    #[must_use]
    pub fn new(kind: ResourceKind, data: impl Into<Bytes>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    /// Returns true if the chunk carries no payload.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }
}

/// One unit of an upload stream: a chunk payload, optionally tagged with the
/// target resource handle.
///
/// Only the first request of a stream needs to carry the handle; the stream
/// is single-resource by protocol and later handle fields are not used for
/// routing.
#[derive(Debug, Clone, Default)]
pub struct StoreRequest {
    /// Target resource handle. Required on the first request of a stream.
    pub handle: Option<Handle>,
    /// The chunk payload.
    pub data: Bytes,
}

impl StoreRequest {
    /// Create a request carrying both a handle and a payload.
    #[must_use]
    pub fn new(handle: Handle, data: impl Into<Bytes>) -> Self {
        Self {
            handle: Some(handle),
            data: data.into(),
        }
    }

    /// Create a follow-up request carrying only a payload.
    #[must_use]
    pub fn chunk(data: impl Into<Bytes>) -> Self {
        Self {
            handle: None,
            data: data.into(),
        }
    }
}

/// Terminal status of an upload stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransferStatus {
    /// No chunk was ever processed (empty upload stream).
    #[default]
    #[serde(rename = "UNDEFINED")]
    Undefined,
    /// All chunks were buffered and the commit succeeded.
    #[serde(rename = "SUCCESS")]
    Success,
    /// The handle carried by the first chunk did not resolve to a live
    /// resource entry.
    #[serde(rename = "INVALID")]
    Invalid,
    /// An I/O or commit error occurred after a valid start.
    #[serde(rename = "FAILURE")]
    Failure,
}

impl TransferStatus {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Undefined => "UNDEFINED",
            Self::Success => "SUCCESS",
            Self::Invalid => "INVALID",
            Self::Failure => "FAILURE",
        }
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome record returned once per upload stream.
#[derive(Debug, Clone, Default)]
pub struct TransferResult {
    /// Terminal status of the transfer.
    pub status: TransferStatus,
    /// Metadata of the stored resource; present only on success.
    pub meta: Option<ResourceMeta>,
}

impl TransferResult {
    /// Build a result for a given non-success status.
    #[must_use]
    pub fn with_status(status: TransferStatus) -> Self {
        Self { status, meta: None }
    }

    /// Build a success result carrying the stored resource's metadata.
    #[must_use]
    pub fn success(meta: ResourceMeta) -> Self {
        Self {
            status: TransferStatus::Success,
            meta: Some(meta),
        }
    }
}
