//! Wire-facing data types for the DocStore remote document service.
//!
//! This crate defines the types that cross the remote-call boundary:
//! opaque [`Handle`]s, collection and resource metadata, content chunks,
//! and the terminal status of an upload stream. It deliberately contains
//! no behavior beyond construction and conversion -- all protocol logic
//! lives in `docstore-core`.

mod handle;
mod meta;
mod transfer;
mod types;

pub use handle::Handle;
pub use meta::{CollectionMeta, ResourceMeta, SystemInfo};
pub use transfer::{ContentChunk, StoreRequest, TransferResult, TransferStatus};
pub use types::ResourceKind;
