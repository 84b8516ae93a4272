//! Metadata records returned by open operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::handle::Handle;
use crate::types::ResourceKind;

/// Metadata for an opened collection, tagged with its fresh handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionMeta {
    /// Handle under which the collection was registered.
    pub handle: Handle,
    /// Collection name, as reported by the storage engine.
    pub name: String,
    /// Creation timestamp reported by the storage engine.
    pub created_at: DateTime<Utc>,
}

/// Metadata for an opened or stored resource, tagged with its handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    /// Handle under which the resource was registered.
    pub handle: Handle,
    /// Resource identifier within its parent collection.
    pub id: String,
    /// Content kind discriminator.
    pub kind: ResourceKind,
    /// Creation timestamp reported by the storage engine.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp reported by the storage engine.
    pub modified_at: DateTime<Utc>,
}

/// Server identification returned by the system-info call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    /// Server implementation version.
    pub server_version: String,
}
