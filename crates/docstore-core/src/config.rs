//! Service configuration.
//!
//! Provides [`DocStoreConfig`] for configuring the DocStore service.
//! Configuration values are loaded from environment variables with sensible
//! defaults for local use.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::DocStoreError;

/// DocStore service configuration.
///
/// All fields have defaults suitable for an in-process deployment.
/// Configuration can be loaded from environment variables via
/// [`DocStoreConfig::from_env`].
///
/// # Examples
///
/// ```
/// use docstore_core::config::DocStoreConfig;
///
/// let config = DocStoreConfig::default();
/// assert_eq!(config.uri_prefix, "docstore://");
/// assert_eq!(config.pipe_capacity, 4);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct DocStoreConfig {
    /// URI scheme prefix accepted by root-collection opens
    /// (e.g. `"docstore://"`).
    #[builder(default = String::from("docstore://"))]
    pub uri_prefix: String,

    /// Maximum chunk size (in bytes) a client may negotiate for downloads.
    /// Larger requests are clamped to this value.
    #[builder(default = 1_048_576)]
    pub max_chunk_size: usize,

    /// Number of chunks the download pipe buffers between the byte-source
    /// producer and the stream consumer. Bounds producer read-ahead.
    #[builder(default = 4)]
    pub pipe_capacity: usize,

    /// Seconds a session may sit idle before an eviction sweep removes it.
    #[builder(default = 3_600)]
    pub session_idle_timeout_secs: u64,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for DocStoreConfig {
    fn default() -> Self {
        Self {
            uri_prefix: String::from("docstore://"),
            max_chunk_size: 1_048_576,
            pipe_capacity: 4,
            session_idle_timeout_secs: 3_600,
            log_level: String::from("info"),
        }
    }
}

impl DocStoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads the following environment variables (falling back to defaults):
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DOCSTORE_URI_PREFIX` | `docstore://` |
    /// | `DOCSTORE_MAX_CHUNK_SIZE` | `1048576` |
    /// | `DOCSTORE_PIPE_CAPACITY` | `4` |
    /// | `DOCSTORE_SESSION_IDLE_TIMEOUT` | `3600` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("DOCSTORE_URI_PREFIX") {
            config.uri_prefix = v;
        }
        if let Ok(v) = std::env::var("DOCSTORE_MAX_CHUNK_SIZE") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_chunk_size = n;
            }
        }
        if let Ok(v) = std::env::var("DOCSTORE_PIPE_CAPACITY") {
            if let Ok(n) = v.parse::<usize>() {
                config.pipe_capacity = n;
            }
        }
        if let Ok(v) = std::env::var("DOCSTORE_SESSION_IDLE_TIMEOUT") {
            if let Ok(n) = v.parse::<u64>() {
                config.session_idle_timeout_secs = n;
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Negotiate the effective chunk size for a download.
    ///
    /// A request of zero is rejected; requests above
    /// [`max_chunk_size`](Self::max_chunk_size) are clamped down to it.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::InvalidChunkSize`] for a zero request.
    pub fn negotiate_chunk_size(&self, requested: usize) -> Result<usize, DocStoreError> {
        if requested == 0 {
            return Err(DocStoreError::InvalidChunkSize { size: requested });
        }
        Ok(requested.min(self.max_chunk_size))
    }

    /// The session idle timeout as a [`Duration`].
    #[must_use]
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }
}
