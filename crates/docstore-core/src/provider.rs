//! The DocStore service facade.
//!
//! [`DocStoreService`] owns the session registry, the storage engine
//! capability, and the service configuration. Individual operations are
//! implemented in the [`crate::ops`] submodules and grouped by call shape:
//! unary opens/closes/counts, streaming lists, and the two transfer
//! directions.

use std::sync::Arc;

use docstore_model::SystemInfo;
use tracing::info;

use crate::config::DocStoreConfig;
use crate::engine::Database;
use crate::session::{Session, SessionRegistry};

/// Version reported by the system-info call.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The DocStore service.
///
/// All fields are `Arc`-wrapped for cheap cloning and shared ownership
/// across handler tasks.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use docstore_core::DocStoreConfig;
/// use docstore_core::DocStoreService;
/// use docstore_core::engine::MemoryDatabase;
///
/// let service = DocStoreService::new(
///     Arc::new(MemoryDatabase::new("demo")),
///     DocStoreConfig::default(),
/// );
/// assert!(service.sessions().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct DocStoreService {
    /// Per-identity handle registry.
    pub(crate) sessions: Arc<SessionRegistry>,
    /// Storage engine capability.
    pub(crate) database: Arc<dyn Database>,
    /// Service configuration.
    pub(crate) config: Arc<DocStoreConfig>,
}

impl DocStoreService {
    /// Create a new service over the given storage engine.
    #[must_use]
    pub fn new(database: Arc<dyn Database>, config: DocStoreConfig) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new()),
            database,
            config: Arc::new(config),
        }
    }

    /// Returns a reference to the session registry.
    #[must_use]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Returns a reference to the storage engine.
    #[must_use]
    pub fn database(&self) -> &Arc<dyn Database> {
        &self.database
    }

    /// Returns a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &DocStoreConfig {
        &self.config
    }

    /// Server identification.
    #[must_use]
    pub fn system_info(&self) -> SystemInfo {
        info!("system_info");
        SystemInfo {
            server_version: VERSION.to_owned(),
        }
    }

    /// Explicit logout: close the identity's session and every handle it
    /// still holds. Returns whether a session existed.
    pub fn close_session(&self, identity: &str) -> bool {
        self.sessions.close_session(identity)
    }

    /// Evict sessions idle beyond the configured timeout. Returns the
    /// number of sessions evicted. Intended to be driven periodically by
    /// the host process.
    pub fn evict_idle_sessions(&self) -> usize {
        self.sessions.evict_idle(self.config.session_idle_timeout())
    }

    /// The caller's session, created lazily.
    pub(crate) fn session(&self, identity: &str) -> Arc<Session> {
        self.sessions.get_or_create(identity)
    }
}
