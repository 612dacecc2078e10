//! Collaborators handed to every objective and task at construction.

use std::sync::Arc;

use unlock_storage::{KeyValueStore, SharedStore};

use crate::clock::{Clock, SharedClock, Timestamp};
use crate::config::UnlockConfig;

/// Store, clock and configuration shared by a set of objectives.
#[derive(Clone)]
pub struct GateContext {
    /// Persistent key-value store
    pub store: SharedStore,

    /// Time source
    pub clock: SharedClock,

    /// Gating configuration
    pub config: UnlockConfig,
}

impl GateContext {
    /// Create a context with the default configuration.
    pub fn new(store: impl KeyValueStore + 'static, clock: impl Clock + 'static) -> Self {
        Self::from_shared(Arc::new(store), Arc::new(clock))
    }

    /// Create a context from already shared handles.
    pub fn from_shared(store: SharedStore, clock: SharedClock) -> Self {
        Self {
            store,
            clock,
            config: UnlockConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: UnlockConfig) -> Self {
        self.config = config;
        self
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

impl std::fmt::Debug for GateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
