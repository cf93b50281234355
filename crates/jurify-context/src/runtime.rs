use std::sync::Arc;
use tracing::info;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::store::{ContextStore, SweepHandle};

/// Owns the process-wide context store and its sweeper.
///
/// Build one at startup and hand `store()` to whatever needs lead context.
pub struct ContextRuntime {
    store: Arc<ContextStore>,
    sweeper: SweepHandle,
}

impl ContextRuntime {
    /// Validate `cfg`, create the store and start its sweeper.
    /// Must be called from within a tokio runtime.
    pub fn start(cfg: StoreConfig) -> Result<Self, StoreError> {
        cfg.validate()?;
        let store = ContextStore::create(cfg);
        let sweeper = store.start_sweeper()?;
        info!("Lead context runtime started");
        Ok(Self { store, sweeper })
    }

    pub fn from_env() -> Result<Self, StoreError> {
        Self::start(StoreConfig::from_env()?)
    }

    pub fn store(&self) -> Arc<ContextStore> {
        self.store.clone()
    }

    pub fn is_sweeping(&self) -> bool {
        !self.sweeper.is_finished()
    }

    /// Tear down the store. Outstanding `Arc`s see an empty, inert store.
    pub fn shutdown(self) {
        self.store.destroy();
        info!("Lead context runtime stopped");
    }
}
