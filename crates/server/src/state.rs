use std::sync::Arc;

use tokio::sync::RwLock;

use ipobot_core::{
    Config, EngineStatus, IgnoreStore, OfferingCatalog, SanitizedConfig, StatusStore,
};

/// Shared application state
pub struct AppState {
    config: Config,
    engine_status: Arc<RwLock<EngineStatus>>,
    status_store: Arc<StatusStore>,
    ignore_store: Arc<IgnoreStore>,
    catalog: Arc<dyn OfferingCatalog>,
}

impl AppState {
    pub fn new(
        config: Config,
        engine_status: Arc<RwLock<EngineStatus>>,
        status_store: Arc<StatusStore>,
        ignore_store: Arc<IgnoreStore>,
        catalog: Arc<dyn OfferingCatalog>,
    ) -> Self {
        Self {
            config,
            engine_status,
            status_store,
            ignore_store,
            catalog,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Copy of the engine's latest snapshot.
    pub async fn engine_status(&self) -> EngineStatus {
        self.engine_status.read().await.clone()
    }

    pub fn status_store(&self) -> &StatusStore {
        self.status_store.as_ref()
    }

    pub fn ignore_store(&self) -> &IgnoreStore {
        self.ignore_store.as_ref()
    }

    pub fn catalog(&self) -> &dyn OfferingCatalog {
        self.catalog.as_ref()
    }
}
