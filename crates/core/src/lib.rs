pub mod application;
pub mod approval;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod metrics;
pub mod notify;
pub mod offering;
pub mod portal;
pub mod store;
pub mod sync;
pub mod testing;

pub use application::{ApplicationOrchestrator, ApplicationReport, UserOutcome};
pub use approval::{ApprovalDriver, Decision};
pub use catalog::{CatalogError, HttpCatalog, OfferingCatalog};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    UserConfig,
};
pub use engine::{
    CycleOutcome, EngineConfig, EngineContext, EngineError, EngineSettings, EngineStatus,
    IpoEngine,
};
pub use notify::{Notifier, NotifyError, ReplySource, TelegramClient};
pub use offering::{EligibilityFilter, Offering, UnfilledOffering};
pub use portal::{PortalDriver, PortalError, PortalSession, RestPortal};
pub use store::{IgnoreStore, StatusStore, StoreError};
pub use sync::{StatusReconciler, UnfilledResolver};
