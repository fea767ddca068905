use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ipobot_core::{
    load_config, validate_config, EngineContext, EngineSettings, HttpCatalog, IgnoreStore,
    IpoEngine, Notifier, OfferingCatalog, PortalDriver, ReplySource, RestPortal, StatusStore,
    TelegramClient,
};
use ipobot_server::api::create_router;
use ipobot_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("IPOBOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!(users = config.users.len(), dry_run = config.engine.dry_run, "Accounts configured");
    info!("Status document: {:?}", config.state.status_path);
    info!("Ignore document: {:?}", config.state.ignore_path);

    // Persisted state
    let status_store = Arc::new(StatusStore::open(&config.state.status_path));
    let ignore_store = Arc::new(IgnoreStore::open(&config.state.ignore_path));

    // Collaborators
    let catalog: Arc<dyn OfferingCatalog> = Arc::new(
        HttpCatalog::new(config.catalog.clone()).context("Failed to create catalog client")?,
    );
    info!("Catalog source: {}", config.catalog.url);

    let portal: Arc<dyn PortalDriver> = Arc::new(RestPortal::new(config.portal.clone()));
    info!("Portal back end: {}", config.portal.url);

    let telegram = Arc::new(
        TelegramClient::new(config.telegram.clone()).context("Failed to create Telegram client")?,
    );
    let notifier: Arc<dyn Notifier> = telegram.clone();
    let replies: Arc<dyn ReplySource> = telegram;

    // Engine
    let engine = IpoEngine::new(
        EngineSettings::from_config(&config),
        EngineContext {
            catalog: Arc::clone(&catalog),
            portal,
            notifier,
            replies,
            status_store: Arc::clone(&status_store),
            ignore_store: Arc::clone(&ignore_store),
        },
    )
    .context("Failed to create engine")?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let engine_status = engine.status_handle();
    let engine_handle = tokio::spawn(engine.run(shutdown_rx));
    info!("Engine started");

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        engine_status,
        status_store,
        ignore_store,
        catalog,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting status server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The engine finishes its in-flight cycle before exiting.
    info!("Stopping engine...");
    let _ = shutdown_tx.send(());
    if let Err(e) = engine_handle.await {
        error!("Engine task failed: {}", e);
    }
    info!("Engine stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
