//! Clinic server entry point.
//!
//! Opens the cooldown store, builds the outbound gateways, then starts the
//! Axum HTTP server with graceful shutdown. A background worker sweeps idle
//! popup sessions alongside the server and is cancelled on shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use physio_core::clock::SystemClock;
use physio_storage::{KeyValueStore, MemoryStore};

use physio_server::config::{ServerConfig, StorageBackendType};
use physio_server::gateway::{HttpAppointmentStore, HttpFormsRelay, ResendMailer, http_client};
use physio_server::routes::build_router;
use physio_server::state::AppState;
use physio_server::sweeper::session_sweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env();

    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!(
        storage = ?config.storage_backend,
        maintenance = config.maintenance,
        "clinic server starting"
    );

    let state = Arc::new(build_app_state(config.clone())?);

    // Shutdown signal channel.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper_handle = tokio::spawn(session_sweeper(
        Arc::clone(&state),
        shutdown_rx,
        Duration::from_secs(config.sweep_interval_secs),
        Duration::from_secs(config.session_idle_secs),
    ));

    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!(addr = %config.bind_addr, "clinic server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("server error")?;

    info!("waiting for background workers to stop");
    let _ = tokio::time::timeout(Duration::from_secs(10), sweeper_handle).await;

    info!("clinic server stopped");
    Ok(())
}

/// Build the shared application state.
fn build_app_state(config: ServerConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn KeyValueStore> = match &config.storage_backend {
        StorageBackendType::Memory => {
            info!("using in-memory storage (cooldowns will not persist)");
            Arc::new(MemoryStore::new())
        }
        #[cfg(feature = "redb-backend")]
        StorageBackendType::Redb { path } => {
            info!(path = %path, "using redb storage");
            if let Some(dir) = std::path::Path::new(path).parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            Arc::new(physio_storage::RedbStore::open(path).context("failed to open redb storage")?)
        }
        #[cfg(not(feature = "redb-backend"))]
        StorageBackendType::Redb { .. } => {
            anyhow::bail!("redb backend requested but feature 'redb-backend' is not enabled");
        }
    };

    let client = http_client(Duration::from_secs(config.gateway_timeout_secs))
        .context("failed to build HTTP client")?;

    if config.forms_access_key.is_empty() {
        tracing::warn!("WEB3FORMS_ACCESS_KEY is not set; the forms relay will refuse submissions");
    }

    let appointments = Arc::new(HttpAppointmentStore::new(client.clone(), &config.api_url));
    let relay = Arc::new(HttpFormsRelay::new(
        client.clone(),
        &config.forms_url,
        &config.forms_access_key,
    ));
    let mailer = Arc::new(ResendMailer::new(
        client,
        &config.resend_api_url,
        config.resend_api_key.clone(),
    ));

    Ok(AppState::new(
        config,
        store,
        appointments,
        relay,
        mailer,
        Arc::new(SystemClock),
    ))
}

/// Wait for SIGINT or SIGTERM, then broadcast shutdown.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
    let _ = shutdown_tx.send(true);
}
