use access_service::{
    build_router,
    config::AccessConfig,
    db,
    services::{metrics, Database},
    AppState,
};
use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, sync::oneshot};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = AccessConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    metrics::init_metrics()?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting access service"
    );

    let pool = db::create_pool(&config.database)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;

    let state = AppState::new(config.clone(), Arc::new(Database::new(pool)))?;
    let app = build_router(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
    tracing::info!(address = %addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = service_core::axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    // In-flight requests get a bounded window to finish once a signal arrives.
    let grace = Duration::from_secs(config.common.shutdown_grace_seconds);
    let grace_elapsed = async move {
        match signalled_rx.await {
            Ok(()) => tokio::time::sleep(grace).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = server => result?,
        _ = grace_elapsed => {
            tracing::warn!(
                grace_seconds = grace.as_secs(),
                "Shutdown grace period elapsed with requests in flight"
            );
        }
    }

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
