//! EPRI visitor statistics API server entry point.

use std::sync::{Arc, Mutex};

use epri_api::config::Config;
use epri_api::error::AppError;
use epri_api::routes;
use epri_api::state::AppState;
use epri_api::telemetry;
use epri_core::clock::SystemClock;
use epri_core::rng::OsEntropy;
use epri_visit_store::MIGRATOR;
use epri_visit_store::pg_visit_repository::PgVisitRepository;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let telemetry = telemetry::init(env!("CARGO_PKG_NAME"), config.otlp_endpoint.as_deref())?;

    info!(?config, "Starting EPRI visitor stats API server");

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(&config.database_url)
        .await?;

    MIGRATOR.run(&pool).await?;
    info!("Database migrations applied");

    if config.admin_token.is_none() {
        warn!("ADMIN_TOKEN is not set; admin endpoints will reject every request");
    }

    // Build application state.
    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(Mutex::new(OsEntropy)),
        Arc::new(PgVisitRepository::new(pool)),
    )
    .with_admin_token(config.admin_token.clone())
    .with_error_detail(config.environment.exposes_error_detail());

    // TODO: Replace CorsLayer::permissive() with the public site's origins.
    let app = routes::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr = config.bind_addr()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    telemetry.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C signal"),
        () = terminate => info!("Received terminate signal"),
    }
}
