//! HTTP server setup and routing

use crate::config::Config;
use crate::error::{Error, Result};
use crate::playback::bus::CommandBus;
use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::{Pool, Sqlite};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub bus: CommandBus,
    pub db: Pool<Sqlite>,
}

/// Build the application router
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(super::handlers::health))
        .route("/status", get(super::handlers::status))
        .route("/events", get(super::sse::event_stream))
        // Control commands (enqueued on the command bus)
        .route(
            "/control/force-play/:schedule_id",
            post(super::handlers::force_play),
        )
        .route("/control/stop-all", post(super::handlers::stop_all))
        .route("/control/start-all", post(super::handlers::start_all))
        .route("/control/output", post(super::handlers::output_set))
        .route(
            "/control/output/test-color",
            post(super::handlers::output_test_color),
        )
        // Play window configuration
        .route(
            "/settings/play-window",
            get(super::handlers::get_play_window).post(super::handlers::set_play_window),
        )
        // Schedule listing and light mutation
        .route("/schedules", get(super::handlers::list_schedules))
        .route(
            "/schedules/:schedule_id/enabled",
            post(super::handlers::set_schedule_enabled),
        )
        .route(
            "/schedules/:schedule_id/order",
            post(super::handlers::set_schedule_order),
        )
        .with_state(ctx)
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until a shutdown signal arrives
pub async fn run(
    config: &Config,
    state: Arc<SharedState>,
    bus: CommandBus,
    db: Pool<Sqlite>,
) -> Result<()> {
    let ctx = AppContext { state, bus, db };
    let app = router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
