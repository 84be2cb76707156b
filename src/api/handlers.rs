//! HTTP request handlers

use crate::api::server::AppContext;
use crate::db;
use crate::db::settings::PlayWindowConfig;
use crate::error::Error;
use crate::playback::bus::PlaybackCommand;
use crate::state::StatusSnapshot;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct OutputSetRequest {
    mode: String,
    #[serde(default)]
    targets: Vec<i64>,
    #[serde(default)]
    scale_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OutputTestColorRequest {
    color: String,
    #[serde(default)]
    targets: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetOrderRequest {
    order_index: i64,
}

type HandlerError = (StatusCode, Json<StatusResponse>);

fn internal_error(e: impl std::fmt::Display) -> HandlerError {
    error!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

fn accepted() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "accepted".to_string(),
    })
}

// ============================================================================
// Health / Status
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "marquee".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /status - latest runtime snapshot
pub async fn status(State(ctx): State<AppContext>) -> Json<StatusSnapshot> {
    Json(ctx.state.snapshot().await)
}

// ============================================================================
// Control commands
// ============================================================================

/// POST /control/force-play/:schedule_id
///
/// Enqueued for the next scheduler tick; a missing target is reported there,
/// not here.
pub async fn force_play(
    State(ctx): State<AppContext>,
    Path(schedule_id): Path<i64>,
) -> Json<StatusResponse> {
    ctx.bus.send(PlaybackCommand::ForcePlay { schedule_id });
    accepted()
}

/// POST /control/stop-all
pub async fn stop_all(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.bus.send(PlaybackCommand::StopAll);
    accepted()
}

/// POST /control/start-all
pub async fn start_all(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.bus.send(PlaybackCommand::StartAll);
    accepted()
}

/// POST /control/output
pub async fn output_set(
    State(ctx): State<AppContext>,
    Json(req): Json<OutputSetRequest>,
) -> Json<StatusResponse> {
    ctx.bus.send(PlaybackCommand::OutputSet {
        mode: req.mode,
        targets: req.targets,
        scale_mode: req.scale_mode,
    });
    accepted()
}

/// POST /control/output/test-color
pub async fn output_test_color(
    State(ctx): State<AppContext>,
    Json(req): Json<OutputTestColorRequest>,
) -> Json<StatusResponse> {
    ctx.bus.send(PlaybackCommand::OutputTestColor {
        color: req.color,
        targets: req.targets,
    });
    accepted()
}

// ============================================================================
// Play window
// ============================================================================

/// GET /settings/play-window
pub async fn get_play_window(
    State(ctx): State<AppContext>,
) -> Result<Json<PlayWindowConfig>, HandlerError> {
    db::settings::get_play_window(&ctx.db)
        .await
        .map(Json)
        .map_err(internal_error)
}

/// POST /settings/play-window
pub async fn set_play_window(
    State(ctx): State<AppContext>,
    Json(config): Json<PlayWindowConfig>,
) -> Result<Json<StatusResponse>, HandlerError> {
    db::settings::set_play_window(&ctx.db, &config)
        .await
        .map_err(internal_error)?;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

// ============================================================================
// Schedules
// ============================================================================

/// GET /schedules
pub async fn list_schedules(
    State(ctx): State<AppContext>,
) -> Result<Json<Vec<db::schedules::ScheduleInfo>>, HandlerError> {
    db::schedules::list_all(&ctx.db)
        .await
        .map(Json)
        .map_err(internal_error)
}

fn schedule_write_error(e: Error) -> HandlerError {
    match e {
        Error::ScheduleNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: format!("schedule {} not found", id),
            }),
        ),
        other => internal_error(other),
    }
}

/// POST /schedules/:schedule_id/enabled
pub async fn set_schedule_enabled(
    State(ctx): State<AppContext>,
    Path(schedule_id): Path<i64>,
    Json(req): Json<SetEnabledRequest>,
) -> Result<Json<StatusResponse>, HandlerError> {
    db::schedules::set_enabled(&ctx.db, schedule_id, req.enabled)
        .await
        .map_err(schedule_write_error)?;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

/// POST /schedules/:schedule_id/order
pub async fn set_schedule_order(
    State(ctx): State<AppContext>,
    Path(schedule_id): Path<i64>,
    Json(req): Json<SetOrderRequest>,
) -> Result<Json<StatusResponse>, HandlerError> {
    db::schedules::set_order_index(&ctx.db, schedule_id, req.order_index)
        .await
        .map_err(schedule_write_error)?;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}
