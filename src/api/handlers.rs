//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{info, warn};

use crate::state::{AppState, Mode};
use super::responses::{ApiResponse, StatusResponse, HealthResponse};

/// Handle POST /start - Begin or resume the countdown
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.start();
    info!("Start endpoint called - {} timer running", timer.mode);
    Json(ApiResponse::from_state("Timer started".to_string(), timer))
}

/// Handle POST /pause - Freeze the countdown
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.pause();
    info!("Pause endpoint called - {}s remaining", timer.remaining_seconds);
    Json(ApiResponse::from_state("Timer paused".to_string(), timer))
}

/// Handle POST /reset - Return to the current mode's full duration
pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.reset();
    info!("Reset endpoint called - {} timer reset", timer.mode);
    Json(ApiResponse::from_state("Timer reset".to_string(), timer))
}

/// Handle POST /mode/:mode - Switch session kind
pub async fn mode_handler(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<String>,
) -> Result<Json<ApiResponse>, (StatusCode, Json<ApiResponse>)> {
    match mode.parse::<Mode>() {
        Ok(mode) => {
            let timer = state.set_mode(mode);
            info!("Mode endpoint called - switched to {}", mode);
            Ok(Json(ApiResponse::from_state(format!("Switched to {}", mode), timer)))
        }
        Err(e) => {
            warn!("Rejected mode switch: {}", e);
            Err((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(e.to_string(), state.engine.state())),
            ))
        }
    }
}

/// Handle POST /clear - Forget the persisted session
pub async fn clear_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.clear();
    info!("Clear endpoint called - session forgotten");
    Json(ApiResponse::from_state("Session cleared".to_string(), timer))
}

/// Handle GET /status - Return current timer status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timer = state.engine.state();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        timer,
        display: timer.display(),
        storage_key: state.engine.storage_key().to_string(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
        last_completion: state.completions.last(),
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
