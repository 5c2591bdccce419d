use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::statistics::StatisticsSnapshot;

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
    pub endpoint: String,
    pub kind: String,
    pub statistics_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnabledRequest {
    pub enabled: bool,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        endpoint: state.statistics.name(),
        kind: state.statistics.kind().to_string(),
        statistics_enabled: state.statistics.is_enabled(),
    })
}

pub async fn get_statistics(State(state): State<AdminState>) -> Json<StatisticsSnapshot> {
    Json(state.statistics.snapshot())
}

pub async fn clear_statistics(State(state): State<AdminState>) -> Json<StatisticsSnapshot> {
    state.statistics.clear();
    tracing::info!(endpoint = %state.statistics.name(), "Statistics cleared");
    Json(state.statistics.snapshot())
}

pub async fn set_statistics_enabled(
    State(state): State<AdminState>,
    Json(request): Json<EnabledRequest>,
) -> Json<StatisticsSnapshot> {
    state.statistics.set_enabled(request.enabled);
    tracing::info!(
        endpoint = %state.statistics.name(),
        enabled = request.enabled,
        "Statistics toggled"
    );
    Json(state.statistics.snapshot())
}
