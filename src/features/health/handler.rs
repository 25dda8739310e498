use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::features::health::dto::HealthResponseDto;
use crate::features::health::HealthInfo;

/// Liveness check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponseDto)
    )
)]
pub async fn health_check(State(info): State<Arc<HealthInfo>>) -> Json<HealthResponseDto> {
    Json(HealthResponseDto {
        status: "ok".to_string(),
        service: info.service_name.clone(),
        timestamp: Utc::now(),
        features: info.features,
    })
}
