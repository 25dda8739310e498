use axum::{extract::State, Json};
use std::sync::Arc;

use crate::core::error::Result;
use crate::features::rate_limits::dtos::UserRateLimitStatusDto;
use crate::features::rate_limits::identity::ClientIdentity;
use crate::features::rate_limits::services::RateLimitService;
use crate::shared::types::ApiResponse;

/// Get the caller's rate limit status
///
/// Reading the status does not count against the limit.
#[utoipa::path(
    get,
    path = "/api/rate-limit/status",
    tag = "rate-limits",
    params(
        ("x-user-id" = Option<String>, Header, description = "Caller identity; defaults to the peer IP")
    ),
    responses(
        (status = 200, description = "Rate limit status", body = ApiResponse<UserRateLimitStatusDto>)
    )
)]
pub async fn get_rate_limit_status(
    ClientIdentity(identity): ClientIdentity,
    State(service): State<Arc<RateLimitService>>,
) -> Result<Json<ApiResponse<UserRateLimitStatusDto>>> {
    let status = service.status(&identity).await;
    Ok(Json(ApiResponse::success(Some(status), None, None)))
}
