use std::sync::Arc;

use axum::{routing::get, Router};

use super::handlers::get_rate_limit_status;
use super::services::RateLimitService;

/// Routes for inspecting the caller's rate limit (not themselves limited)
pub fn routes(service: Arc<RateLimitService>) -> Router {
    Router::new()
        .route("/api/rate-limit/status", get(get_rate_limit_status))
        .with_state(service)
}
