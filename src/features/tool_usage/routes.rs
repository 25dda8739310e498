use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::tool_usage::handlers::{get_stats, list_usage, record_usage};
use crate::features::tool_usage::services::ToolUsageService;

/// Create routes for the tool usage feature
pub fn routes(service: Arc<ToolUsageService>) -> Router {
    Router::new()
        .route("/api/tools/usage", get(list_usage).post(record_usage))
        .route("/api/tools/stats", get(get_stats))
        .with_state(service)
}
