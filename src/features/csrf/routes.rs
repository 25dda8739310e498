use axum::{routing::get, Router};
use std::sync::Arc;

use crate::features::csrf::handlers::get_csrf_token;
use crate::features::csrf::services::CsrfService;

pub fn routes(service: Arc<CsrfService>) -> Router {
    Router::new()
        .route("/api/csrf-token", get(get_csrf_token))
        .with_state(service)
}
