use axum::{extract::DefaultBodyLimit, routing::get, routing::post, Router};
use std::sync::Arc;

use crate::features::files::handlers::{download_file, list_files, upload_file};
use crate::features::files::services::FileService;

/// Create routes for the files feature
pub fn routes(file_service: Arc<FileService>) -> Router {
    // Headroom above the file limit for multipart framing; the exact limit is
    // enforced by the upload validator
    let body_limit = file_service.max_file_size() + 1024 * 1024;

    Router::new()
        .route(
            "/api/upload",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/download/{filename}", get(download_file))
        .route("/api/files", get(list_files))
        .with_state(file_service)
}
