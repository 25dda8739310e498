pub mod dto;
pub mod handler;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::config::Config;
use dto::FeatureFlagsDto;

/// Static facts the health endpoint reports
#[derive(Debug, Clone)]
pub struct HealthInfo {
    pub service_name: String,
    pub features: FeatureFlagsDto,
}

impl HealthInfo {
    pub fn from_config(config: &Config) -> Self {
        Self {
            service_name: config.app.service_name.clone(),
            features: FeatureFlagsDto {
                fast_mode: config.features.fast_mode,
                compression: config.features.compression,
                cache_static_files: config.storage.cache_downloads,
                debug: config.features.debug,
            },
        }
    }
}

pub fn routes(info: Arc<HealthInfo>) -> Router {
    Router::new()
        .route("/health", get(handler::health_check))
        .with_state(info)
}
