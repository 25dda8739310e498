use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Feature toggles reported by the health endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeatureFlagsDto {
    pub fast_mode: bool,
    pub compression: bool,
    pub cache_static_files: bool,
    pub debug: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponseDto {
    pub status: String,
    pub service: String,
    pub timestamp: DateTime<Utc>,
    pub features: FeatureFlagsDto,
}
