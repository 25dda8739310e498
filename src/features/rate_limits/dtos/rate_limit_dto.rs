use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response DTO for the caller's current rate-limit window
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRateLimitStatusDto {
    /// Identity the window is keyed by (user header, peer IP or "unknown")
    pub identity: String,
    /// Requests counted in the current window
    pub requests_used: u32,
    /// Requests left before the limit is hit
    pub requests_remaining: u32,
    /// Maximum requests per window
    pub max_requests: u32,
    /// Window length in seconds
    pub window_secs: u64,
    /// Whether the next request would be rejected
    pub limited: bool,
    /// When the current window ends; absent when no window is open
    pub resets_at: Option<DateTime<Utc>>,
}
