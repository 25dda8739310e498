use chrono::{DateTime, Utc};
use serde_json::Value;

/// Registered account
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

/// One tool invocation. Append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolUsage {
    pub id: i64,
    pub user_id: Option<i64>,
    pub tool_name: String,
    pub tool_category: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    /// Processing time in milliseconds
    pub processing_time: Option<i64>,
    pub success: bool,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewToolUsage {
    pub user_id: Option<i64>,
    pub tool_name: String,
    pub tool_category: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub processing_time: Option<i64>,
    pub success: bool,
    pub metadata: Option<Value>,
}

/// Stored upload. Eligible for deletion once `expires_at` has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct UserFile {
    pub id: i64,
    pub user_id: Option<i64>,
    pub original_name: String,
    pub stored_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub tool_usage_id: Option<i64>,
    /// Hex-encoded SHA-256 of the stored bytes
    pub checksum: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl UserFile {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone)]
pub struct NewUserFile {
    pub user_id: Option<i64>,
    pub original_name: String,
    pub stored_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub tool_usage_id: Option<i64>,
    pub checksum: String,
    pub expires_at: DateTime<Utc>,
}

/// Aggregate over a user's successful tool usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolUsageStats {
    pub files_processed: i64,
    pub tools_used: i64,
    pub total_time: i64,
}
