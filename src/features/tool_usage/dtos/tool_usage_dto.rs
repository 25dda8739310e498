use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::modules::memstore::{NewToolUsage, ToolUsage, ToolUsageStats};

fn default_success() -> bool {
    true
}

/// Request DTO for recording a tool invocation
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateToolUsageDto {
    #[validate(length(min = 1, max = 100, message = "toolName must be 1-100 characters"))]
    pub tool_name: String,

    #[validate(length(min = 1, max = 50, message = "toolCategory must be 1-50 characters"))]
    pub tool_category: String,

    #[validate(length(max = 255, message = "fileName must be at most 255 characters"))]
    pub file_name: Option<String>,

    #[validate(range(min = 0, message = "fileSize must not be negative"))]
    pub file_size: Option<i64>,

    /// Processing time in milliseconds, at most one day
    #[validate(range(
        min = 0,
        max = 86_400_000,
        message = "processingTime must be between 0 and 86400000"
    ))]
    pub processing_time: Option<i64>,

    /// Defaults to true when omitted
    #[serde(default = "default_success")]
    pub success: bool,

    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
}

impl CreateToolUsageDto {
    pub fn into_new(self, user_id: Option<i64>) -> NewToolUsage {
        NewToolUsage {
            user_id,
            tool_name: self.tool_name,
            tool_category: self.tool_category,
            file_name: self.file_name,
            file_size: self.file_size,
            processing_time: self.processing_time,
            success: self.success,
            metadata: self.metadata,
        }
    }
}

/// Response DTO for a recorded tool invocation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolUsageResponseDto {
    pub id: i64,
    pub user_id: Option<i64>,
    pub tool_name: String,
    pub tool_category: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub processing_time: Option<i64>,
    pub success: bool,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl From<ToolUsage> for ToolUsageResponseDto {
    fn from(usage: ToolUsage) -> Self {
        Self {
            id: usage.id,
            user_id: usage.user_id,
            tool_name: usage.tool_name,
            tool_category: usage.tool_category,
            file_name: usage.file_name,
            file_size: usage.file_size,
            processing_time: usage.processing_time,
            success: usage.success,
            metadata: usage.metadata,
            created_at: usage.created_at,
        }
    }
}

/// Aggregate over the caller's successful tool usage
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolUsageStatsDto {
    /// Number of successful invocations
    pub files_processed: i64,
    /// Number of distinct tools used successfully
    pub tools_used: i64,
    /// Total processing time in milliseconds
    pub total_time: i64,
}

impl From<ToolUsageStats> for ToolUsageStatsDto {
    fn from(stats: ToolUsageStats) -> Self {
        Self {
            files_processed: stats.files_processed,
            tools_used: stats.tools_used,
            total_time: stats.total_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_defaults_to_true() {
        let dto: CreateToolUsageDto =
            serde_json::from_value(json!({ "toolName": "merge", "toolCategory": "pdf" })).unwrap();
        assert!(dto.success);
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_tool_name_and_negative_size() {
        let dto: CreateToolUsageDto = serde_json::from_value(json!({
            "toolName": "",
            "toolCategory": "pdf",
            "fileSize": -1
        }))
        .unwrap();

        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("tool_name"));
        assert!(fields.contains_key("file_size"));
    }

    #[test]
    fn test_rejects_processing_time_above_one_day() {
        let dto: CreateToolUsageDto = serde_json::from_value(json!({
            "toolName": "merge",
            "toolCategory": "pdf",
            "processingTime": i64::MAX
        }))
        .unwrap();

        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("processing_time"));
    }
}
