mod tool_usage_dto;

pub use tool_usage_dto::{CreateToolUsageDto, ToolUsageResponseDto, ToolUsageStatsDto};
