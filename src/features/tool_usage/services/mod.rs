mod tool_usage_service;

pub use tool_usage_service::ToolUsageService;
