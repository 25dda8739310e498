pub mod auth;
pub mod csrf;
pub mod files;
pub mod health;
pub mod rate_limits;
pub mod tool_usage;
