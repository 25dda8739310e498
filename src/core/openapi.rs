use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::{dtos as auth_dtos, handlers as auth_handlers, AuthenticatedUser};
use crate::features::csrf::{dtos as csrf_dtos, handlers as csrf_handlers};
use crate::features::files::{dtos as files_dtos, handlers as files_handlers};
use crate::features::health::{dto as health_dto, handler as health_handler};
use crate::features::rate_limits::{dtos as rate_limits_dtos, handlers as rate_limits_handlers};
use crate::features::tool_usage::{dtos as tool_usage_dtos, handlers as tool_usage_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health_handler::health_check,
        // CSRF
        csrf_handlers::get_csrf_token,
        // Auth
        auth_handlers::signup,
        auth_handlers::login,
        auth_handlers::get_me,
        // Tool usage
        tool_usage_handlers::record_usage,
        tool_usage_handlers::list_usage,
        tool_usage_handlers::get_stats,
        // Files
        files_handlers::upload_file,
        files_handlers::download_file,
        files_handlers::list_files,
        // Rate limits
        rate_limits_handlers::get_rate_limit_status,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Health
            health_dto::FeatureFlagsDto,
            health_dto::HealthResponseDto,
            // CSRF
            csrf_dtos::CsrfTokenDto,
            ApiResponse<csrf_dtos::CsrfTokenDto>,
            // Auth
            AuthenticatedUser,
            auth_dtos::SignupRequestDto,
            auth_dtos::LoginRequestDto,
            auth_dtos::AuthUserDto,
            auth_dtos::AuthResponseDto,
            ApiResponse<auth_dtos::AuthResponseDto>,
            ApiResponse<auth_dtos::AuthUserDto>,
            // Tool usage
            tool_usage_dtos::CreateToolUsageDto,
            tool_usage_dtos::ToolUsageResponseDto,
            tool_usage_dtos::ToolUsageStatsDto,
            ApiResponse<tool_usage_dtos::ToolUsageResponseDto>,
            ApiResponse<Vec<tool_usage_dtos::ToolUsageResponseDto>>,
            ApiResponse<tool_usage_dtos::ToolUsageStatsDto>,
            // Files
            files_dtos::UploadFileDto,
            files_dtos::UploadResponseDto,
            files_dtos::UserFileResponseDto,
            ApiResponse<Vec<files_dtos::UserFileResponseDto>>,
            // Rate limits
            rate_limits_dtos::UserRateLimitStatusDto,
            ApiResponse<rate_limits_dtos::UserRateLimitStatusDto>,
        )
    ),
    tags(
        (name = "health", description = "Service liveness"),
        (name = "security", description = "CSRF token issuance"),
        (name = "auth", description = "Account signup, login and profile"),
        (name = "tools", description = "Tool usage tracking and stats"),
        (name = "files", description = "Temporary file upload and download"),
        (name = "rate-limits", description = "Per-caller rate limit status"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Suntyn AI API",
        version = "0.1.0",
        description = "API documentation for the Suntyn AI tools backend",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
