use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::tool_usage::dtos::{
    CreateToolUsageDto, ToolUsageResponseDto, ToolUsageStatsDto,
};
use crate::features::tool_usage::services::ToolUsageService;
use crate::shared::types::{ApiResponse, LimitQuery, Meta};

/// Record a tool invocation
///
/// Anonymous callers are accepted; the row is attributed to the caller when a
/// valid bearer token is sent.
#[utoipa::path(
    post,
    path = "/api/tools/usage",
    tag = "tools",
    request_body = CreateToolUsageDto,
    responses(
        (status = 201, description = "Usage recorded", body = ApiResponse<ToolUsageResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid bearer token")
    )
)]
pub async fn record_usage(
    user: Option<AuthenticatedUser>,
    State(service): State<Arc<ToolUsageService>>,
    AppJson(dto): AppJson<CreateToolUsageDto>,
) -> Result<(StatusCode, Json<ApiResponse<ToolUsageResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let usage = service.record(user.map(|u| u.user_id), dto).await;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(usage), None, None)),
    ))
}

/// List the caller's most recent tool invocations
#[utoipa::path(
    get,
    path = "/api/tools/usage",
    tag = "tools",
    params(LimitQuery),
    responses(
        (status = 200, description = "Recent usage, newest first", body = ApiResponse<Vec<ToolUsageResponseDto>>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_usage(
    user: AuthenticatedUser,
    State(service): State<Arc<ToolUsageService>>,
    AppQuery(query): AppQuery<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<ToolUsageResponseDto>>>> {
    let rows = service.recent(user.user_id, query.limit()).await;
    let total = rows.len() as i64;

    Ok(Json(ApiResponse::success(
        Some(rows),
        None,
        Some(Meta { total }),
    )))
}

/// Aggregate stats over the caller's successful tool usage
#[utoipa::path(
    get,
    path = "/api/tools/stats",
    tag = "tools",
    responses(
        (status = 200, description = "Usage stats", body = ApiResponse<ToolUsageStatsDto>),
        (status = 401, description = "Authentication required")
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_stats(
    user: AuthenticatedUser,
    State(service): State<Arc<ToolUsageService>>,
) -> Result<Json<ApiResponse<ToolUsageStatsDto>>> {
    let stats = service.stats(user.user_id).await;
    Ok(Json(ApiResponse::success(Some(stats), None, None)))
}

#[cfg(test)]
mod tests {
    use crate::shared::test_helpers::{bearer, test_app};
    use axum::http::{header, StatusCode};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_anonymous_usage_is_recorded_without_user() {
        let app = test_app().await;

        let response = app
            .server
            .post("/api/tools/usage")
            .json(&json!({ "toolName": "pdf-merge", "toolCategory": "pdf" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["toolName"], "pdf-merge");
        assert_eq!(body["data"]["userId"], Value::Null);
        assert_eq!(body["data"]["success"], true);
    }

    #[tokio::test]
    async fn test_authenticated_usage_feeds_list_and_stats() {
        let app = test_app().await;
        let (user_id, token) = app.signup("a@b.com").await;

        for (tool, time, success) in [
            ("pdf-merge", 100, true),
            ("pdf-merge", 200, true),
            ("image-resize", 50, true),
            ("image-resize", 999, false),
        ] {
            app.server
                .post("/api/tools/usage")
                .add_header(header::AUTHORIZATION, bearer(&token))
                .json(&json!({
                    "toolName": tool,
                    "toolCategory": "misc",
                    "processingTime": time,
                    "success": success
                }))
                .await
                .assert_status(StatusCode::CREATED);
            app.clock.advance(chrono::Duration::seconds(1));
        }

        let list = app
            .server
            .get("/api/tools/usage?limit=2")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        list.assert_status_ok();
        let body: Value = list.json();
        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["processingTime"], 999);
        assert_eq!(rows[0]["userId"], user_id);
        assert_eq!(body["meta"]["total"], 2);

        let stats = app
            .server
            .get("/api/tools/stats")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;
        stats.assert_status_ok();
        let body: Value = stats.json();
        assert_eq!(body["data"]["filesProcessed"], 3);
        assert_eq!(body["data"]["toolsUsed"], 2);
        assert_eq!(body["data"]["totalTime"], 350);
    }

    #[tokio::test]
    async fn test_list_requires_authentication() {
        let app = test_app().await;

        app.server
            .get("/api/tools/usage")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        app.server
            .get("/api/tools/stats")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_usage_is_rejected() {
        let app = test_app().await;

        app.server
            .post("/api/tools/usage")
            .json(&json!({ "toolName": "", "toolCategory": "pdf" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_limit_uses_json_error() {
        let app = test_app().await;
        let (_, token) = app.signup("a@b.com").await;

        let response = app
            .server
            .get("/api/tools/usage?limit=abc")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.header(header::CONTENT_TYPE), "application/json");
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_processing_time_above_one_day_is_rejected() {
        let app = test_app().await;

        app.server
            .post("/api/tools/usage")
            .json(&json!({
                "toolName": "merge",
                "toolCategory": "pdf",
                "processingTime": i64::MAX
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
