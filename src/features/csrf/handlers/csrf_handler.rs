use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::csrf::cookie;
use crate::features::csrf::dtos::CsrfTokenDto;
use crate::features::csrf::services::CsrfService;
use crate::shared::types::ApiResponse;

/// Get a CSRF token
///
/// Sets the `sid` session cookie when the caller has no live session.
#[utoipa::path(
    get,
    path = "/api/csrf-token",
    tag = "security",
    responses(
        (status = 200, description = "CSRF token for the caller's session", body = ApiResponse<CsrfTokenDto>)
    )
)]
pub async fn get_csrf_token(
    State(service): State<Arc<CsrfService>>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<ApiResponse<CsrfTokenDto>>)> {
    let current = cookie::session_id(&headers);
    let issued = service.issue(current.as_deref()).await;

    let mut response_headers = HeaderMap::new();
    if issued.new_session {
        let value = cookie::session_cookie(&issued.session_id)
            .ok_or_else(|| AppError::Internal("Invalid session cookie value".to_string()))?;
        response_headers.insert(header::SET_COOKIE, value);
    }

    Ok((
        response_headers,
        Json(ApiResponse::success(
            Some(CsrfTokenDto {
                csrf_token: issued.token,
            }),
            None,
            None,
        )),
    ))
}

#[cfg(test)]
mod tests {
    use crate::shared::constants::CSRF_TOKEN_HEADER;
    use crate::shared::test_helpers::test_app_with;
    use axum::http::{header, HeaderName, HeaderValue, StatusCode};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_mutations_need_session_token() {
        let app = test_app_with(|config| config.security.csrf_enabled = true).await;

        let issued = app.server.get("/api/csrf-token").await;
        issued.assert_status_ok();
        let set_cookie = issued.header(header::SET_COOKIE);
        let cookie = set_cookie
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("sid="));
        let body: Value = issued.json();
        let token = body["data"]["csrfToken"].as_str().unwrap().to_string();
        assert_eq!(token.len(), 64);

        let usage = json!({ "toolName": "pdf-merge", "toolCategory": "pdf" });

        let missing = app.server.post("/api/tools/usage").json(&usage).await;
        missing.assert_status(StatusCode::FORBIDDEN);
        let body: Value = missing.json();
        assert_eq!(body["message"], "CSRF token validation failed");

        app.server
            .post("/api/tools/usage")
            .add_header(header::COOKIE, HeaderValue::from_str(&cookie).unwrap())
            .add_header(
                HeaderName::from_static(CSRF_TOKEN_HEADER),
                HeaderValue::from_static("0000"),
            )
            .json(&usage)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        app.server
            .post("/api/tools/usage")
            .add_header(header::COOKIE, HeaderValue::from_str(&cookie).unwrap())
            .add_header(
                HeaderName::from_static(CSRF_TOKEN_HEADER),
                HeaderValue::from_str(&token).unwrap(),
            )
            .json(&usage)
            .await
            .assert_status(StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_existing_session_keeps_token() {
        let app = test_app_with(|config| config.security.csrf_enabled = true).await;

        let first = app.server.get("/api/csrf-token").await;
        let cookie = first
            .header(header::SET_COOKIE)
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        let first_body: Value = first.json();

        let second = app
            .server
            .get("/api/csrf-token")
            .add_header(header::COOKIE, HeaderValue::from_str(&cookie).unwrap())
            .await;
        second.assert_status_ok();
        assert!(second.headers().get(header::SET_COOKIE).is_none());
        let second_body: Value = second.json();
        assert_eq!(
            first_body["data"]["csrfToken"],
            second_body["data"]["csrfToken"]
        );
    }

    #[tokio::test]
    async fn test_reads_pass_without_token() {
        let app = test_app_with(|config| config.security.csrf_enabled = true).await;

        app.server
            .get("/api/download/missing.txt")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
