use crate::core::error::AppError;
use crate::features::auth::TokenService;
use crate::features::csrf::{cookie, CsrfService};
use crate::features::rate_limits::{ClientIdentity, RateLimitDecision, RateLimitService};
use crate::shared::constants::CSRF_TOKEN_HEADER;
use crate::shared::sanitize::{sanitize_query, sanitize_value};
use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header, uri::PathAndQuery, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Custom MakeSpan that includes request_id in the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    // If origins list contains "*", allow any origin
    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

pub async fn basic_auth_middleware(
    State(credentials): State<Arc<String>>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .is_some_and(|creds| creds == *credentials);

    if authorized {
        return next.run(req).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"Swagger UI\"")],
        "Unauthorized",
    )
        .into_response()
}

/// Attach the caller identity when a bearer token is present.
///
/// Requests without an `Authorization` header continue anonymously; a header
/// that is malformed or carries an invalid token is rejected with 401.
pub async fn auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !req.headers().contains_key(header::AUTHORIZATION) {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))?;

    let user = tokens.verify(&token)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Count the request against the caller's fixed window
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimitService>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ClientIdentity(identity) = ClientIdentity::resolve(req.headers(), req.extensions());

    match limiter.check(&identity).await {
        RateLimitDecision::Allowed { remaining } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(limiter.max_requests()),
            );
            headers.insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from(remaining),
            );
            Ok(response)
        }
        RateLimitDecision::Limited { retry_after_secs } => Err(AppError::RateLimitExceeded {
            message: "User rate limit exceeded. Please try again later.".to_string(),
            retry_after_secs,
        }),
    }
}

/// Require the session's CSRF token on mutating requests
pub async fn csrf_middleware(
    State(csrf): State<Arc<CsrfService>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !csrf.is_enabled() || !CsrfService::requires_check(req.method()) {
        return Ok(next.run(req).await);
    }

    let session_id = cookie::session_id(req.headers());
    let token = req
        .headers()
        .get(CSRF_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    csrf.verify(session_id.as_deref(), token).await?;
    Ok(next.run(req).await)
}

/// Largest JSON body the sanitizer will buffer
#[derive(Debug, Clone, Copy)]
pub struct SanitizeLimits {
    pub max_body_size: usize,
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|ct| ct.trim().eq_ignore_ascii_case("application/json"))
}

fn with_query(uri: &Uri, query: &str) -> Result<Uri, AppError> {
    let path_and_query = format!("{}?{}", uri.path(), query)
        .parse::<PathAndQuery>()
        .map_err(|e| AppError::BadRequest(format!("Invalid query string: {}", e)))?;

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    Uri::from_parts(parts).map_err(|e| AppError::BadRequest(format!("Invalid URI: {}", e)))
}

/// Escape markup in query values and JSON request bodies
pub async fn sanitize_middleware(
    State(limits): State<SanitizeLimits>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    if let Some(query) = parts.uri.query().map(str::to_owned) {
        let sanitized = sanitize_query(&query);
        if sanitized != query {
            parts.uri = with_query(&parts.uri, &sanitized)?;
        }
    }

    let body = if is_json(&parts.headers) {
        let bytes = to_bytes(body, limits.max_body_size)
            .await
            .map_err(|_| AppError::PayloadTooLarge("Request body too large".to_string()))?;

        // Invalid JSON is left for the handler's extractor to reject
        match serde_json::from_slice::<serde_json::Value>(&bytes) {
            Ok(value) => {
                let cleaned = serde_json::to_vec(&sanitize_value(value)).map_err(|e| {
                    AppError::Internal(format!("Failed to re-encode sanitized body: {}", e))
                })?;
                parts.headers.remove(header::CONTENT_LENGTH);
                Body::from(cleaned)
            }
            Err(_) => Body::from(bytes),
        }
    } else {
        body
    };

    Ok(next.run(Request::from_parts(parts, body)).await)
}
