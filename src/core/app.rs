//! Service wiring and router assembly shared by `main` and router tests.

use std::sync::Arc;

use axum::{middleware::from_fn_with_state, Router};
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::middleware::{self, SanitizeLimits};
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::auth::{routes as auth_routes, AuthService, TokenService};
use crate::features::csrf::{self, CsrfService};
use crate::features::files::{self, FileService, FileSweeper};
use crate::features::health::{self, HealthInfo};
use crate::features::rate_limits::{self, RateLimitService};
use crate::features::tool_usage::{self, ToolUsageService};
use crate::modules::memstore::{Clock, MemStore, SystemClock};
use crate::modules::storage::LocalStorage;

/// Every shared service, constructed once and handed to the router
#[derive(Clone)]
pub struct AppServices {
    pub token_service: Arc<TokenService>,
    pub auth_service: Arc<AuthService>,
    pub tool_usage_service: Arc<ToolUsageService>,
    pub file_service: Arc<FileService>,
    pub rate_limit_service: Arc<RateLimitService>,
    pub csrf_service: Arc<CsrfService>,
}

impl AppServices {
    /// Build services on the system clock, creating the upload directory
    pub async fn from_config(config: &Config) -> Result<Self> {
        let storage = LocalStorage::new(config.storage.upload_dir.clone()).await?;
        Self::with_clock(config, storage, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &Config,
        storage: LocalStorage,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let store = Arc::new(MemStore::with_clock(Arc::clone(&clock)));
        let token_service = Arc::new(TokenService::new(config.auth.clone()));

        Ok(Self {
            auth_service: Arc::new(AuthService::new(
                Arc::clone(&store),
                Arc::clone(&token_service),
            )),
            tool_usage_service: Arc::new(ToolUsageService::new(Arc::clone(&store))),
            file_service: Arc::new(FileService::new(
                Arc::clone(&store),
                storage,
                &config.storage,
            )?),
            rate_limit_service: Arc::new(RateLimitService::with_clock(
                &config.security,
                Arc::clone(&clock),
            )),
            csrf_service: Arc::new(CsrfService::with_clock(
                config.security.csrf_enabled,
                clock,
            )),
            token_service,
        })
    }

    /// Background worker reclaiming expired files, windows and sessions
    pub fn file_sweeper(&self, config: &Config) -> FileSweeper {
        FileSweeper::new(
            Arc::clone(&self.file_service),
            Arc::clone(&self.rate_limit_service),
            Arc::clone(&self.csrf_service),
            config.storage.sweep_interval,
        )
    }
}

fn swagger_routes(config: &Config) -> Router {
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger =
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi));

    match config.swagger.credentials() {
        Some(credentials) => {
            tracing::info!("Swagger UI basic auth enabled");
            swagger.layer(from_fn_with_state(
                Arc::new(credentials),
                middleware::basic_auth_middleware,
            ))
        }
        None => {
            tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
            swagger
        }
    }
}

/// Assemble the full application router.
///
/// API requests pass auth, then rate limiting, then CSRF, then sanitization
/// before reaching a handler. Health and rate-limit status are not limited.
pub fn build_router(config: &Config, services: &AppServices) -> Router {
    let mut api = Router::new()
        .merge(csrf::routes(Arc::clone(&services.csrf_service)))
        .merge(auth_routes::public_routes(Arc::clone(&services.auth_service)))
        .merge(auth_routes::protected_routes(Arc::clone(
            &services.auth_service,
        )))
        .merge(tool_usage::routes(Arc::clone(&services.tool_usage_service)))
        .merge(files::routes(Arc::clone(&services.file_service)));

    if config.security.sanitize_input {
        api = api.layer(from_fn_with_state(
            SanitizeLimits {
                max_body_size: config.app.max_request_body_size,
            },
            middleware::sanitize_middleware,
        ));
    }

    let api = api
        .layer(from_fn_with_state(
            Arc::clone(&services.csrf_service),
            middleware::csrf_middleware,
        ))
        .layer(from_fn_with_state(
            Arc::clone(&services.rate_limit_service),
            middleware::rate_limit_middleware,
        ))
        .layer(from_fn_with_state(
            Arc::clone(&services.token_service),
            middleware::auth_middleware,
        ));

    let mut app = Router::new()
        .merge(swagger_routes(config))
        .merge(api)
        .merge(rate_limits::routes(Arc::clone(&services.rate_limit_service)))
        .merge(health::routes(Arc::new(HealthInfo::from_config(config))));

    if config.features.compression {
        app = app.layer(CompressionLayer::new());
    }

    app.layer(middleware::cors_layer(
        config.app.cors_allowed_origins.clone(),
    ))
    // Propagate X-Request-Id to response headers
    .layer(PropagateRequestIdLayer::x_request_id())
    .layer(
        TraceLayer::new_for_http()
            .make_span_with(middleware::MakeSpanWithRequestId)
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
    // Generate X-Request-Id using UUID v7 (or use client-provided one)
    .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid))
}

#[cfg(test)]
mod tests {
    use crate::shared::constants::USER_ID_HEADER;
    use crate::shared::test_helpers::{bearer, test_app, test_app_with};
    use axum::http::{header, HeaderName, HeaderValue, StatusCode};
    use serde_json::{json, Value};

    fn user_id_header() -> HeaderName {
        HeaderName::from_static(USER_ID_HEADER)
    }

    #[tokio::test]
    async fn test_health_reports_feature_flags() {
        let app = test_app_with(|config| {
            config.features.fast_mode = true;
            config.storage.cache_downloads = true;
        })
        .await;

        let response = app.server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "Suntyn AI");
        assert_eq!(body["features"]["fastMode"], true);
        assert_eq!(body["features"]["cacheStaticFiles"], true);
        assert_eq!(body["features"]["compression"], false);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let app = test_app().await;

        let generated = app.server.get("/health").await;
        assert!(!generated.header("x-request-id").is_empty());

        let echoed = app
            .server
            .get("/health")
            .add_header(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_static("req-123"),
            )
            .await;
        assert_eq!(echoed.header("x-request-id"), "req-123");
    }

    #[tokio::test]
    async fn test_rate_limit_per_identity() {
        let app = test_app_with(|config| config.security.rate_limit_max_requests = 3).await;
        let alice = HeaderValue::from_static("alice");

        for remaining in ["2", "1", "0"] {
            let response = app
                .server
                .get("/api/csrf-token")
                .add_header(user_id_header(), alice.clone())
                .await;
            response.assert_status_ok();
            assert_eq!(response.header("x-ratelimit-limit"), "3");
            assert_eq!(response.header("x-ratelimit-remaining"), remaining);
        }

        let limited = app
            .server
            .get("/api/csrf-token")
            .add_header(user_id_header(), alice.clone())
            .await;
        limited.assert_status(StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(limited.header(header::RETRY_AFTER), "900");
        let body: Value = limited.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["retryAfter"], 900);

        app.server
            .get("/api/csrf-token")
            .add_header(user_id_header(), HeaderValue::from_static("bob"))
            .await
            .assert_status_ok();

        // Health stays reachable while limited
        app.server
            .get("/health")
            .add_header(user_id_header(), alice.clone())
            .await
            .assert_status_ok();

        app.clock.advance(chrono::Duration::seconds(901));
        app.server
            .get("/api/csrf-token")
            .add_header(user_id_header(), alice)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_rate_limit_status_does_not_consume_quota() {
        let app = test_app_with(|config| config.security.rate_limit_max_requests = 5).await;
        let carol = HeaderValue::from_static("carol");

        for _ in 0..2 {
            app.server
                .get("/api/csrf-token")
                .add_header(user_id_header(), carol.clone())
                .await
                .assert_status_ok();
        }

        for _ in 0..2 {
            let response = app
                .server
                .get("/api/rate-limit/status")
                .add_header(user_id_header(), carol.clone())
                .await;
            response.assert_status_ok();
            let body: Value = response.json();
            assert_eq!(body["data"]["identity"], "carol");
            assert_eq!(body["data"]["requestsUsed"], 2);
            assert_eq!(body["data"]["requestsRemaining"], 3);
            assert_eq!(body["data"]["limited"], false);
        }
    }

    #[tokio::test]
    async fn test_json_strings_are_escaped_before_handlers() {
        let app = test_app().await;

        let response = app
            .server
            .post("/api/tools/usage")
            .json(&json!({
                "toolName": "  <b>merge</b> ",
                "toolCategory": "pdf",
                "metadata": { "note": "it's \"fine\"" }
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["toolName"], "&lt;b&gt;merge&lt;/b&gt;");
        assert_eq!(
            body["data"]["metadata"]["note"],
            "it&#x27;s &quot;fine&quot;"
        );
    }

    #[tokio::test]
    async fn test_sanitization_can_be_disabled() {
        let app = test_app_with(|config| config.security.sanitize_input = false).await;

        let response = app
            .server
            .post("/api/tools/usage")
            .json(&json!({ "toolName": "<b>merge</b>", "toolCategory": "pdf" }))
            .await;

        let body: Value = response.json();
        assert_eq!(body["data"]["toolName"], "<b>merge</b>");
    }

    #[tokio::test]
    async fn test_invalid_bearer_token_is_rejected_even_on_open_routes() {
        let app = test_app().await;

        app.server
            .post("/api/tools/usage")
            .add_header(header::AUTHORIZATION, bearer("garbage"))
            .json(&json!({ "toolName": "merge", "toolCategory": "pdf" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let app = test_app().await;

        let response = app.server.get("/api-docs/openapi.json").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["paths"]["/api/upload"].is_object());
    }

    #[tokio::test]
    async fn test_swagger_requires_basic_auth_when_configured() {
        let app = test_app_with(|config| {
            config.swagger.username = Some("docs".to_string());
            config.swagger.password = Some("secret".to_string());
        })
        .await;

        app.server
            .get("/api-docs/openapi.json")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        // "docs:secret"
        app.server
            .get("/api-docs/openapi.json")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_static("Basic ZG9jczpzZWNyZXQ="),
            )
            .await
            .assert_status_ok();
    }
}
