use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum_test::TestServer;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::core::app::{build_router, AppServices};
use crate::core::config::{
    AppConfig, AuthConfig, Config, FeatureFlags, SecurityConfig, StorageConfig, SwaggerConfig,
};
use crate::modules::memstore::ManualClock;
use crate::modules::storage::LocalStorage;

/// Config for router tests: small limits, CSRF off, generous rate limit
pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        app: AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            service_name: "Suntyn AI".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            max_request_body_size: 1024 * 1024,
        },
        storage: StorageConfig {
            upload_dir: upload_dir.to_path_buf(),
            max_file_size: 64 * 1024,
            file_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
            cache_downloads: false,
        },
        auth: AuthConfig {
            jwt_secret: "test-secret".to_string(),
            jwt_expiry: Duration::from_secs(3600),
        },
        security: SecurityConfig {
            rate_limit_max_requests: 1000,
            rate_limit_window: Duration::from_secs(900),
            csrf_enabled: false,
            sanitize_input: true,
        },
        features: FeatureFlags::default(),
        swagger: SwaggerConfig {
            username: None,
            password: None,
            title: "Test API".to_string(),
            version: "0.0.0".to_string(),
            description: "Test".to_string(),
        },
    }
}

/// Router wired to real services on a manual clock and a temp upload dir
pub struct TestApp {
    pub server: TestServer,
    pub services: AppServices,
    pub clock: Arc<ManualClock>,
    pub upload_dir: TempDir,
}

pub async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

pub async fn test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let mut config = test_config(upload_dir.path());
    configure(&mut config);

    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    ));
    let storage = LocalStorage::new(upload_dir.path()).await.unwrap();
    let services = AppServices::with_clock(&config, storage, clock.clone()).unwrap();
    let server = TestServer::new(build_router(&config, &services)).unwrap();

    TestApp {
        server,
        services,
        clock,
        upload_dir,
    }
}

impl TestApp {
    /// Sign up a user and return `(user id, access token)`
    pub async fn signup(&self, email: &str) -> (i64, String) {
        let response = self
            .server
            .post("/api/auth/signup")
            .json(&json!({
                "email": email,
                "password": "password123",
                "name": "Test User"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: Value = response.json();
        (
            body["data"]["user"]["id"].as_i64().unwrap(),
            body["data"]["accessToken"].as_str().unwrap().to_string(),
        )
    }
}

/// `Authorization` header value for a bearer token
pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}
