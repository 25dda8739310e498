use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
    pub features: FeatureFlags,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub service_name: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

/// Local file storage and expiry configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory uploaded files are written to
    pub upload_dir: PathBuf,
    /// Largest accepted upload in bytes
    pub max_file_size: usize,
    /// How long an uploaded file stays downloadable
    pub file_ttl: Duration,
    /// Interval of the expiry sweep
    pub sweep_interval: Duration,
    /// Whether downloads may be cached by clients
    pub cache_downloads: bool,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry: Duration,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub rate_limit_max_requests: u32,
    pub rate_limit_window: Duration,
    pub csrf_enabled: bool,
    pub sanitize_input: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureFlags {
    pub fast_mode: bool,
    pub compression: bool,
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        let features = FeatureFlags::from_env()?;

        Ok(Config {
            app: AppConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            auth: AuthConfig::from_env(features.debug)?,
            security: SecurityConfig::from_env()?,
            features,
            swagger: SwaggerConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 50 * 1024 * 1024; // 50MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let service_name = env::var("SERVICE_NAME").unwrap_or_else(|_| "Suntyn AI".to_string());

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = match env::var("MAX_REQUEST_BODY_SIZE") {
            Ok(raw) => parse_size(&raw)
                .map_err(|e| format!("MAX_REQUEST_BODY_SIZE is invalid: {}", e))?,
            Err(_) => Self::DEFAULT_MAX_REQUEST_BODY_SIZE,
        };

        Ok(Self {
            host,
            port,
            service_name,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    const DEFAULT_MAX_FILE_SIZE: &'static str = "50MB";
    const DEFAULT_FILE_TTL_SECS: u64 = 3600; // 1 hour
    const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let upload_dir = PathBuf::from(
            env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
        );

        let max_file_size = parse_size(
            &env::var("MAX_FILE_SIZE").unwrap_or_else(|_| Self::DEFAULT_MAX_FILE_SIZE.to_string()),
        )
        .map_err(|e| format!("MAX_FILE_SIZE is invalid: {}", e))?;

        let file_ttl_secs = env::var("FILE_TTL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_FILE_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "FILE_TTL_SECS must be a valid number".to_string())?;

        let sweep_interval_secs = env::var("FILE_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_SWEEP_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "FILE_SWEEP_INTERVAL_SECS must be a valid number".to_string())?;

        if sweep_interval_secs == 0 {
            return Err("FILE_SWEEP_INTERVAL_SECS must be greater than zero".to_string());
        }

        Ok(Self {
            upload_dir,
            max_file_size,
            file_ttl: Duration::from_secs(file_ttl_secs),
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            cache_downloads: env_flag("CACHE_STATIC_FILES")?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWT_EXPIRY_SECS: u64 = 24 * 3600; // 24 hours
    const DEV_JWT_SECRET: &'static str = "dev-only-jwt-secret-change-me";

    pub fn from_env(debug: bool) -> Result<Self, String> {
        let jwt_secret = match env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if debug => {
                eprintln!("Warning: JWT_SECRET not set, using development secret");
                Self::DEV_JWT_SECRET.to_string()
            }
            None => return Err("JWT_SECRET environment variable is required".to_string()),
        };

        let jwt_expiry_secs = env::var("JWT_EXPIRY_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_EXPIRY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_EXPIRY_SECS must be a valid number".to_string())?;

        Ok(Self {
            jwt_secret,
            jwt_expiry: Duration::from_secs(jwt_expiry_secs),
        })
    }
}

impl SecurityConfig {
    const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 50;
    const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60; // 15 minutes

    pub fn from_env() -> Result<Self, String> {
        let rate_limit_max_requests = env::var("RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| Self::DEFAULT_RATE_LIMIT_MAX_REQUESTS.to_string())
            .parse::<u32>()
            .map_err(|_| "RATE_LIMIT_MAX_REQUESTS must be a valid number".to_string())?;

        let rate_limit_window_secs = env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_RATE_LIMIT_WINDOW_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "RATE_LIMIT_WINDOW_SECS must be a valid number".to_string())?;

        Ok(Self {
            rate_limit_max_requests,
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
            csrf_enabled: env_flag_or("CSRF_ENABLED", true)?,
            sanitize_input: env_flag_or("SANITIZE_INPUT", true)?,
        })
    }
}

impl FeatureFlags {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            fast_mode: env_flag("ENABLE_FAST_MODE")?,
            compression: env_flag("ENABLE_COMPRESSION")?,
            debug: env_flag("DEBUG")?,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Suntyn AI API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for the Suntyn AI tools backend".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

fn env_flag(name: &str) -> Result<bool, String> {
    env_flag_or(name, false)
}

fn env_flag_or(name: &str, default: bool) -> Result<bool, String> {
    match env::var(name) {
        Ok(raw) => parse_flag(&raw).ok_or_else(|| format!("{} must be true or false", name)),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a human size such as `50MB`, `512KB`, `1GB` or a raw byte count
pub fn parse_size(raw: &str) -> Result<usize, String> {
    let upper = raw.trim().to_ascii_uppercase();
    let (digits, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    let value = digits
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not a valid size", raw))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("'{}' is too large", raw))
}
