use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub minio: MinIOConfig,
    pub geocoding: GeocodingConfig,
    pub acquirer: AcquirerConfig,
    pub watermark: WatermarkConfig,
    pub fraud: FraudConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub jwks_cache_ttl: Duration,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// MinIO/S3 storage configuration for watermarked photo uploads
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Public endpoint URL for publicly accessible files (optional, defaults to endpoint)
    pub public_endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing files
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Prefix for public files (e.g., "public")
    pub public_prefix: String,
}

/// Nominatim reverse-geocoding configuration
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub base_url: String,
    /// Descriptive client identifier required by public Nominatim instances
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

/// Position acquisition configuration.
///
/// `source_url` points at a station-mounted receiver exposing a JSON
/// position endpoint; when unset, submissions without a client-supplied
/// fix are treated as GPS-unavailable.
#[derive(Debug, Clone)]
pub struct AcquirerConfig {
    pub timeout_ms: u64,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WatermarkConfig {
    /// Path to the TTF/OTF font used for the overlay text
    pub font_path: String,
    /// JPEG re-encode quality (1-100)
    pub jpeg_quality: u8,
}

/// Fraud classification policy. Thresholds are deployment policy, not code.
#[derive(Debug, Clone)]
pub struct FraudConfig {
    /// Maximum tolerated gap between capture and upload timestamps
    pub timestamp_threshold_secs: i64,
    /// Aggregate alert fires when invalid_gps / total exceeds this ratio
    pub invalid_ratio_alert: f64,
    /// Classify GPS-bearing entries with no capture timestamp as suspicious
    pub flag_missing_capture_time: bool,
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_submissions: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            // Only error if it's not "file not found" - that's acceptable
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            minio: MinIOConfig::from_env()?,
            geocoding: GeocodingConfig::from_env()?,
            acquirer: AcquirerConfig::from_env()?,
            watermark: WatermarkConfig::from_env()?,
            fraud: FraudConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 25 * 1024 * 1024; // 25MB, photos included

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    // Default values for JWT authentication
    const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600; // 1 hour
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let issuer = env::var("OIDC_ISSUER")
            .map_err(|_| "OIDC_ISSUER environment variable is required".to_string())?;

        let audience = env::var("OIDC_AUDIENCE")
            .map_err(|_| "OIDC_AUDIENCE environment variable is required".to_string())?;

        let jwks_cache_ttl_secs = env::var("JWKS_CACHE_TTL")
            .unwrap_or_else(|_| Self::DEFAULT_JWKS_CACHE_TTL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWKS_CACHE_TTL must be a valid number".to_string())?;

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        Ok(Self {
            issuer,
            audience,
            jwks_cache_ttl: Duration::from_secs(jwks_cache_ttl_secs),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Siteproof API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for Siteproof".to_string());

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

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket = env::var("MINIO_BUCKET").unwrap_or_else(|_| "siteproof-photos".to_string());

        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let public_prefix =
            env::var("MINIO_PUBLIC_PREFIX").unwrap_or_else(|_| "public".to_string());

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            public_prefix,
        })
    }
}

impl GeocodingConfig {
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("NOMINATIM_BASE_URL")
            .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string());

        let user_agent = env::var("NOMINATIM_USER_AGENT")
            .unwrap_or_else(|_| "SiteproofCore/1.0 (field-inspection-system)".to_string());

        let request_timeout_secs = env::var("NOMINATIM_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "NOMINATIM_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            base_url,
            user_agent,
            request_timeout_secs,
        })
    }
}

impl AcquirerConfig {
    const DEFAULT_TIMEOUT_MS: u64 = 10_000;

    pub fn from_env() -> Result<Self, String> {
        let timeout_ms = env::var("POSITION_TIMEOUT_MS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMEOUT_MS.to_string())
            .parse::<u64>()
            .map_err(|_| "POSITION_TIMEOUT_MS must be a valid number".to_string())?;

        let source_url = env::var("POSITION_SOURCE_URL").ok().filter(|s| !s.is_empty());

        Ok(Self {
            timeout_ms,
            source_url,
        })
    }
}

impl WatermarkConfig {
    const DEFAULT_FONT_PATH: &'static str =
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";
    const DEFAULT_JPEG_QUALITY: u8 = 95;

    pub fn from_env() -> Result<Self, String> {
        let font_path =
            env::var("WATERMARK_FONT_PATH").unwrap_or_else(|_| Self::DEFAULT_FONT_PATH.to_string());

        let jpeg_quality = env::var("WATERMARK_JPEG_QUALITY")
            .unwrap_or_else(|_| Self::DEFAULT_JPEG_QUALITY.to_string())
            .parse::<u8>()
            .map_err(|_| "WATERMARK_JPEG_QUALITY must be a valid number".to_string())?;

        if jpeg_quality == 0 || jpeg_quality > 100 {
            return Err("WATERMARK_JPEG_QUALITY must be between 1 and 100".to_string());
        }

        Ok(Self {
            font_path,
            jpeg_quality,
        })
    }
}

impl FraudConfig {
    const DEFAULT_TIMESTAMP_THRESHOLD_SECS: i64 = 300; // 5 minutes
    const DEFAULT_INVALID_RATIO_ALERT: f64 = 0.15;

    pub fn from_env() -> Result<Self, String> {
        let timestamp_threshold_secs = env::var("FRAUD_TIMESTAMP_THRESHOLD_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_TIMESTAMP_THRESHOLD_SECS.to_string())
            .parse::<i64>()
            .map_err(|_| "FRAUD_TIMESTAMP_THRESHOLD_SECS must be a valid number".to_string())?;

        let invalid_ratio_alert = env::var("FRAUD_INVALID_RATIO_ALERT")
            .unwrap_or_else(|_| Self::DEFAULT_INVALID_RATIO_ALERT.to_string())
            .parse::<f64>()
            .map_err(|_| "FRAUD_INVALID_RATIO_ALERT must be a valid number".to_string())?;

        let flag_missing_capture_time = env::var("FRAUD_FLAG_MISSING_CAPTURE_TIME")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(true);

        Ok(Self {
            timestamp_threshold_secs,
            invalid_ratio_alert,
            flag_missing_capture_time,
        })
    }
}

impl RateLimitConfig {
    const DEFAULT_WINDOW_SECS: u64 = 3600; // 1 hour
    const DEFAULT_MAX_SUBMISSIONS: u32 = 30;

    pub fn from_env() -> Result<Self, String> {
        let window_secs = env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_WINDOW_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "RATE_LIMIT_WINDOW_SECS must be a valid number".to_string())?;

        let max_submissions = env::var("RATE_LIMIT_MAX_SUBMISSIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_SUBMISSIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "RATE_LIMIT_MAX_SUBMISSIONS must be a valid number".to_string())?;

        Ok(Self {
            window_secs,
            max_submissions,
        })
    }
}
