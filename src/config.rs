//! Configuration with validation at startup.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use profile_identity::IdentityToolkitConfig;
use profile_telemetry::TelemetryConfig;
use secrecy::SecretString;

/// Profile service configuration.
///
/// All values can be set via environment variables or CLI arguments.
#[derive(Debug, Clone, Parser)]
#[command(name = "profile-service", about = "Profile records HTTP service")]
pub struct Config {
    /// HTTP listen address
    #[arg(long, env = "HTTP_ADDRESS", default_value = "0.0.0.0:3000")]
    pub http_address: String,

    /// CORS allowed origins (comma-separated, or "*" for any)
    #[arg(long, env = "CORS_ALLOW_ORIGINS")]
    pub cors_allow_origins: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Database connection URL
    #[arg(long, env = "DB_URL")]
    pub db_url: String,

    /// Database password (URL-encoded and inserted into DB_URL)
    #[arg(long, env = "DB_PASSWORD")]
    pub db_password: Option<SecretString>,

    /// Database pool minimum connections
    #[arg(long, env = "DB_POOL_MIN", default_value = "1")]
    pub db_pool_min: u32,

    /// Database pool maximum connections
    #[arg(long, env = "DB_POOL_MAX", default_value = "10")]
    pub db_pool_max: u32,

    /// Database connection timeout in seconds
    #[arg(long, env = "DB_CONNECT_TIMEOUT", default_value = "30")]
    pub db_connect_timeout_secs: u64,

    /// Apply embedded migrations on startup
    #[arg(long, env = "DB_MIGRATE", default_value = "false")]
    pub db_migrate: bool,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long, env = "LOG_LEVEL", default_value = "INFO")]
    pub log_level: String,

    /// Use JSON log format
    #[arg(long, env = "JSON_LOGS", default_value = "true")]
    pub json_logs: bool,

    /// OpenTelemetry OTLP endpoint
    #[arg(long, env = "OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Environment name (e.g., "production", "development")
    #[arg(long, env = "ENVIRONMENT")]
    pub environment: Option<String>,

    /// Max profile picture size in bytes (default: 2MB)
    #[arg(long, env = "MAX_PHOTO_BYTES", default_value = "2097152")]
    pub max_photo_bytes: usize,

    /// Directory for staging uploads (defaults to the system temp dir)
    #[arg(long, env = "UPLOAD_TEMP_DIR")]
    pub upload_temp_dir: Option<PathBuf>,

    /// S3 endpoint URL (e.g., http://localhost:9000/bucket-name/)
    #[arg(long, env = "S3_URL")]
    pub s3_url: Option<String>,

    /// S3 access key ID
    #[arg(long, env = "S3_ACCESS_KEY_ID")]
    pub s3_access_key_id: Option<String>,

    /// S3 secret access key
    #[arg(long, env = "S3_SECRET_ACCESS_KEY")]
    pub s3_secret_access_key: Option<SecretString>,

    /// S3 region
    #[arg(long, env = "S3_REGION")]
    pub s3_region: Option<String>,

    /// Public base URL for stored pictures (defaults to S3 endpoint + bucket)
    #[arg(long, env = "S3_PUBLIC_URL")]
    pub s3_public_url: Option<String>,

    /// Identity Toolkit API base URL
    #[arg(long, env = "IDENTITY_URL", default_value = IdentityToolkitConfig::DEFAULT_BASE_URL)]
    pub identity_url: String,

    /// Project owning the user accounts
    #[arg(long, env = "IDENTITY_PROJECT_ID")]
    pub identity_project_id: String,

    /// OAuth bearer token for the Identity Toolkit admin API
    #[arg(long, env = "IDENTITY_ACCESS_TOKEN")]
    pub identity_access_token: SecretString,
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Database pool max ({max}) must be >= min ({min})")]
    InvalidPoolSize { min: u32, max: u32 },
    #[error("Request timeout must be > 0")]
    InvalidRequestTimeout,
    #[error("Max photo size must be > 0")]
    InvalidMaxPhotoBytes,
    #[error("S3_URL, S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set together")]
    PartialS3Config,
}

impl Config {
    /// Parse and validate configuration.
    pub fn init() -> anyhow::Result<Self> {
        let config = Self::parse();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_pool_max < self.db_pool_min {
            return Err(ConfigError::InvalidPoolSize {
                min: self.db_pool_min,
                max: self.db_pool_max,
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidRequestTimeout);
        }
        if self.max_photo_bytes == 0 {
            return Err(ConfigError::InvalidMaxPhotoBytes);
        }
        let s3_parts = [
            self.s3_url.is_some(),
            self.s3_access_key_id.is_some(),
            self.s3_secret_access_key.is_some(),
        ];
        if s3_parts.contains(&true) && s3_parts.contains(&false) {
            return Err(ConfigError::PartialS3Config);
        }
        Ok(())
    }

    #[inline]
    pub const fn db_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.db_connect_timeout_secs)
    }

    #[inline]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Directory where uploads are staged before being pushed to storage.
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_temp_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Build the database URL with password substitution.
    pub fn database_url(&self) -> String {
        use secrecy::ExposeSecret;

        match &self.db_password {
            Some(password) => {
                let encoded = urlencoding::encode(password.expose_secret());
                self.db_url.replacen(":@", &format!(":{encoded}@"), 1)
            }
            None => self.db_url.clone(),
        }
    }

    pub fn telemetry(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
            otlp_endpoint: self.otlp_endpoint.clone(),
            environment: self.environment.clone(),
        }
    }

    pub fn identity(&self) -> IdentityToolkitConfig {
        IdentityToolkitConfig {
            base_url: self.identity_url.clone(),
            project_id: self.identity_project_id.clone(),
            access_token: self.identity_access_token.clone(),
            timeout: IdentityToolkitConfig::DEFAULT_TIMEOUT,
        }
    }
}
