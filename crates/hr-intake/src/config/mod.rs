use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub import: ImportLimits,
    pub storage: StorageConfig,
    pub submission: SubmissionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = ImportLimits::default();
        let import = ImportLimits {
            max_bytes: numeric_var("APP_IMPORT_MAX_BYTES", defaults.max_bytes)?,
            max_rows: numeric_var("APP_IMPORT_MAX_ROWS", defaults.max_rows)?,
        };

        let storage_defaults = StorageConfig::default();
        let storage = StorageConfig {
            resume_bucket: env::var("APP_RESUME_BUCKET")
                .unwrap_or(storage_defaults.resume_bucket),
            certificate_bucket: env::var("APP_CERTIFICATE_BUCKET")
                .unwrap_or(storage_defaults.certificate_bucket),
            license_bucket: env::var("APP_LICENSE_BUCKET")
                .unwrap_or(storage_defaults.license_bucket),
        };

        let timeout_secs: u64 = numeric_var(
            "APP_STORE_TIMEOUT_SECS",
            SubmissionConfig::default().call_timeout.as_secs(),
        )?;
        let submission = SubmissionConfig {
            call_timeout: Duration::from_secs(timeout_secs.max(1)),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            import,
            storage,
            submission,
        })
    }
}

fn numeric_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Upper bounds applied to a CSV upload before any row is mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_bytes: usize,
    pub max_rows: usize,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            max_rows: 50,
        }
    }
}

/// Blob storage buckets for endorsement documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub resume_bucket: String,
    pub certificate_bucket: String,
    pub license_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            resume_bucket: "resumes".to_string(),
            certificate_bucket: "certificates".to_string(),
            license_bucket: "licenses".to_string(),
        }
    }
}

/// Bounds on backing-store calls made while endorsing applicants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionConfig {
    pub call_timeout: Duration,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(20),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
