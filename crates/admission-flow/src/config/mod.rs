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
    pub backend: BackendConfig,
    pub validation: ValidationSettings,
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

        let backend = BackendConfig::from_env()?;
        let waive_pro_receipt = env::var("ADMISSIONS_WAIVE_PRO_RECEIPT")
            .map(|value| parse_flag(&value))
            .unwrap_or(false);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            backend,
            validation: ValidationSettings { waive_pro_receipt },
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where submissions are sent and which operator they are recorded against.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub operator_id: i64,
    pub request_timeout: Duration,
}

impl BackendConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = env::var("ADMISSIONS_BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());
        let base_url = raw_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBackendUrl(raw_url));
        }

        let api_token = env::var("ADMISSIONS_API_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let operator_id = match env::var("ADMISSIONS_OPERATOR_ID") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::InvalidOperatorId)?,
            Err(_) => 0,
        };

        let timeout_secs = env::var("ADMISSIONS_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout)?;

        Ok(Self {
            base_url,
            api_token,
            operator_id,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Dials for the validation orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationSettings {
    pub waive_pro_receipt: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBackendUrl(String),
    InvalidOperatorId,
    InvalidTimeout,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBackendUrl(value) => write!(
                f,
                "ADMISSIONS_BACKEND_URL must be an http(s) URL, got '{}'",
                value
            ),
            ConfigError::InvalidOperatorId => {
                write!(f, "ADMISSIONS_OPERATOR_ID must be an integer")
            }
            ConfigError::InvalidTimeout => write!(
                f,
                "ADMISSIONS_REQUEST_TIMEOUT_SECS must be a whole number of seconds"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidBackendUrl(_)
            | ConfigError::InvalidOperatorId
            | ConfigError::InvalidTimeout => None,
        }
    }
}
