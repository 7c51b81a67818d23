use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::custody::StatusFailurePolicy;

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

/// Top-level configuration for the gateway and its lending API client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub desk: DeskConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            desk: DeskConfig::from_env()?,
        })
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

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080/api/money-loan";

/// Lending API access and the client-side timing knobs.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub http_timeout: Duration,
    pub poll_interval: Duration,
    pub debounce_window: Duration,
    pub failure_policy: StatusFailurePolicy,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            http_timeout: Duration::from_secs(20),
            poll_interval: Duration::from_secs(30),
            debounce_window: Duration::from_millis(500),
            failure_policy: StatusFailurePolicy::FailOpen,
        }
    }
}

impl DeskConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base_url = env::var("DESK_API_BASE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_base_url);
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(api_base_url));
        }

        let api_token = env::var("DESK_API_TOKEN")
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty());

        let http_timeout = match env::var("DESK_HTTP_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(parse_positive("DESK_HTTP_TIMEOUT_SECS", &raw)?),
            Err(_) => defaults.http_timeout,
        };
        let poll_interval = match env::var("DESK_POLL_INTERVAL_SECS") {
            Ok(raw) => Duration::from_secs(parse_positive("DESK_POLL_INTERVAL_SECS", &raw)?),
            Err(_) => defaults.poll_interval,
        };
        let debounce_window = match env::var("DESK_DEBOUNCE_MS") {
            Ok(raw) => Duration::from_millis(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidDuration {
                        key: "DESK_DEBOUNCE_MS",
                    })?,
            ),
            Err(_) => defaults.debounce_window,
        };

        let failure_policy = match env::var("DESK_STATUS_FAILURE_POLICY") {
            Ok(raw) => raw
                .parse::<StatusFailurePolicy>()
                .map_err(ConfigError::InvalidFailurePolicy)?,
            Err(_) => defaults.failure_policy,
        };

        Ok(Self {
            api_base_url,
            api_token,
            http_timeout,
            poll_interval,
            debounce_window,
            failure_policy,
        })
    }
}

fn parse_positive(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|value| *value > 0)
        .ok_or(ConfigError::InvalidDuration { key })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBaseUrl(String),
    InvalidDuration { key: &'static str },
    InvalidFailurePolicy(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBaseUrl(url) => {
                write!(f, "DESK_API_BASE_URL must be an http(s) URL, got '{url}'")
            }
            ConfigError::InvalidDuration { key } => {
                write!(f, "{key} must be a positive whole number")
            }
            ConfigError::InvalidFailurePolicy(value) => write!(
                f,
                "DESK_STATUS_FAILURE_POLICY must be fail_open or fail_closed, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidBaseUrl(_)
            | ConfigError::InvalidDuration { .. }
            | ConfigError::InvalidFailurePolicy(_) => None,
        }
    }
}
