use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::admissions::config::{
    AdmissionsConfig, NotificationTargeting, DEFAULT_SCREENING_HREF,
};

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

/// Top-level configuration for the admissions service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub admissions: AdmissionsConfig,
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
        let ansi = environment == AppEnvironment::Development;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            admissions: load_admissions()?,
        })
    }
}

fn load_admissions() -> Result<AdmissionsConfig, ConfigError> {
    let notification_targeting = match env::var("ADMISSIONS_NOTIFICATION_TARGET") {
        Ok(raw) => NotificationTargeting::parse(&raw)
            .ok_or(ConfigError::InvalidNotificationTarget { value: raw })?,
        Err(_) => NotificationTargeting::default(),
    };

    let screening_href = env::var("ADMISSIONS_SCREENING_HREF")
        .ok()
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .unwrap_or_else(|| DEFAULT_SCREENING_HREF.to_string());

    let require_complete_profile = match env::var("ADMISSIONS_REQUIRE_COMPLETE_PROFILE") {
        Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
            name: "ADMISSIONS_REQUIRE_COMPLETE_PROFILE",
            value: raw,
        })?,
        Err(_) => false,
    };

    Ok(AdmissionsConfig {
        notification_targeting,
        screening_href,
        require_complete_profile,
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
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
    pub ansi: bool,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNotificationTarget { value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNotificationTarget { value } => write!(
                f,
                "ADMISSIONS_NOTIFICATION_TARGET must be 'audience' or 'guardians' (got '{}')",
                value
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{} must be true or false (got '{}')", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNotificationTarget { .. }
            | ConfigError::InvalidFlag { .. } => None,
        }
    }
}
