use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::scoring::config::{ModelVersion, ScoringConfig, ScoringConfigError};
use crate::scoring::hr::{HrParams, MAX_WINDOW_DAYS};

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
    pub scoring: ScoringSettings,
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
            scoring: ScoringSettings::from_env()?,
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

/// Environment overrides for the scoring engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringSettings {
    pub model_version: ModelVersion,
    /// JSON file with configuration tables; the standard tables otherwise.
    pub config_path: Option<PathBuf>,
    pub bootstrap_samples: usize,
    pub bootstrap_seed: u64,
    pub hr_window_days: i64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            model_version: ModelVersion::default(),
            config_path: None,
            bootstrap_samples: 400,
            bootstrap_seed: 42,
            hr_window_days: 365,
        }
    }
}

impl ScoringSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let model_version = match env::var("ORG_AIR_MODEL_VERSION") {
            Ok(raw) if !raw.trim().is_empty() => ModelVersion::from_str(raw.trim())
                .map_err(|_| ConfigError::InvalidModelVersion { value: raw })?,
            _ => defaults.model_version,
        };
        let config_path = env::var("ORG_AIR_SCORING_CONFIG")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        let hr_window_days = number_var("ORG_AIR_HR_WINDOW_DAYS", defaults.hr_window_days)?;
        if !HrParams::window_is_valid(hr_window_days) {
            return Err(ConfigError::InvalidHrWindow {
                value: hr_window_days,
            });
        }

        Ok(Self {
            model_version,
            config_path,
            bootstrap_samples: number_var("ORG_AIR_BOOTSTRAP_SAMPLES", defaults.bootstrap_samples)?,
            bootstrap_seed: number_var("ORG_AIR_BOOTSTRAP_SEED", defaults.bootstrap_seed)?,
            hr_window_days,
        })
    }

    /// Scoring tables with these overrides applied.
    pub fn scoring_config(&self) -> Result<ScoringConfig, ScoringConfigError> {
        let mut config = match &self.config_path {
            Some(path) => ScoringConfig::from_json_path(path)?,
            None => ScoringConfig::standard(),
        };
        config.sem.bootstrap_samples = self.bootstrap_samples;
        config.sem.seed = self.bootstrap_seed;
        config.hr.window_days = self.hr_window_days;
        config.validate()?;
        Ok(config)
    }
}

fn number_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        _ => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str, value: String },
    InvalidModelVersion { value: String },
    InvalidHrWindow { value: i64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a number, got '{value}'")
            }
            ConfigError::InvalidModelVersion { value } => write!(
                f,
                "ORG_AIR_MODEL_VERSION must be org-air-v1 or org-air-v2, got '{value}'"
            ),
            ConfigError::InvalidHrWindow { value } => write!(
                f,
                "ORG_AIR_HR_WINDOW_DAYS must be between 1 and {MAX_WINDOW_DAYS} days, got {value}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidModelVersion { .. }
            | ConfigError::InvalidHrWindow { .. } => None,
        }
    }
}
