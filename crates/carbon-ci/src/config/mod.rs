use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::workflows::carbon_intensity::{
    AssessmentConfig, RatingTable, RatingTableError, DEFAULT_FOSSIL_BASELINE,
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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub reporting: ReportingConfig,
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
            reporting: ReportingConfig::from_env()?,
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

/// Derivation inputs: comparator baseline, rating table and default factor table.
///
/// The rating table has no built-in values; it must be supplied through
/// `CI_RATING_THRESHOLDS` (or a CLI flag) before reports can be assessed.
#[derive(Debug, Clone)]
pub struct ReportingConfig {
    pub fossil_baseline: f64,
    pub rating_table: Option<RatingTable>,
    pub default_factors_csv: Option<PathBuf>,
}

impl ReportingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let fossil_baseline = match env::var("CI_FOSSIL_BASELINE") {
            Ok(raw) => parse_baseline(&raw)?,
            Err(_) => DEFAULT_FOSSIL_BASELINE,
        };

        let rating_table = env::var("CI_RATING_THRESHOLDS")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| raw.parse::<RatingTable>())
            .transpose()
            .map_err(ConfigError::InvalidRatingThresholds)?;

        let default_factors_csv = env::var("CI_DEFAULT_FACTORS_CSV")
            .ok()
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            fossil_baseline,
            rating_table,
            default_factors_csv,
        })
    }

    pub fn assessment_config(&self) -> Result<AssessmentConfig, ConfigError> {
        let table = self
            .rating_table
            .clone()
            .ok_or(ConfigError::MissingRatingThresholds)?;
        AssessmentConfig::new(table)
            .with_fossil_baseline(self.fossil_baseline)
            .map_err(|_| ConfigError::InvalidBaseline)
    }
}

pub fn parse_baseline(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(ConfigError::InvalidBaseline),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBaseline,
    MissingRatingThresholds,
    InvalidRatingThresholds(RatingTableError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBaseline => {
                write!(f, "CI_FOSSIL_BASELINE must be a positive number of gCO2e/MJ")
            }
            ConfigError::MissingRatingThresholds => write!(
                f,
                "CI_RATING_THRESHOLDS is not set (expected LABEL:MAX,...,WORST)"
            ),
            ConfigError::InvalidRatingThresholds(err) => {
                write!(f, "CI_RATING_THRESHOLDS is invalid: {err}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidRatingThresholds(err) => Some(err),
            ConfigError::InvalidPort
            | ConfigError::InvalidBaseline
            | ConfigError::MissingRatingThresholds => None,
        }
    }
}
