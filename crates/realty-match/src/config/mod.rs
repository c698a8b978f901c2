use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::matching::{MatchingConfig, ScoringWeights, MAX_TOTAL_WEIGHT};

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
    pub matching: MatchingConfig,
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
            matching: load_matching()?,
        })
    }
}

fn load_matching() -> Result<MatchingConfig, ConfigError> {
    let mut matching = MatchingConfig::default();

    if let Ok(raw) = env::var("MATCH_THRESHOLD") {
        matching.match_threshold = raw
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|threshold| *threshold <= 100)
            .ok_or(ConfigError::InvalidThreshold)?;
    }

    if let Ok(raw) = env::var("MATCH_TOP_LIMIT") {
        matching.top_limit = raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|limit| *limit >= 1)
            .ok_or(ConfigError::InvalidTopLimit)?;
    }

    if let Ok(raw) = env::var("MATCH_WEIGHTS") {
        matching.weights = parse_weights(&raw).ok_or(ConfigError::InvalidWeights { value: raw })?;
    }

    Ok(matching)
}

/// Parses six comma separated weights in criterion table order, totalling at most
/// [`MAX_TOTAL_WEIGHT`].
fn parse_weights(raw: &str) -> Option<ScoringWeights> {
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;

    let weights = match values.as_slice() {
        [property_type, budget, location, bedrooms, area, listing_type] => ScoringWeights {
            property_type: *property_type,
            budget: *budget,
            location: *location,
            bedrooms: *bedrooms,
            area: *area,
            listing_type: *listing_type,
        },
        _ => return None,
    };

    (weights.total() <= MAX_TOTAL_WEIGHT).then_some(weights)
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

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidThreshold,
    InvalidTopLimit,
    InvalidWeights { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidThreshold => {
                write!(f, "MATCH_THRESHOLD must be an integer between 0 and 100")
            }
            ConfigError::InvalidTopLimit => {
                write!(f, "MATCH_TOP_LIMIT must be a positive integer")
            }
            ConfigError::InvalidWeights { value } => write!(
                f,
                "MATCH_WEIGHTS must list six comma separated integers totalling at most \
                 {MAX_TOTAL_WEIGHT}, found '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidThreshold
            | ConfigError::InvalidTopLimit
            | ConfigError::InvalidWeights { .. } => None,
        }
    }
}
