use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
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
    pub planner: PlannerConfig,
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
            planner: PlannerConfig::from_env()?,
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Tunables for the planning loop and its default collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Attempt budget per run; clamped to 1..=3 by the loop.
    pub max_iterations: usize,
    /// Cost at or below which an action without a computable payback is still admissible.
    pub negligible_cost: f64,
    /// kg CO2 avoided per kWh saved.
    pub emission_factor: f64,
    pub proposer_timeout: Duration,
    pub default_tariff: f64,
    pub catalog_csv: Option<PathBuf>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2,
            negligible_cost: 5_000.0,
            emission_factor: 0.6,
            proposer_timeout: Duration::from_millis(10_000),
            default_tariff: 62.0,
            catalog_csv: None,
        }
    }
}

impl PlannerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_iterations =
            parse_var("PLANNER_MAX_ITERATIONS")?.unwrap_or(defaults.max_iterations);
        let negligible_cost = parse_non_negative("PLANNER_NEGLIGIBLE_COST")?
            .unwrap_or(defaults.negligible_cost);
        let emission_factor = parse_non_negative("PLANNER_EMISSION_FACTOR")?
            .unwrap_or(defaults.emission_factor);
        let proposer_timeout = parse_var::<u64>("PLANNER_PROPOSER_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.proposer_timeout);
        let default_tariff =
            parse_non_negative("PLANNER_DEFAULT_TARIFF")?.unwrap_or(defaults.default_tariff);
        let catalog_csv = env::var("PLANNER_CATALOG_CSV")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            max_iterations,
            negligible_cost,
            emission_factor,
            proposer_timeout,
            default_tariff,
            catalog_csv,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        _ => Ok(None),
    }
}

fn parse_non_negative(key: &'static str) -> Result<Option<f64>, ConfigError> {
    match parse_var::<f64>(key)? {
        Some(value) if !value.is_finite() || value < 0.0 => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
        other => Ok(other),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative number (got '{value}')")
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
