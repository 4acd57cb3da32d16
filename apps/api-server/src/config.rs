//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use pulse_core::error::ConfigError;
use pulse_core::services::SchedulerSettings;
use pulse_infra::{DatabaseConfig, JwtConfig, RateLimitConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs on in-memory stores.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub allow_admin_registration: bool,
    pub rate_limit: RateLimitConfig,
    pub scheduler: SchedulerConfig,
    pub publisher_delay: Duration,
}

/// Background publishing settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub settings: SchedulerSettings,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database = match get("DATABASE_URL").filter(|url| !url.is_empty()) {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 100)?,
                min_connections: parse_or(&get, "DB_MIN_CONNECTIONS", 10)?,
            }),
            None => None,
        };

        let defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: get("JWT_SECRET").unwrap_or(defaults.secret),
            expiration_hours: parse_or(&get, "JWT_EXPIRATION_HOURS", defaults.expiration_hours)?,
            issuer: get("JWT_ISSUER").unwrap_or(defaults.issuer),
        };

        let rate_limit = RateLimitConfig {
            max_requests: parse_or(&get, "RATE_LIMIT_MAX_REQUESTS", 20)?,
            window: Duration::from_secs(parse_or(&get, "RATE_LIMIT_WINDOW_SECS", 60)?),
        };

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            database,
            jwt,
            allow_admin_registration: flag(&get, "ALLOW_ADMIN_REGISTRATION", false)?,
            rate_limit,
            scheduler: SchedulerConfig::from_lookup(&get)?,
            publisher_delay: Duration::from_millis(parse_or(&get, "PUBLISHER_DELAY_MS", 200)?),
        })
    }
}

impl SchedulerConfig {
    fn from_lookup(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let interval = parse_or(get, "SCHEDULER_INTERVAL_SECS", 30u64)?;
        let max_concurrency: usize = parse_or(get, "SCHEDULER_MAX_CONCURRENCY", 4)?;
        if max_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SCHEDULER_MAX_CONCURRENCY",
                value: "0".to_string(),
            });
        }
        let max_attempts: u32 = parse_or(get, "SCHEDULER_MAX_ATTEMPTS", 0)?;

        let settings = SchedulerSettings::new(Duration::from_secs(interval))?
            .with_max_concurrency(max_concurrency)
            .with_max_attempts(Some(max_attempts));

        Ok(Self {
            enabled: flag(get, "SCHEDULER_ENABLED", true)?,
            settings,
        })
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

fn flag(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: bool,
) -> Result<bool, ConfigError> {
    match get(key).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if v == "true" || v == "1" => Ok(true),
        Some(v) if v == "false" || v == "0" => Ok(false),
        Some(value) => Err(ConfigError::InvalidValue { key, value }),
    }
}
