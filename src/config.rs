//! Configuration loader for the `agro-sensorflow` dashboard service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
//!
use std::env;
use std::time::Duration;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Parse a required string environment variable.
macro_rules! require_env {
    ($var_name:expr) => {
        env::var($var_name)
            .map_err(|_| anyhow!("{} must be set in .env or environment", $var_name))?
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL connection string.
    pub db_url: String,

    /// Maximum number of database connections in the pool.
    pub db_pool_max: u32,

    /// Port the HTTP API listens on.
    pub http_port: u16,

    /// Periodic chart refresh interval.
    pub poll_interval: Duration,

    /// Interval between simulated readings.
    pub simulation_interval: Duration,

    /// Readings older than this never trigger alerts.
    pub alert_staleness: Duration,
}

/// Load configuration from environment variables with defaults.
///
/// Required:
/// - `DATABASE_URL` – PostgreSQL connection string
///
/// Optional:
/// - `DB_POOL_MAX` – max DB connections (default: 5)
/// - `HTTP_PORT` – API port (default: 8080)
/// - `POLL_INTERVAL_SECS` – chart refresh period (default: 60)
/// - `SIMULATION_INTERVAL_SECS` – simulated reading period (default: 15)
/// - `ALERT_STALENESS_SECS` – alert staleness window (default: 300)
///
/// Returns an error if any required variable is missing or invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let db_url = require_env!("DATABASE_URL");
    let db_pool_max = parse_env_u32!("DB_POOL_MAX", 5);
    let http_port = parse_env_u32!("HTTP_PORT", 8080);
    let poll_secs = parse_env_u32!("POLL_INTERVAL_SECS", 60);
    let simulation_secs = parse_env_u32!("SIMULATION_INTERVAL_SECS", 15);
    let staleness_secs = parse_env_u32!("ALERT_STALENESS_SECS", 300);

    let http_port =
        u16::try_from(http_port).map_err(|_| anyhow!("Invalid HTTP_PORT: {}", http_port))?;
    if poll_secs == 0 || simulation_secs == 0 {
        return Err(anyhow!(
            "POLL_INTERVAL_SECS and SIMULATION_INTERVAL_SECS must be positive"
        ));
    }

    Ok(Config {
        db_url,
        db_pool_max,
        http_port,
        poll_interval: Duration::from_secs(poll_secs.into()),
        simulation_interval: Duration::from_secs(simulation_secs.into()),
        alert_staleness: Duration::from_secs(staleness_secs.into()),
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password while showing all other values.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  DATABASE_URL             : {}", self.masked_db_url());
        tracing::info!("  DB_POOL_MAX              : {}", self.db_pool_max);
        tracing::info!("  HTTP_PORT                : {}", self.http_port);
        tracing::info!("  POLL_INTERVAL_SECS       : {}", self.poll_interval.as_secs());
        tracing::info!(
            "  SIMULATION_INTERVAL_SECS : {}",
            self.simulation_interval.as_secs()
        );
        tracing::info!(
            "  ALERT_STALENESS_SECS     : {}",
            self.alert_staleness.as_secs()
        );
    }

    /// `db_url` with the password replaced by `****`.
    ///
    /// Only the `user:password@` part of the authority is considered; a URL
    /// with no password is returned unchanged.
    pub fn masked_db_url(&self) -> String {
        // ---
        let authority_start = self.db_url.find("://").map_or(0, |i| i + 3);
        let Some(at_pos) = self.db_url[authority_start..].rfind('@') else {
            return self.db_url.clone();
        };
        let at_pos = authority_start + at_pos;

        match self.db_url[authority_start..at_pos].find(':') {
            Some(colon_pos) => format!(
                "{}:****{}",
                &self.db_url[..authority_start + colon_pos],
                &self.db_url[at_pos..]
            ),
            None => self.db_url.clone(),
        }
    }
}
