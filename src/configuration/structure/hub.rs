use serde::Deserialize;
use tracing::debug;

use crate::{
    configuration::{
        traits::ResolvableConfiguration,
        utilities::{
            DEFAULT_ENVIRONMENT,
            DEFAULT_HOST,
            DEFAULT_MAX_AGE_DAYS,
            DEFAULT_MAX_BACKUPS,
            DEFAULT_MAX_SIZE_MB,
            DEFAULT_OUTPUT_PATH,
            DEFAULT_PORT,
        },
        ConfigError,
    },
    logging::{Level, LoggerConfiguration},
};


/// The hub table exactly as it appears in the configuration file.
///
/// Every key is optional and unknown keys are ignored.
/// Integers are kept signed and wide here so that out-of-range values
/// reach validation instead of failing to decode.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub(crate) struct UnresolvedHubConfiguration {
    host: String,

    port: i64,

    log_level: String,

    environment: String,

    output_path: String,

    /// Maximum size of the active log file, in megabytes.
    max_size: i64,

    max_backups: i64,

    /// Maximum age of rotated log files, in days.
    max_age: i64,
}

/// Fully validated hub settings.
///
/// Every field holds an in-range value: a `Settings` is only ever
/// produced by resolving an [`UnresolvedHubConfiguration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,

    pub port: u16,

    pub log_level: Level,

    /// Free-form deployment environment name, e.g. `production` or `staging`.
    pub environment: String,

    /// Log file path. May start with `~/`, which the logger expands.
    pub output_path: String,

    pub max_size_mb: u64,

    pub max_backups: u64,

    pub max_age_days: u64,
}


impl ResolvableConfiguration for UnresolvedHubConfiguration {
    type Resolved = Settings;

    fn resolve(self) -> Result<Self::Resolved, ConfigError> {
        let host = or_default("host", self.host, DEFAULT_HOST);
        let port = resolve_port(self.port)?;
        let environment = or_default("environment", self.environment, DEFAULT_ENVIRONMENT);
        let log_level = resolve_log_level(&self.log_level)?;
        let output_path = or_default("output_path", self.output_path, DEFAULT_OUTPUT_PATH);

        let max_size_mb = positive_or_default("max_size", self.max_size, DEFAULT_MAX_SIZE_MB);
        let max_age_days = positive_or_default("max_age", self.max_age, DEFAULT_MAX_AGE_DAYS);
        let max_backups = match u64::try_from(self.max_backups) {
            Ok(max_backups) => max_backups,
            Err(_) => {
                debug!(value = self.max_backups, "Negative max_backups, using default.");
                DEFAULT_MAX_BACKUPS
            }
        };


        Ok(Settings {
            host,
            port,
            log_level,
            environment,
            output_path,
            max_size_mb,
            max_backups,
            max_age_days,
        })
    }
}


fn or_default(field: &'static str, value: String, default: &str) -> String {
    if value.is_empty() {
        debug!(field, default, "Field unset, using default.");
        return default.to_string();
    }

    value
}

fn positive_or_default(field: &'static str, value: i64, default: u64) -> u64 {
    match u64::try_from(value) {
        Ok(value) if value > 0 => value,
        _ => {
            debug!(field, value, default, "Non-positive value, using default.");
            default
        }
    }
}

/// `0` means "unset"; anything else must be a valid TCP port.
fn resolve_port(port: i64) -> Result<u16, ConfigError> {
    if port == 0 {
        debug!(default = DEFAULT_PORT, "Port unset, using default.");
        return Ok(DEFAULT_PORT);
    }

    match u16::try_from(port) {
        Ok(port) => Ok(port),
        Err(_) => Err(ConfigError::invalid_value(
            "port",
            format!("port {port} out of range [1-65535]"),
        )),
    }
}

/// Empty means "unset". Any other value must name one of the levels
/// (in any letter case); unrecognized names are rejected.
fn resolve_log_level(log_level: &str) -> Result<Level, ConfigError> {
    if log_level.is_empty() {
        debug!(default = %Level::default(), "Log level unset, using default.");
        return Ok(Level::default());
    }

    Level::from_canonical_name(log_level).ok_or_else(|| {
        ConfigError::invalid_value(
            "log_level",
            format!(
                "unrecognized log level {log_level:?}, expected one of debug, info, warn, error, fatal"
            ),
        )
    })
}


impl Settings {
    pub fn is_production(&self) -> bool {
        self.environment == DEFAULT_ENVIRONMENT
    }

    /// Address the hub server binds to, as `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Projects the logging-relevant part of the settings.
    /// Every environment other than `production` logs in development mode.
    pub fn logger_configuration(&self) -> LoggerConfiguration {
        LoggerConfiguration {
            level: self.log_level.to_string(),
            output_path: self.output_path.clone(),
            development: !self.is_production(),
            max_size_mb: self.max_size_mb,
            max_backups: self.max_backups,
            max_age_days: self.max_age_days,
        }
    }
}
