//! Logger configuration and its presets.

use super::{level::Level, rotation::RotationPolicy, LoggerError};
use crate::configuration::{
    DEFAULT_MAX_AGE_DAYS,
    DEFAULT_MAX_BACKUPS,
    DEFAULT_MAX_SIZE_MB,
    DEFAULT_OUTPUT_PATH,
};


/// Everything needed to construct a [`Logger`](super::Logger).
///
/// Usually projected from the hub [`Settings`](crate::configuration::Settings),
/// but it is validated on its own so a logger can be built without them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfiguration {
    /// Initial level threshold. Accepts the aliases `warning` and `err`.
    pub level: String,

    /// Log file path. A leading `~/` is expanded to the user's home directory.
    pub output_path: String,

    /// Mirror output to the console and render records human-readably.
    pub development: bool,

    /// Rotate once the active file would exceed this many megabytes. `0` uses the default.
    pub max_size_mb: u64,

    /// Number of rotated files to retain. `0` retains none.
    pub max_backups: u64,

    /// Remove rotated files older than this many days. `0` uses the default.
    pub max_age_days: u64,
}

impl Default for LoggerConfiguration {
    fn default() -> Self {
        Self {
            level: Level::Info.to_string(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            development: false,
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_backups: DEFAULT_MAX_BACKUPS,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }
}

impl LoggerConfiguration {
    /// Debug level, development mode, default log path.
    pub fn development() -> Self {
        Self {
            level: Level::Debug.to_string(),
            development: true,
            ..Self::default()
        }
    }

    /// Info level, structured output only, written to `output_path`
    /// (or the default path if it is empty).
    pub fn production<S: Into<String>>(output_path: S) -> Self {
        let output_path = output_path.into();

        Self {
            output_path: if output_path.is_empty() {
                DEFAULT_OUTPUT_PATH.to_string()
            } else {
                output_path
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), LoggerError> {
        if self.output_path.is_empty() {
            return Err(LoggerError::InvalidConfig(
                "output path cannot be empty".to_string(),
            ));
        }

        self.parsed_level().map(|_| ())
    }

    pub(crate) fn parsed_level(&self) -> Result<Level, LoggerError> {
        self.level.parse::<Level>().map_err(|error| {
            LoggerError::InvalidConfig(format!("invalid log level {:?}: {error}", self.level))
        })
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        let max_size_mb = match self.max_size_mb {
            0 => DEFAULT_MAX_SIZE_MB,
            max_size_mb => max_size_mb,
        };
        let max_age_days = match self.max_age_days {
            0 => DEFAULT_MAX_AGE_DAYS,
            max_age_days => max_age_days,
        };

        RotationPolicy::new(max_size_mb, self.max_backups, max_age_days)
    }
}
