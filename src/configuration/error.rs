//! Configuration error types.

use std::{io, path::PathBuf};

use thiserror::Error;


/// Why a configuration document could not be loaded.
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error("could not read file: {0}")]
    Read(#[from] io::Error),

    #[error("could not parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration from {}: {source}", path.display())]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: LoadFailure,
    },

    #[error("failed to decode section [{section}]: {source}")]
    DecodeFailed {
        section: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid_value<S: Into<String>>(field: &'static str, reason: S) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
