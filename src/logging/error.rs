//! Logger error types.

use std::{io, path::PathBuf};

use thiserror::Error;

use super::level::ParseLevelError;


#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("invalid logger configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to resolve log path {path:?}: could not determine the user's home directory")]
    PathResolutionFailed { path: String },

    #[error("failed to create log directory {}: {source}", path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open log file {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    InvalidLevel(#[from] ParseLevelError),

    #[error("failed to flush log output: {0}")]
    FlushFailed(#[source] io::Error),

    #[error("failed to install the global tracing subscriber: {0}")]
    SubscriberInstallFailed(#[from] tracing_subscriber::util::TryInitError),
}
