//! Bootstrap layer of the podploy hub: settings loading and structured logging.
//!
//! The hub entry point loads [`Settings`] with [`load_settings`], projects
//! them into a [`LoggerConfiguration`] and builds a [`Logger`] that lives
//! for the rest of the process.

pub mod configuration;
pub mod logging;

pub use configuration::{load_settings, load_settings_section, ConfigError, Settings};
pub use logging::{Level, Logger, LoggerConfiguration, LoggerError};
