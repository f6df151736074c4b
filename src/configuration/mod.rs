//! This module contains all configuration-relevant code, including
//! the hub settings structure as well as the functions needed to load
//! and validate it.
//!
//! Your starting point should probably be [`load_settings`].
//!
//! # Internals
//! Loading is split into an unvalidated ("unresolved") and a validated
//! configuration structure.
//!
//! The configuration file is parsed as a TOML document, and the requested
//! section (`[hub]` by default) is deserialized into the
//! [`UnresolvedHubConfiguration`] structure. Its `resolve` method then
//! applies defaults and validates every field, producing [`Settings`].
//! A [`Settings`] value is therefore always fully valid; no partially
//! validated state leaves this module.

#![allow(rustdoc::private_intra_doc_links)]

mod error;
mod structure;
mod traits;
mod utilities;

use std::{fs, path::Path};

pub use error::{ConfigError, LoadFailure};
pub use structure::Settings;
use tracing::debug;
pub use utilities::{
    get_default_configuration_file_path,
    DEFAULT_ENVIRONMENT,
    DEFAULT_HOST,
    DEFAULT_MAX_AGE_DAYS,
    DEFAULT_MAX_BACKUPS,
    DEFAULT_MAX_SIZE_MB,
    DEFAULT_OUTPUT_PATH,
    DEFAULT_PORT,
    DEFAULT_SECTION,
};

use self::{
    structure::UnresolvedHubConfiguration,
    traits::ResolvableConfiguration,
    utilities::display_path,
};


/// Load the hub settings from the `[hub]` section of the TOML file at `path`.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
    load_settings_section(path, DEFAULT_SECTION)
}

/// Load the hub settings from an arbitrary `section` of the TOML file at `path`.
///
/// A file without the requested section resolves to the default settings.
pub fn load_settings_section<P: AsRef<Path>>(
    path: P,
    section: &str,
) -> Result<Settings, ConfigError> {
    let path = path.as_ref();

    // Read and parse the whole document first; both count as loading the file.
    let configuration_string =
        fs::read_to_string(path).map_err(|source| ConfigError::LoadFailed {
            path: display_path(path),
            source: source.into(),
        })?;

    let document = configuration_string
        .parse::<toml::Table>()
        .map_err(|source| ConfigError::LoadFailed {
            path: display_path(path),
            source: source.into(),
        })?;


    let unresolved_configuration = match document.get(section) {
        Some(value) => value
            .clone()
            .try_into::<UnresolvedHubConfiguration>()
            .map_err(|source| ConfigError::DecodeFailed {
                section: section.to_string(),
                source,
            })?,
        None => {
            debug!(section, "Section missing from configuration, using defaults.");
            UnresolvedHubConfiguration::default()
        }
    };


    unresolved_configuration.resolve()
}
