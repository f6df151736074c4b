use std::{
    env::current_dir,
    path::{Path, PathBuf},
};

use super::ConfigError;


/// Section of the configuration file the hub settings live in.
pub const DEFAULT_SECTION: &str = "hub";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_ENVIRONMENT: &str = "production";
pub const DEFAULT_OUTPUT_PATH: &str = "~/podploy/podploy.log";

pub const DEFAULT_MAX_SIZE_MB: u64 = 100;
pub const DEFAULT_MAX_BACKUPS: u64 = 5;
pub const DEFAULT_MAX_AGE_DAYS: u64 = 30;


/// Returns the default configuration filepath, which is at
/// `{current directory}/data/configuration.toml`.
///
/// The file is not required to exist; loading it reports the missing file.
pub fn get_default_configuration_file_path() -> Result<PathBuf, ConfigError> {
    let mut configuration_filepath =
        current_dir().map_err(|source| ConfigError::LoadFailed {
            path: PathBuf::from("."),
            source: source.into(),
        })?;
    configuration_filepath.push("data/configuration.toml");

    Ok(configuration_filepath)
}

/// Canonicalizes `path` for display in diagnostics, falling back
/// to the path as given if it cannot be canonicalized.
pub fn display_path(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
