//! Log file path resolution.

use std::{
    fs,
    path::{Path, PathBuf},
};

use super::LoggerError;


/// Expands a leading `~` in `path` to `home_directory`.
///
/// Only `~` on its own or followed by a separator is expanded;
/// `~user` forms are left untouched.
pub fn expand_home(path: &str, home_directory: Option<&Path>) -> Result<PathBuf, LoggerError> {
    let remainder = if path == "~" {
        ""
    } else if let Some(remainder) = path.strip_prefix("~/") {
        remainder
    } else if let Some(remainder) = path.strip_prefix("~\\").filter(|_| cfg!(windows)) {
        remainder
    } else {
        return Ok(PathBuf::from(path));
    };

    let home_directory = home_directory.ok_or_else(|| LoggerError::PathResolutionFailed {
        path: path.to_string(),
    })?;

    Ok(home_directory.join(remainder))
}

/// Creates the directory `path` lives in, along with any missing ancestors.
pub fn ensure_parent_directory(path: &Path) -> Result<(), LoggerError> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return Ok(());
    };

    fs::create_dir_all(parent).map_err(|source| LoggerError::DirectoryCreateFailed {
        path: parent.to_path_buf(),
        source,
    })
}
