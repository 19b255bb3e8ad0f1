// src/core/paths.rs

use crate::constants::{CONFIG_DIR_NAME, CONFIG_FILENAME, SCRIPTS_DIR_NAME};
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

lazy_static! {
    static ref ARGFAN_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not expand path '{path}': {message}")]
    Expansion { path: String, message: String },
}

/// Returns the path to the argfan configuration directory (`~/.config/argfan`).
///
/// The directory is not created; the launcher only ever reads from it.
/// The result is cached after the first call.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = ARGFAN_CONFIG_DIR
        .lock()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(CONFIG_DIR_NAME);
    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// Returns the path of the default `argfan.toml`.
pub fn get_config_file_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

/// Returns the directory searched for script hooks given by a relative path.
pub fn get_scripts_dir() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(SCRIPTS_DIR_NAME))
}

/// Expands `~` and environment variables in a user-supplied path.
pub fn expand_user_path(path: &str) -> Result<PathBuf, PathError> {
    shellexpand::full(path)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| PathError::Expansion {
            path: path.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_user_path_leaves_plain_paths_alone() {
        assert_eq!(
            expand_user_path("lists/hosts.txt").unwrap(),
            PathBuf::from("lists/hosts.txt")
        );
    }

    #[test]
    fn test_expand_user_path_reports_missing_variables() {
        let err = expand_user_path("$ARGFAN_TEST_SURELY_UNSET_VARIABLE/x").unwrap_err();
        assert!(matches!(err, PathError::Expansion { .. }));
    }

    #[test]
    fn test_config_file_lives_in_config_dir() {
        if let (Ok(dir), Ok(file)) = (get_config_dir(), get_config_file_path()) {
            assert_eq!(file.parent(), Some(dir.as_path()));
            assert!(dir.ends_with(CONFIG_DIR_NAME));
        }
    }
}
