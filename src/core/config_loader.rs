// src/core/config_loader.rs

//! # Config Loader
//!
//! Loads the optional `argfan.toml`. A missing default file is not an error; a
//! missing file named explicitly with `/config-PATH` is.

use crate::core::paths::{self, PathError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Could not read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// The user's persistent launcher defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LauncherConfig {
    /// Never ask for confirmation.
    pub always_yes: bool,
    /// The minimum quiet level.
    pub always_quiet: u8,
    /// Always run through the platform shell.
    pub always_shell: bool,
    /// Launcher flags prepended to every command line (e.g. `["/echo"]`).
    pub default_arguments: Vec<String>,
}

impl LauncherConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Loads the config from `explicit_path`, or from the default location.
pub fn load_config(explicit_path: Option<&str>) -> Result<LauncherConfig, ConfigError> {
    let path = match explicit_path {
        Some(path) => paths::expand_user_path(path)?,
        None => {
            let path = paths::get_config_file_path()?;
            if !path.is_file() {
                log::debug!("No config file at '{}'; using defaults.", path.display());
                return Ok(LauncherConfig::default());
            }
            path
        }
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = LauncherConfig::from_toml_str(&content, &path)?;
    log::debug!("Loaded config from '{}': {:?}", path.display(), config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parses_every_key() {
        let config = LauncherConfig::from_toml_str(
            "always_yes = true\nalways_quiet = 2\nalways_shell = true\ndefault_arguments = [\"/echo\"]\n",
            Path::new("argfan.toml"),
        )
        .unwrap();
        assert!(config.always_yes);
        assert_eq!(config.always_quiet, 2);
        assert!(config.always_shell);
        assert_eq!(config.default_arguments, vec!["/echo"]);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config = LauncherConfig::from_toml_str("", Path::new("argfan.toml")).unwrap();
        assert_eq!(config, LauncherConfig::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = LauncherConfig::from_toml_str("always_no = true", Path::new("argfan.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "always_quiet = 1").unwrap();
        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.always_quiet, 1);
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = load_config(missing.to_str()).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
