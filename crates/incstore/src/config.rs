use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("store location is missing")]
    LocationMissing,

    #[error("store location '{path}' is not a valid file location: {reason}")]
    LocationInvalid { path: PathBuf, reason: &'static str },

    #[error("store location '{0}' conflicts with in_memory = true")]
    Conflicting(PathBuf),

    #[error("failed to read config file '{path}': {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to parse config: {0}")]
    Parse(String),
}

///
/// Durability
///
/// Commit durability applied to every write transaction.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    #[default]
    Immediate,
    Eventual,
    None,
}

///
/// StoreConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Store file; required unless `in_memory` is set.
    pub path: Option<PathBuf>,
    pub in_memory: bool,
    /// Engine page cache size in bytes.
    pub cache_size: Option<usize>,
    pub durability: Durability,
}

impl StoreConfig {
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_durability(mut self, durability: Durability) -> Self {
        self.durability = durability;
        self
    }

    #[must_use]
    pub const fn with_cache_size(mut self, bytes: usize) -> Self {
        self.cache_size = Some(bytes);
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        Self::from_toml_str(&source)
    }

    /// Check the store location before the engine is opened.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.path, self.in_memory) {
            (Some(path), true) => Err(ConfigError::Conflicting(path.clone())),
            (None, true) => Ok(()),
            (None, false) => Err(ConfigError::LocationMissing),
            (Some(path), false) => validate_file_location(path),
        }
    }
}

fn validate_file_location(path: &Path) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::LocationInvalid {
        path: path.to_path_buf(),
        reason,
    };

    if path.as_os_str().is_empty() {
        return Err(ConfigError::LocationMissing);
    }
    if path.file_name().is_none() {
        return Err(invalid("path has no file name"));
    }
    if path.is_dir() {
        return Err(invalid("path is a directory"));
    }

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(invalid("parent directory does not exist"))
        }
        _ => Ok(()),
    }
}
