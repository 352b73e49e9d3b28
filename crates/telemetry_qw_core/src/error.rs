use std::path::PathBuf;

use thiserror::Error;

/// A rejected stack parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised while loading stack parameters from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read stack parameters at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse stack parameters at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid stack parameters: {0}")]
    Invalid(#[from] ValidationError),
}

/// Errors raised while loading the index config document.
#[derive(Debug, Error)]
pub enum IndexConfigError {
    #[error("failed to read index config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse index config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("index config at {path} must be a YAML mapping")]
    NotAMapping { path: PathBuf },
    #[error("index config at {path} is missing required field `index_id`")]
    MissingIndexId { path: PathBuf },
    #[error("index config at {path} has an invalid `index_id`: {reason}")]
    InvalidIndexId { path: PathBuf, reason: String },
}

/// Errors raised while staging a local file or directory as an asset.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset source {path} does not exist")]
    MissingSource { path: PathBuf },
    #[error("failed to read asset source {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to package asset directory {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// Any failure that aborts synthesis. Nothing is declared when one is returned.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    IndexConfig(#[from] IndexConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}
