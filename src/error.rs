//! Error taxonomy for patch transactions.
//!
//! Every failure a caller can see is a `PatchError`. Each variant maps to an
//! HTTP-style status via [`PatchError::status`] so the same classification
//! works for the CLI exit code and for JSON error responses.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a patch transaction or of the pure section patcher.
#[derive(Debug, Error)]
pub enum PatchError {
    /// One or more required request fields were absent.
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<&'static str>),

    #[error("Invalid section path '{0}': expected 'key' or 'parent.child'")]
    InvalidSectionPath(String),

    #[error("Invalid section data: {0}")]
    InvalidSectionData(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The target document is empty or whitespace-only.
    #[error("Configuration file is empty or contains only whitespace; refusing to patch it")]
    EmptyDocument,

    /// A `layout` entry does not have the widget shape.
    #[error("Invalid widget at layout[{index}]: {reason}")]
    InvalidWidget { index: usize, reason: String },

    /// The patched output fell below the sanity floor.
    #[error(
        "Generated YAML is suspiciously short ({chars} non-whitespace characters); \
         this indicates a bug in the section patcher, the file was not written"
    )]
    OutputTooShort { chars: usize },

    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize nested value: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

impl PatchError {
    /// Classify an I/O error on `path`, separating the not-found kind.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            PatchError::NotFound { path }
        } else {
            PatchError::Io { path, source }
        }
    }

    /// HTTP-style status code for this failure.
    pub fn status(&self) -> u16 {
        match self {
            PatchError::MissingParameters(_)
            | PatchError::InvalidSectionPath(_)
            | PatchError::InvalidSectionData(_)
            | PatchError::InvalidRequest(_)
            | PatchError::EmptyDocument
            | PatchError::InvalidWidget { .. } => 400,
            PatchError::NotFound { .. } => 404,
            PatchError::OutputTooShort { .. }
            | PatchError::Io { .. }
            | PatchError::Serialize(_) => 500,
        }
    }
}

/// Failure while taking a backup. Never surfaced to callers, only logged.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure loading the tool's own configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
