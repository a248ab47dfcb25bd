//! Error types for configuration operations.

use lustre_core::{EngineError, ErrorKind};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, saving or applying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Failed to parse or serialize JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A parameter or effect combination was rejected
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Engine error category, for errors raised by validation.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ConfigError::Engine(e) => Some(e.kind()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_display() {
        let err = ConfigError::read_file("/a/b.toml", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to read file"), "got: {msg}");
        assert!(msg.contains("/a/b.toml"), "got: {msg}");
        assert!(err.source().is_some());
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn engine_errors_keep_their_kind() {
        let err: ConfigError =
            EngineError::invalid_parameter("compressor", "ratio", 0.5, "must be >= 1").into();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidParameter));
        assert!(err.to_string().contains("ratio"));
    }
}
