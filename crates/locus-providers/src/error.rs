//! Provider construction errors.

use std::path::PathBuf;
use thiserror::Error;

/// Error raised while loading a file-backed provider.
#[derive(Debug, Error)]
pub enum FileProviderError {
    /// Failed to read the file.
    #[error("failed to read configuration file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the file as TOML.
    #[error("failed to parse configuration file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl FileProviderError {
    /// Creates a read failure.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse failure.
    pub fn parse_toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseToml {
            path: path.into(),
            source,
        }
    }
}
