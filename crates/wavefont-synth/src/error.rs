//! Error types for catalog construction and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building a [`Catalog`](crate::Catalog).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A sample holds no frames
    #[error("sample '{name}' contains no frames")]
    EmptySample {
        /// Name of the offending sample.
        name: String,
    },

    /// A sample declares a zero sample rate
    #[error("sample '{name}' has a zero sample rate")]
    ZeroSampleRate {
        /// Name of the offending sample.
        name: String,
    },

    /// An instrument zone references a sample that was never added
    #[error("instrument '{instrument}' references unknown sample #{sample}")]
    UnknownSample {
        /// Name of the referencing instrument.
        instrument: String,
        /// Index that failed to resolve.
        sample: usize,
    },

    /// A preset zone references an instrument that was never added
    #[error("preset '{preset}' references unknown instrument #{instrument}")]
    UnknownInstrument {
        /// Name of the referencing preset.
        preset: String,
        /// Index that failed to resolve.
        instrument: usize,
    },

    /// A key or velocity range has its bounds reversed or exceeds 127
    #[error("invalid range {lo}..={hi} in '{owner}'")]
    InvalidRange {
        /// Name of the preset or instrument that declared the range.
        owner: String,
        /// Lower bound.
        lo: u8,
        /// Upper bound.
        hi: u8,
    },

    /// Source data could not be decoded
    #[error("malformed patch bank: {0}")]
    Malformed(String),
}

impl CatalogError {
    /// Create a malformed-source error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        CatalogError::Malformed(reason.into())
    }
}

/// Errors that can occur while loading or saving an
/// [`EngineConfig`](crate::EngineConfig).
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

    /// Failed to create a directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
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

    /// A setting is outside its legal range
    #[error("invalid setting '{field}': {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Description of why the value is invalid.
        reason: String,
    },
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

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid setting error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
