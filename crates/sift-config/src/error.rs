//! Error types for sift configuration.

use std::{io, path::PathBuf};

use sift_query::SchemaError;
use thiserror::Error;
use toml::{de, ser};

/// Errors that can occur when loading or processing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// A setting has a value sift cannot work with.
    #[error("invalid setting {key} in {path}: {message}")]
    InvalidSetting {
        /// Path to the file defining the setting.
        path: PathBuf,
        /// Dotted key of the setting.
        key: &'static str,
        /// What is wrong with the value.
        message: &'static str,
    },

    /// The field table does not form a valid schema.
    #[error("invalid field table: {0}")]
    Schema(#[from] SchemaError),

    /// Failed to serialize the effective settings.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] ser::Error),

    /// Failed to determine home directory.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}
