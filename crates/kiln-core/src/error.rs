//! Error types for Kiln

use crate::id::AssetId;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Kiln operations
#[derive(Debug, Error)]
pub enum KilnError {
    #[error("Source unreadable: {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Destination unwritable: {path}: {source}")]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("No converter registered for {0}")]
    NoConverterForSuffix(PathBuf),

    #[error("Suffix '{suffix}' is already claimed by converter '{owner}'")]
    DuplicateSuffix { suffix: String, owner: String },

    #[error("Toolchain unavailable: {0}")]
    ToolchainUnavailable(String),

    #[error("Build process failed with exit code {0}")]
    BuildProcessFailed(i32),

    #[error("A build is already in progress for {0}")]
    BuildInProgress(String),

    #[error("Settings for {0} are read-only")]
    ReadOnlySettings(PathBuf),

    #[error("Unknown asset identity {0}")]
    UnknownIdentity(AssetId),

    #[error("Settings error: {0}")]
    SettingsError(String),

    #[error("Resource codec error: {0}")]
    CodecError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

/// Result type alias for Kiln operations
pub type Result<T> = std::result::Result<T, KilnError>;

impl From<toml::de::Error> for KilnError {
    fn from(err: toml::de::Error) -> Self {
        KilnError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for KilnError {
    fn from(err: toml::ser::Error) -> Self {
        KilnError::TomlSerError(err.to_string())
    }
}

impl From<bincode::Error> for KilnError {
    fn from(err: bincode::Error) -> Self {
        KilnError::CodecError(err.to_string())
    }
}
