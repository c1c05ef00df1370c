//! Error types for sw-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for sw-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sw-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid path format
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Listing call failure (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Storage client/session setup failure (fatal, nothing can be listed)
    #[error("Client error: {0}")]
    Client(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_) => 2,                // UsageError
            Error::Config(_) => 2,                     // UsageError
            Error::Network(_) | Error::Client(_) => 3, // NetworkError
            _ => 1,                                    // GeneralError
        }
    }

    /// Whether retrying the failed operation can ever succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_))
    }
}
