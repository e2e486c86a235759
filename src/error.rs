//! Error types for SIWARAS

use thiserror::Error;

/// Result type alias for SIWARAS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the application
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Interactive prompt error: {0}")]
    Dialoguer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operation failed: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        Error::Dialoguer(err.to_string())
    }
}

/// Failures of a remote API call.
///
/// Cloneable because every caller joined on a coalesced request receives
/// its own copy of the same settlement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,

    #[error("HTTP error {status}")]
    Http { status: u16 },

    #[error("API error: {message}")]
    Api { message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Network("Failed to connect to API".to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Session storage errors. Cache writes recover from these locally.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage quota exceeded ({needed} bytes needed, quota is {quota})")]
    QuotaExceeded { needed: u64, quota: u64 },

    #[error("Storage database error: {0}")]
    Sqlite(String),

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Could not determine the user cache directory")]
    NoCacheDir,

    #[error("Storage lock poisoned")]
    Poisoned,
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Sqlite(err.to_string())
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Run `siwaras config init` to create one.")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Session and sign-in errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not logged in. Run `siwaras login <USERNAME>` first.")]
    NotLoggedIn,

    #[error("Login rejected: {0}")]
    Rejected(String),
}
