//! Error types for Lendkit.

use thiserror::Error;

/// Primary error type for all Lendkit operations.
///
/// API-level rejections are normalized into [`LendkitError::Api`] so callers
/// can branch on the HTTP status without parsing response bodies. Transport
/// failures stay [`LendkitError::Network`] — they signal an environment
/// problem, not a backend decision, and are never folded into `Api`.
#[derive(Error, Debug)]
pub enum LendkitError {
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl LendkitError {
    /// Create a normalized API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// The HTTP status of a normalized API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error came from the backend rejecting the request,
    /// as opposed to the request never completing.
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

impl From<toml::de::Error> for LendkitError {
    fn from(error: toml::de::Error) -> Self {
        Self::Store(error.to_string())
    }
}

impl From<toml::ser::Error> for LendkitError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Store(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, LendkitError>;
