//! Unified error type.

use crate::method::Method;

/// The error type returned by tollgate's fallible operations.
///
/// These are build-time and infrastructure failures: a bad route
/// declaration, a malformed config file. Per-request outcomes (404, 405,
/// validation failures) are values of [`Resolution`](crate::Resolution),
/// not `Error`s.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("route `{method} {pattern}` is already registered")]
    DuplicateRoute { method: Method, pattern: String },

    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid parameter `{field}`: {reason}")]
    InvalidSchema { field: String, reason: String },

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern { pattern: pattern.to_owned(), reason: reason.into() }
    }

    pub(crate) fn schema(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSchema { field: field.to_owned(), reason: reason.into() }
    }
}
