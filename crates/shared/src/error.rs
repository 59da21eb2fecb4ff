//! Application-wide error classification.
//!
//! Every layer keeps its own `thiserror` enum; this module is the common
//! vocabulary they map onto so the invoking boundary can decide on retries
//! and responses without knowing which layer failed.

use serde::Serialize;
use std::fmt;

/// Classification of every failure a workflow operation can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,
    /// Caller organization not permitted for the attempted operation.
    Unauthorized,
    /// Current status does not match the operation's required source status.
    InvalidTransition,
    /// Unknown case, user, or index entry.
    NotFound,
    /// Duplicate create or uniqueness violation.
    AlreadyExists,
    /// Concurrent-write rejection from the underlying store.
    StoreConflict,
    /// Stored payload could not be deserialized.
    MalformedRecord,
    /// Missing identity provider or invalid workflow configuration.
    Configuration,
    /// Store backend failure.
    Internal,
}

impl ErrorKind {
    /// Returns true only for errors a caller should retry from a fresh read.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreConflict)
    }

    /// Returns the HTTP-style status code for this error kind.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Unauthorized => 403,
            Self::NotFound => 404,
            Self::AlreadyExists | Self::StoreConflict | Self::InvalidTransition => 409,
            Self::MalformedRecord => 422,
            Self::Configuration | Self::Internal => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::StoreConflict => "STORE_CONFLICT",
            Self::MalformedRecord => "MALFORMED_RECORD",
            Self::Configuration => "CONFIGURATION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_code())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
