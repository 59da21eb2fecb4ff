//! Workflow error types for the export case lifecycle.
//!
//! Every failure a workflow operation can surface is a [`WorkflowError`];
//! [`WorkflowError::kind`] classifies it for the invoking boundary.

use exportflow_shared::ErrorKind;
use thiserror::Error;

use crate::documents::DocumentError;
use crate::validation::ValidationError;
use crate::workflow::table::TableError;
use crate::workflow::types::{CaseStatus, Operation};

/// Errors that can occur during workflow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// Malformed or out-of-range input.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Caller organization is not permitted to perform the operation.
    #[error("Organization {organization} is not authorized to {operation}")]
    Unauthorized {
        /// The caller's organization.
        organization: String,
        /// The attempted operation.
        operation: String,
    },

    /// The case's status does not match the operation's source status.
    #[error("Invalid status transition from {from} to {to} via {operation}")]
    InvalidTransition {
        /// The current status.
        from: CaseStatus,
        /// The attempted target status.
        to: CaseStatus,
        /// The requested operation.
        operation: Operation,
    },

    /// Only draft cases can be withdrawn.
    #[error("Cannot withdraw export in status {status}; only DRAFT exports can be withdrawn")]
    NotWithdrawable {
        /// The current status.
        status: CaseStatus,
    },

    /// The operation has no edge in the active transition table.
    #[error("Operation {0} is not supported by the active transition table")]
    UnsupportedOperation(Operation),

    /// Unknown case, user, or index entry.
    #[error("{entity} {id} not found")]
    NotFound {
        /// What was looked up.
        entity: &'static str,
        /// The identifier used.
        id: String,
    },

    /// Duplicate create or uniqueness violation.
    #[error("{entity} {id} already exists")]
    AlreadyExists {
        /// What was created.
        entity: &'static str,
        /// The conflicting identifier.
        id: String,
    },

    /// Document checklist failure.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A concurrent writer changed a key this operation read.
    #[error("Concurrent modification of {key}; retry from a fresh read")]
    StoreConflict {
        /// The key whose version changed.
        key: String,
    },

    /// A stored value could not be deserialized.
    #[error("Malformed record at {key}: {reason}")]
    MalformedRecord {
        /// The key holding the value.
        key: String,
        /// Deserialization failure.
        reason: String,
    },

    /// The store backend failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Missing identity or invalid workflow configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl WorkflowError {
    /// Create a not found error for a case.
    #[must_use]
    pub fn case_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "export",
            id: id.into(),
        }
    }

    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(organization: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unauthorized {
            organization: organization.into(),
            operation: operation.into(),
        }
    }

    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidTransition { .. }
            | Self::NotWithdrawable { .. }
            | Self::UnsupportedOperation(_) => ErrorKind::InvalidTransition,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Document(err) => err.kind(),
            Self::StoreConflict { .. } => ErrorKind::StoreConflict,
            Self::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Self::Store(_) => ErrorKind::Internal,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Returns true only for errors a caller should retry from a fresh read.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.error_code(),
            Self::NotWithdrawable { .. } => "NOT_WITHDRAWABLE",
            Self::UnsupportedOperation(_) => "UNSUPPORTED_OPERATION",
            Self::Document(err) => err.error_code(),
            other => other.kind().error_code(),
        }
    }
}

impl From<TableError> for WorkflowError {
    fn from(err: TableError) -> Self {
        Self::Configuration(err.to_string())
    }
}
