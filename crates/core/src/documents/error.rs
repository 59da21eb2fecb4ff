//! Document checklist error types.

use exportflow_shared::ErrorKind;
use thiserror::Error;

use super::types::{DocumentKind, DocumentStatus};
use crate::workflow::types::CaseStatus;

/// Errors raised by checklist operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Document activity before an export mode was selected.
    #[error("document checklist not initialized for {case_id}; select an export mode first")]
    ChecklistNotInitialized {
        /// The case.
        case_id: String,
    },

    /// A second mode selection on the same case.
    #[error("export mode already selected for {case_id}")]
    ChecklistAlreadyInitialized {
        /// The case.
        case_id: String,
    },

    /// Mode selection outside of `DRAFT`.
    #[error("can only select mode for DRAFT exports, current status: {status}")]
    ModeSelectionClosed {
        /// The case's current status.
        status: CaseStatus,
    },

    /// Review of a document that was never uploaded.
    #[error("no upload found for document {kind}")]
    NoUpload {
        /// The document kind.
        kind: DocumentKind,
    },

    /// Verification of an upload that is not awaiting review.
    #[error("document {kind} cannot be verified from status {status}")]
    NotReviewable {
        /// The document kind.
        kind: DocumentKind,
        /// The latest upload's status.
        status: DocumentStatus,
    },
}

impl DocumentError {
    /// Classifies the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ChecklistNotInitialized { .. } => ErrorKind::Validation,
            Self::ChecklistAlreadyInitialized { .. } => ErrorKind::AlreadyExists,
            Self::ModeSelectionClosed { .. } | Self::NotReviewable { .. } => {
                ErrorKind::InvalidTransition
            }
            Self::NoUpload { .. } => ErrorKind::NotFound,
        }
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
            Self::ChecklistNotInitialized { .. } => "CHECKLIST_NOT_INITIALIZED",
            Self::ChecklistAlreadyInitialized { .. } => "MODE_ALREADY_SELECTED",
            Self::ModeSelectionClosed { .. } => "MODE_SELECTION_CLOSED",
            Self::NoUpload { .. } => "DOCUMENT_NOT_UPLOADED",
            Self::NotReviewable { .. } => "DOCUMENT_NOT_REVIEWABLE",
        }
    }
}
