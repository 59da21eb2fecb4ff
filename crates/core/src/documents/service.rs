//! Checklist operations on a case.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::checklist::DocumentChecklist;
use super::error::DocumentError;
use super::types::{
    Completeness, DocumentKind, DocumentStatus, DocumentUpload, ExportMode, RegionModeMapping,
};
use crate::clock::Clock;
use crate::validation;
use crate::workflow::capability::{Capability, CapabilityMap, CapabilitySet, caps};
use crate::workflow::case::ExportCase;
use crate::workflow::error::WorkflowError;
use crate::workflow::types::{Caller, CaseStatus};

/// Who may do what with checklist documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPolicy {
    /// May select the export mode.
    pub select_mode: CapabilitySet,
    /// May upload documents.
    pub upload: CapabilitySet,
    /// May verify or reject uploads.
    pub review: CapabilitySet,
    /// May store region-to-mode mappings.
    pub configure_regions: CapabilitySet,
}

impl Default for DocumentPolicy {
    fn default() -> Self {
        Self {
            select_mode: caps(&[Capability::Exporter]),
            upload: caps(&[Capability::Exporter]),
            review: caps(&[
                Capability::QualityAuthority,
                Capability::ExporterBank,
                Capability::NationalBank,
                Capability::ExportCustoms,
            ]),
            configure_regions: caps(&[Capability::RegistryAdmin, Capability::QualityAuthority]),
        }
    }
}

/// Outcome of a mode selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeSelection {
    /// The case with its checklist initialized.
    pub case: ExportCase,
    /// Mode recommended for the region.
    pub recommended: ExportMode,
}

impl ModeSelection {
    /// Returns true if the chosen mode matches the recommendation.
    #[must_use]
    pub fn follows_recommendation(&self) -> bool {
        self.case.export_mode == Some(self.recommended)
    }
}

/// Document state of one case, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStatusView {
    /// The case.
    pub export_id: String,
    /// Selected mode.
    pub mode: Option<ExportMode>,
    /// Current checklist.
    pub checklist: Option<DocumentChecklist>,
    /// Every upload in order.
    pub uploads: Vec<DocumentUpload>,
    /// True if nothing required is missing.
    pub is_complete: bool,
    /// Required documents not yet uploaded or verified.
    pub missing_documents: Vec<DocumentKind>,
}

/// Applies checklist operations to cases.
///
/// Like the workflow engine, every method takes the current case and returns
/// the next one; nothing is written until the caller commits it.
#[derive(Clone)]
pub struct DocumentService {
    capabilities: Arc<CapabilityMap>,
    policy: DocumentPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl DocumentService {
    /// Create a document service.
    #[must_use]
    pub fn new(capabilities: Arc<CapabilityMap>, policy: DocumentPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            capabilities,
            policy,
            clock,
        }
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> &DocumentPolicy {
        &self.policy
    }

    fn authorize(
        &self,
        caller: &Caller,
        allowed: &CapabilitySet,
        operation: &str,
    ) -> Result<(), WorkflowError> {
        if self.capabilities.permits(&caller.organization, allowed) {
            Ok(())
        } else {
            Err(WorkflowError::unauthorized(
                caller.organization.as_str(),
                operation,
            ))
        }
    }

    /// Validate a region mapping and check that `caller` may store it.
    pub fn check_region_mapping(
        &self,
        caller: &Caller,
        mapping: &RegionModeMapping,
    ) -> Result<(), WorkflowError> {
        self.authorize(caller, &self.policy.configure_regions, "STORE_REGION_MODE")?;
        validation::validate_region(&mapping.region)?;
        if let Some(notes) = &mapping.notes {
            validation::validate_free_text("notes", notes)?;
        }
        Ok(())
    }

    /// Select the export mode and initialize the checklist.
    ///
    /// # Arguments
    /// * `case` - Must be `DRAFT` with no checklist yet
    /// * `mode` - Chosen mode; may differ from `recommended`
    /// * `region` - Declared growing region
    /// * `recommended` - Recommendation for the region
    ///
    /// # Errors
    /// * `Unauthorized` if the caller may not select modes
    /// * `Document(ModeSelectionClosed)` outside of `DRAFT`
    /// * `Document(ChecklistAlreadyInitialized)` on a second selection
    pub fn select_mode(
        &self,
        case: &ExportCase,
        caller: &Caller,
        mode: ExportMode,
        region: &str,
        recommended: ExportMode,
    ) -> Result<ModeSelection, WorkflowError> {
        self.authorize(caller, &self.policy.select_mode, "SELECT_EXPORT_MODE")?;
        validation::validate_region(region)?;
        if case.status != CaseStatus::Draft {
            return Err(DocumentError::ModeSelectionClosed {
                status: case.status,
            }
            .into());
        }
        if case.document_checklist.is_some() {
            return Err(DocumentError::ChecklistAlreadyInitialized {
                case_id: case.export_id.to_string(),
            }
            .into());
        }

        let now = self.clock.now();
        let mut next = case.clone();
        next.export_mode = Some(mode);
        next.origin_region = Some(region.to_string());
        next.mode_selected_at = Some(now);
        next.mode_selected_by = Some(caller.identity.clone());
        next.document_checklist = Some(DocumentChecklist::for_mode(mode));
        next.document_uploads.clear();
        next.updated_at = now;
        next.updated_by.clone_from(&caller.organization);
        Ok(ModeSelection {
            case: next,
            recommended,
        })
    }

    /// Record an upload. The upload is kept even when the kind is not required.
    pub fn upload(
        &self,
        case: &ExportCase,
        caller: &Caller,
        kind: DocumentKind,
        cid: &str,
    ) -> Result<ExportCase, WorkflowError> {
        self.authorize(caller, &self.policy.upload, "UPLOAD_DOCUMENT")?;
        validation::validate_document_reference(cid)?;

        let mut next = case.clone();
        let checklist = checklist_mut(&mut next)?;
        checklist.record_upload(kind);

        let now = self.clock.now();
        next.document_uploads.push(DocumentUpload {
            document_type: kind,
            cid: cid.to_string(),
            uploaded_by: caller.identity.clone(),
            uploaded_at: now,
            status: DocumentStatus::Uploaded,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
        });
        next.updated_at = now;
        next.updated_by.clone_from(&caller.organization);
        Ok(next)
    }

    /// Verify the most recent upload of `kind`.
    ///
    /// # Errors
    /// * `Document(NoUpload)` if nothing was uploaded
    /// * `Document(NotReviewable)` if the latest upload was rejected
    pub fn verify(
        &self,
        case: &ExportCase,
        caller: &Caller,
        kind: DocumentKind,
    ) -> Result<ExportCase, WorkflowError> {
        self.authorize(caller, &self.policy.review, "VERIFY_DOCUMENT")?;

        let mut next = case.clone();
        checklist_mut(&mut next)?;
        let now = self.clock.now();
        let upload = latest_upload_mut(&mut next, kind)?;
        if !upload.status.is_satisfied() {
            return Err(DocumentError::NotReviewable {
                kind,
                status: upload.status,
            }
            .into());
        }
        upload.status = DocumentStatus::Verified;
        upload.reviewed_by = Some(caller.identity.clone());
        upload.reviewed_at = Some(now);
        upload.rejection_reason = None;

        checklist_mut(&mut next)?.record_verification(kind);
        next.updated_at = now;
        next.updated_by.clone_from(&caller.organization);
        Ok(next)
    }

    /// Reject the most recent upload of `kind`. Verified uploads may be rejected.
    pub fn reject(
        &self,
        case: &ExportCase,
        caller: &Caller,
        kind: DocumentKind,
        reason: &str,
    ) -> Result<ExportCase, WorkflowError> {
        self.authorize(caller, &self.policy.review, "REJECT_DOCUMENT")?;
        validation::validate_reason(reason)?;

        let mut next = case.clone();
        checklist_mut(&mut next)?;
        let now = self.clock.now();
        let upload = latest_upload_mut(&mut next, kind)?;
        upload.status = DocumentStatus::Rejected;
        upload.reviewed_by = Some(caller.identity.clone());
        upload.reviewed_at = Some(now);
        upload.rejection_reason = Some(reason.to_string());

        checklist_mut(&mut next)?.record_rejection(kind);
        next.updated_at = now;
        next.updated_by.clone_from(&caller.organization);
        Ok(next)
    }

    /// Completeness of `case`'s checklist.
    pub fn completeness(case: &ExportCase) -> Result<Completeness, WorkflowError> {
        case.completeness().ok_or_else(|| {
            DocumentError::ChecklistNotInitialized {
                case_id: case.export_id.to_string(),
            }
            .into()
        })
    }

    /// Document state of `case`. Cases without a checklist report incomplete.
    #[must_use]
    pub fn status_view(case: &ExportCase) -> DocumentStatusView {
        let completeness = case.completeness().unwrap_or(Completeness {
            is_complete: false,
            missing_docs: Vec::new(),
        });
        DocumentStatusView {
            export_id: case.export_id.to_string(),
            mode: case.export_mode,
            checklist: case.document_checklist.clone(),
            uploads: case.document_uploads.clone(),
            is_complete: completeness.is_complete,
            missing_documents: completeness.missing_docs,
        }
    }
}

fn checklist_mut(case: &mut ExportCase) -> Result<&mut DocumentChecklist, DocumentError> {
    let case_id = case.export_id.to_string();
    case.document_checklist
        .as_mut()
        .ok_or(DocumentError::ChecklistNotInitialized { case_id })
}

fn latest_upload_mut(
    case: &mut ExportCase,
    kind: DocumentKind,
) -> Result<&mut DocumentUpload, DocumentError> {
    case.document_uploads
        .iter_mut()
        .rev()
        .find(|upload| upload.document_type == kind)
        .ok_or(DocumentError::NoUpload { kind })
}
