//! Document checklist repository.
//!
//! Checklist state lives inside the case record, so every checklist write goes
//! through [`CaseRepository::mutate`]. Region-to-mode mappings are separate
//! records under `REGION-MODE-{region}`.

use exportflow_core::documents::{
    Completeness, DocumentKind, DocumentService, DocumentStatusView, ExportMode, ModeSelection,
    RegionModeMapping,
};
use exportflow_core::keys;
use exportflow_core::validation;
use exportflow_core::workflow::{ExportCase, WorkflowError};
use tracing::{info, warn};

use super::cases::{CaseRepository, Mutation};
use crate::identity::IdentityProvider;
use crate::store::RecordStore;
use crate::transaction::Transaction;

/// Repository for checklist operations and region mappings.
#[derive(Debug)]
pub struct DocumentRepository<S: RecordStore + ?Sized> {
    cases: CaseRepository<S>,
    service: DocumentService,
}

impl<S: RecordStore + ?Sized> DocumentRepository<S> {
    /// Creates a new document repository.
    #[must_use]
    pub fn new(cases: CaseRepository<S>, service: DocumentService) -> Self {
        Self { cases, service }
    }

    /// Stores or replaces the recommended mode for a region.
    pub fn store_region_mapping(
        &self,
        identity: &dyn IdentityProvider,
        mapping: &RegionModeMapping,
    ) -> Result<(), WorkflowError> {
        let caller = identity.caller()?;
        self.service.check_region_mapping(&caller, mapping)?;

        let bytes = serde_json::to_vec(mapping)
            .map_err(|e| WorkflowError::Store(format!("mapping encoding failed: {e}")))?;
        let mut tx = Transaction::begin(self.cases.store().as_ref());
        tx.put_state(&keys::region_mode_key(&mapping.region), bytes)?;
        tx.commit()?;

        info!(
            region = %mapping.region,
            mode = %mapping.recommended_mode,
            organization = %caller.organization,
            "Region mode mapping stored"
        );
        Ok(())
    }

    /// The stored mapping for a region, if any.
    pub fn region_mapping(&self, region: &str) -> Result<Option<RegionModeMapping>, WorkflowError> {
        validation::validate_region(region)?;
        let key = keys::region_mode_key(region);
        self.cases
            .store()
            .read(&key)?
            .map(|entry| {
                serde_json::from_slice(&entry.value).map_err(|e| WorkflowError::MalformedRecord {
                    key: key.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Recommended mode for a region; vertical when no mapping exists.
    pub fn recommended_mode(&self, region: &str) -> Result<ExportMode, WorkflowError> {
        Ok(self
            .region_mapping(region)?
            .map(|mapping| mapping.recommended_mode)
            .unwrap_or_default())
    }

    /// Selects the export mode of a `DRAFT` case and initializes its checklist.
    ///
    /// A choice that differs from the region's recommendation is allowed and
    /// logged.
    pub fn select_mode(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
        mode: ExportMode,
        region: &str,
    ) -> Result<ModeSelection, WorkflowError> {
        let recommended = self.recommended_mode(region)?;
        let selection = self.cases.mutate(identity, case_id, |case, caller| {
            let selection = self
                .service
                .select_mode(case, caller, mode, region, recommended)?;
            Ok(Mutation::quiet(selection.case.clone(), selection))
        })?;

        if !selection.follows_recommendation() {
            warn!(
                case_id = %case_id,
                region = %region,
                selected = %mode,
                recommended = %recommended,
                "Export mode differs from region recommendation"
            );
        }
        info!(case_id = %case_id, mode = %mode, "Export mode selected");
        Ok(selection)
    }

    /// Records an upload.
    pub fn upload(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
        kind: DocumentKind,
        cid: &str,
    ) -> Result<ExportCase, WorkflowError> {
        let case = self.cases.mutate(identity, case_id, |case, caller| {
            let next = self.service.upload(case, caller, kind, cid)?;
            Ok(Mutation::quiet(next.clone(), next))
        })?;
        info!(case_id = %case_id, document = %kind, "Document uploaded");
        Ok(case)
    }

    /// Verifies the latest upload of a kind.
    pub fn verify(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
        kind: DocumentKind,
    ) -> Result<ExportCase, WorkflowError> {
        let case = self.cases.mutate(identity, case_id, |case, caller| {
            let next = self.service.verify(case, caller, kind)?;
            Ok(Mutation::quiet(next.clone(), next))
        })?;
        info!(case_id = %case_id, document = %kind, "Document verified");
        Ok(case)
    }

    /// Rejects the latest upload of a kind.
    pub fn reject(
        &self,
        identity: &dyn IdentityProvider,
        case_id: &str,
        kind: DocumentKind,
        reason: &str,
    ) -> Result<ExportCase, WorkflowError> {
        let case = self.cases.mutate(identity, case_id, |case, caller| {
            let next = self.service.reject(case, caller, kind, reason)?;
            Ok(Mutation::quiet(next.clone(), next))
        })?;
        info!(case_id = %case_id, document = %kind, "Document rejected");
        Ok(case)
    }

    /// Completeness of a case's checklist.
    ///
    /// # Errors
    /// * `Document(ChecklistNotInitialized)` if no mode was selected
    pub fn completeness(&self, case_id: &str) -> Result<Completeness, WorkflowError> {
        DocumentService::completeness(&self.cases.get(case_id)?)
    }

    /// Mode, checklist, uploads, and completeness of a case.
    pub fn status_view(&self, case_id: &str) -> Result<DocumentStatusView, WorkflowError> {
        Ok(DocumentService::status_view(&self.cases.get(case_id)?))
    }
}
