//! Workflow engine for export case state transitions.
//!
//! The engine is pure: it takes the current case, returns the next case, and
//! never touches storage. A failed call leaves the input untouched, so the
//! caller can simply drop the result and nothing is written.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::validation::{self, ValidationError};
use crate::workflow::capability::{Capability, CapabilityMap, CapabilitySet, caps};
use crate::workflow::case::{DocumentCategory, ExportCase, NewCase};
use crate::workflow::error::WorkflowError;
use crate::workflow::events::CaseEvent;
use crate::workflow::payload::TransitionPayload;
use crate::workflow::table::{TransitionRule, TransitionTable};
use crate::workflow::types::{Caller, CaseStatus, Operation};

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The case after the transition.
    pub case: ExportCase,
    /// Status before the transition.
    pub from: CaseStatus,
    /// Status after the transition.
    pub to: CaseStatus,
    /// Version number of the appended document, if any.
    pub document_version: Option<u32>,
    /// Notification to publish once the write commits.
    pub event: CaseEvent,
}

/// Result of attaching a document outside of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// The case after the attachment.
    pub case: ExportCase,
    /// Version number assigned to the document.
    pub version: u32,
}

/// Applies the transition table to cases.
///
/// The table and capability map are immutable and shared; cloning an engine
/// is cheap.
#[derive(Clone)]
pub struct WorkflowEngine {
    table: Arc<TransitionTable>,
    capabilities: Arc<CapabilityMap>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("edges", &self.table.len())
            .field("organizations", &self.capabilities.len())
            .finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    /// Create an engine over an explicit table and capability map.
    #[must_use]
    pub fn new(
        table: Arc<TransitionTable>,
        capabilities: Arc<CapabilityMap>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            table,
            capabilities,
            clock,
        }
    }

    /// Create an engine with the standard table and capability map.
    #[must_use]
    pub fn standard(clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(TransitionTable::standard()),
            Arc::new(CapabilityMap::standard()),
            clock,
        )
    }

    /// The active transition table.
    #[must_use]
    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// The active capability map.
    #[must_use]
    pub fn capabilities(&self) -> &Arc<CapabilityMap> {
        &self.capabilities
    }

    /// The engine's clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current time according to the engine's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Check that `caller` holds at least one of `allowed`.
    ///
    /// # Errors
    /// * `WorkflowError::Unauthorized` naming the caller's organization and `operation`
    pub fn authorize(
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

    /// Check that `caller` may create cases.
    ///
    /// # Errors
    /// * `WorkflowError::Unauthorized` unless the caller holds the exporter capability
    pub fn authorize_create(&self, caller: &Caller) -> Result<(), WorkflowError> {
        self.authorize(caller, &caps(&[Capability::Exporter]), "CREATE")
    }

    /// Build a new case in `DRAFT`.
    ///
    /// Existence is not checked here; the repository rejects duplicates before
    /// writing.
    ///
    /// # Arguments
    /// * `caller` - Must hold the exporter capability
    /// * `input` - Structural fields, each validated
    ///
    /// # Returns
    /// The new case and its `CREATE` event.
    pub fn create_case(
        &self,
        caller: &Caller,
        input: NewCase,
    ) -> Result<(ExportCase, CaseEvent), WorkflowError> {
        self.authorize_create(caller)?;
        input.validate()?;

        let now = self.clock.now();
        let case = ExportCase {
            export_id: input.export_id,
            exporter_id: input.exporter_id,
            exporter_name: input.exporter_name,
            coffee_type: input.coffee_type,
            quantity: input.quantity,
            destination_country: input.destination_country,
            estimated_value: input.estimated_value,
            status: CaseStatus::Draft,
            created_at: now,
            updated_at: now,
            created_by: caller.organization.clone(),
            updated_by: caller.organization.clone(),
            fields: std::collections::BTreeMap::new(),
            documents: std::collections::BTreeMap::new(),
            export_mode: None,
            origin_region: None,
            mode_selected_at: None,
            mode_selected_by: None,
            document_checklist: None,
            document_uploads: Vec::new(),
        };
        let event = CaseEvent::created(case.export_id.clone(), now, caller.organization.as_str());
        Ok((case, event))
    }

    /// Apply `operation` to `case`.
    ///
    /// Checks run in a fixed order: the caller must hold some capability the
    /// operation could use anywhere in the table, then the case's status must
    /// have an edge for the operation, then the caller must hold that edge's
    /// capability, then the payload must validate.
    ///
    /// # Errors
    /// * `Unauthorized` if the caller cannot take this operation
    /// * `InvalidTransition` if the current status has no such edge
    /// * `UnsupportedOperation` if the table has no edge for the operation at all
    /// * `Validation` if the payload is incomplete or malformed
    pub fn apply(
        &self,
        case: &ExportCase,
        caller: &Caller,
        operation: Operation,
        payload: &TransitionPayload,
    ) -> Result<Transition, WorkflowError> {
        let candidates = self.table.capabilities_for(operation);
        if candidates.is_empty() {
            return Err(WorkflowError::UnsupportedOperation(operation));
        }
        self.authorize(caller, &candidates, operation.as_str())?;

        let rule = self.table.rule(case.status, operation).ok_or_else(|| {
            WorkflowError::InvalidTransition {
                from: case.status,
                to: self.table.target_of(operation).unwrap_or(case.status),
                operation,
            }
        })?;
        self.authorize(caller, &rule.allowed, operation.as_str())?;
        validate_payload(rule, payload)?;

        let now = self.clock.now();
        let mut next = case.clone();
        for field in &rule.clears {
            next.fields.remove(field);
        }
        next.fields
            .extend(payload.fields.iter().map(|(field, value)| (*field, value.clone())));
        if let Some(amendments) = &payload.amendments {
            amendments.apply_to(&mut next);
        }
        let document_version = match (rule.document, &payload.document) {
            (Some(category), Some(reference)) => Some(next.append_document(
                category,
                reference.clone(),
                caller.identity.clone(),
                now,
            )),
            _ => None,
        };
        next.status = rule.to;
        next.updated_at = now;
        next.updated_by.clone_from(&caller.organization);

        let event = CaseEvent::status_updated(
            next.export_id.clone(),
            rule.to,
            now,
            caller.organization.as_str(),
        );
        Ok(Transition {
            case: next,
            from: case.status,
            to: rule.to,
            document_version,
            event,
        })
    }

    /// Append a document version without changing status.
    ///
    /// Only holders of the category's owner capabilities may attach.
    pub fn attach_document(
        &self,
        case: &ExportCase,
        caller: &Caller,
        category: DocumentCategory,
        reference: &str,
    ) -> Result<Attachment, WorkflowError> {
        self.authorize(caller, &category.owners(), "ATTACH_DOCUMENT")?;
        validation::validate_document_reference(reference)?;

        let now = self.clock.now();
        let mut next = case.clone();
        let version = next.append_document(
            category,
            reference.to_string(),
            caller.identity.clone(),
            now,
        );
        next.updated_at = now;
        next.updated_by.clone_from(&caller.organization);
        Ok(Attachment {
            case: next,
            version,
        })
    }

    /// Mark a document version inactive. Versions are never removed.
    ///
    /// # Errors
    /// * `NotFound` if the version does not exist
    /// * `Validation` if it is already inactive
    pub fn deactivate_document(
        &self,
        case: &ExportCase,
        caller: &Caller,
        category: DocumentCategory,
        version: u32,
    ) -> Result<ExportCase, WorkflowError> {
        self.authorize(caller, &category.owners(), "DEACTIVATE_DOCUMENT")?;

        let mut next = case.clone();
        let entry = next
            .documents
            .get_mut(&category)
            .and_then(|versions| versions.iter_mut().find(|v| v.version == version))
            .ok_or_else(|| WorkflowError::NotFound {
                entity: "document version",
                id: format!("{}/{category}/{version}", case.export_id),
            })?;
        if !entry.is_active {
            return Err(ValidationError::rule(format!(
                "{category} document version {version} is already inactive"
            ))
            .into());
        }
        entry.is_active = false;
        next.updated_at = self.clock.now();
        next.updated_by.clone_from(&caller.organization);
        Ok(next)
    }

    /// Check that `caller` may withdraw `case` and build the withdrawal event.
    ///
    /// Only the creating organization may withdraw, and only while `DRAFT`.
    pub fn withdraw(&self, case: &ExportCase, caller: &Caller) -> Result<CaseEvent, WorkflowError> {
        self.authorize(caller, &caps(&[Capability::Exporter]), "WITHDRAW")?;
        if case.created_by != caller.organization {
            return Err(WorkflowError::unauthorized(
                caller.organization.as_str(),
                "WITHDRAW",
            ));
        }
        if case.status != CaseStatus::Draft {
            return Err(WorkflowError::NotWithdrawable {
                status: case.status,
            });
        }
        Ok(CaseEvent::withdrawn(
            case.export_id.clone(),
            self.clock.now(),
            caller.organization.as_str(),
        ))
    }
}

fn validate_payload(rule: &TransitionRule, payload: &TransitionPayload) -> Result<(), ValidationError> {
    if let Some(field) = payload.fields.keys().find(|field| !rule.accepts(**field)) {
        return Err(ValidationError::rule(format!(
            "field {field} is not accepted by {}",
            rule.operation
        )));
    }
    if let Some(missing) = rule
        .required_fields
        .iter()
        .find(|field| !payload.fields.contains_key(*field))
    {
        return Err(ValidationError::Empty {
            field: missing.as_str(),
        });
    }
    for (field, value) in &payload.fields {
        field.validate(value)?;
    }

    match (&rule.document, &payload.document) {
        (Some(_), Some(reference)) => validation::validate_document_reference(reference)?,
        (Some(category), None) => {
            return Err(ValidationError::rule(format!(
                "{} requires a {category} document reference",
                rule.operation
            )));
        }
        (None, Some(_)) => {
            return Err(ValidationError::rule(format!(
                "{} does not accept a document",
                rule.operation
            )));
        }
        (None, None) => {}
    }

    if let Some(amendments) = &payload.amendments {
        if !rule.amendable {
            return Err(ValidationError::rule(format!(
                "{} does not accept amendments",
                rule.operation
            )));
        }
        amendments.validate()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::workflow::case::CaseField;
    use crate::workflow::payload::Amendments;
    use chrono::TimeZone;
    use exportflow_shared::CaseId;
    use rust_decimal_macros::dec;

    fn engine() -> WorkflowEngine {
        let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
        let capabilities = CapabilityMap::standard()
            .grant("BankA", &[Capability::Exporter, Capability::ExporterBank])
            .grant("BankB", &[Capability::ExporterBank]);
        WorkflowEngine::new(
            Arc::new(TransitionTable::standard()),
            Arc::new(capabilities),
            Arc::new(clock),
        )
    }

    fn new_case(id: &str) -> NewCase {
        NewCase {
            export_id: CaseId::new(id),
            exporter_id: "EXPORTER-1".to_string(),
            exporter_name: "Yirgacheffe Union".to_string(),
            coffee_type: "Arabica".to_string(),
            quantity: dec!(19200),
            destination_country: "Germany".to_string(),
            estimated_value: dec!(96000.50),
        }
    }

    fn draft(engine: &WorkflowEngine) -> ExportCase {
        engine
            .create_case(&Caller::new("BankA", "alice"), new_case("EXP-1"))
            .unwrap()
            .0
    }

    #[test]
    fn test_create_case() {
        let engine = engine();
        let (case, event) = engine
            .create_case(&Caller::new("ExporterMSP", "bob"), new_case("EXP-7"))
            .unwrap();
        assert_eq!(case.status, CaseStatus::Draft);
        assert_eq!(case.created_by, "ExporterMSP");
        assert_eq!(case.created_at, case.updated_at);
        assert_eq!(event.name(), "ExportCreated");
    }

    #[test]
    fn test_create_requires_exporter() {
        let engine = engine();
        let err = engine
            .create_case(&Caller::new("ECXMSP", "eve"), new_case("EXP-7"))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { .. }));
    }

    #[test]
    fn test_create_validates_structure() {
        let engine = engine();
        let mut input = new_case("EXP-7");
        input.estimated_value = dec!(0);
        let err = engine
            .create_case(&Caller::new("ExporterMSP", "bob"), input)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn test_wrong_organization_then_right_organization() {
        let engine = engine();
        let case = draft(&engine);

        let err = engine
            .apply(&case, &Caller::new("BankB", "bob"), Operation::Submit, &TransitionPayload::new())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { .. }));

        let transition = engine
            .apply(&case, &Caller::new("BankA", "alice"), Operation::Submit, &TransitionPayload::new())
            .unwrap();
        assert_eq!(transition.to, CaseStatus::OriginVerification);
        assert!(transition.case.updated_at > case.updated_at);
        assert_eq!(transition.event.name(), "ExportStatusUpdated");
    }

    #[test]
    fn test_invalid_transition_mentions_both_statuses() {
        let engine = engine();
        let case = draft(&engine);
        let payload = TransitionPayload::new()
            .with(CaseField::LotNumber, "LOT-9")
            .with(CaseField::VerifiedBy, "Abebe");
        let err = engine
            .apply(&case, &Caller::new("ECXMSP", "x"), Operation::VerifyOrigin, &payload)
            .unwrap_err();

        assert_eq!(
            err,
            WorkflowError::InvalidTransition {
                from: CaseStatus::Draft,
                to: CaseStatus::LicenseValidation,
                operation: Operation::VerifyOrigin,
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("DRAFT") && msg.contains("LICENSE_VALIDATION"));
    }

    #[test]
    fn test_unauthorized_checked_before_status() {
        let engine = engine();
        let case = draft(&engine);
        let err = engine
            .apply(&case, &Caller::new("ShippingLineMSP", "x"), Operation::VerifyOrigin, &TransitionPayload::new())
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthorized { .. }));
    }

    #[test]
    fn test_missing_required_field() {
        let engine = engine();
        let case = draft(&engine);
        let submitted = engine
            .apply(&case, &Caller::new("BankA", "a"), Operation::Submit, &TransitionPayload::new())
            .unwrap()
            .case;
        let err = engine
            .apply(
                &submitted,
                &Caller::new("ECXMSP", "x"),
                Operation::VerifyOrigin,
                &TransitionPayload::new().with(CaseField::LotNumber, "LOT-9"),
            )
            .unwrap_err();
        assert_eq!(
            err,
            WorkflowError::Validation(ValidationError::Empty { field: "verifiedBy" })
        );
    }

    #[test]
    fn test_unexpected_field_rejected() {
        let engine = engine();
        let case = draft(&engine);
        let err = engine
            .apply(
                &case,
                &Caller::new("BankA", "a"),
                Operation::Submit,
                &TransitionPayload::new().with(CaseField::PaymentAmount, "10"),
            )
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(ValidationError::Rule(_))));
    }

    #[test]
    fn test_document_required_on_certification() {
        let engine = engine();
        let mut case = draft(&engine);
        case.status = CaseStatus::QualityCertification;
        let ecta = Caller::new("ECTAMSP", "inspector");
        let payload = TransitionPayload::new()
            .with(CaseField::QualityGrade, "Grade 1")
            .with(CaseField::CertifiedBy, "Inspector Tadesse");

        let err = engine
            .apply(&case, &ecta, Operation::CertifyQuality, &payload)
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        let transition = engine
            .apply(&case, &ecta, Operation::CertifyQuality, &payload.with_document("cid-quality-1"))
            .unwrap();
        assert_eq!(transition.document_version, Some(1));
        let versions = transition.case.document_versions(DocumentCategory::Quality);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].uploaded_by, "inspector");
        assert!(versions[0].is_active);
    }

    #[test]
    fn test_resubmit_clears_reason_and_applies_amendments() {
        let engine = engine();
        let mut case = draft(&engine);
        case.status = CaseStatus::QualityCertification;
        let rejected = engine
            .apply(
                &case,
                &Caller::new("ECTAMSP", "i"),
                Operation::RejectQuality,
                &TransitionPayload::new().with(CaseField::RejectionReason, "Moisture above 12%"),
            )
            .unwrap()
            .case;
        assert_eq!(rejected.status, CaseStatus::QualityRejected);
        assert!(rejected.field(CaseField::RejectionReason).is_some());

        let amendments = Amendments {
            quantity: Some(dec!(18000)),
            ..Amendments::default()
        };
        let resubmitted = engine
            .apply(
                &rejected,
                &Caller::new("ExporterMSP", "e"),
                Operation::Resubmit,
                &TransitionPayload::new().with_amendments(amendments),
            )
            .unwrap()
            .case;
        assert_eq!(resubmitted.status, CaseStatus::Draft);
        assert_eq!(resubmitted.quantity, dec!(18000));
        assert!(resubmitted.field(CaseField::RejectionReason).is_none());
    }

    #[test]
    fn test_amendments_rejected_outside_resubmission() {
        let engine = engine();
        let case = draft(&engine);
        let err = engine
            .apply(
                &case,
                &Caller::new("BankA", "a"),
                Operation::Submit,
                &TransitionPayload::new().with_amendments(Amendments::default()),
            )
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));
    }

    #[test]
    fn test_cancel_after_shipment_is_invalid() {
        let engine = engine();
        let mut case = draft(&engine);
        case.status = CaseStatus::Shipped;
        let err = engine
            .apply(
                &case,
                &Caller::new("BankA", "a"),
                Operation::Cancel,
                &TransitionPayload::new().with(CaseField::CancellationReason, "Buyer withdrew"),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidTransition {
                from: CaseStatus::Shipped,
                to: CaseStatus::Cancelled,
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_operation() {
        let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
        let table = TransitionTable::from_rules([TransitionRule::new(
            CaseStatus::Draft,
            Operation::Submit,
            CaseStatus::ContractApproval,
            &[Capability::Exporter],
        )])
        .unwrap();
        let engine = WorkflowEngine::new(
            Arc::new(table),
            Arc::new(CapabilityMap::standard()),
            Arc::new(clock),
        );
        let case = engine
            .create_case(&Caller::new("ExporterMSP", "e"), new_case("EXP-2"))
            .unwrap()
            .0;
        let err = engine
            .apply(&case, &Caller::new("ExporterMSP", "e"), Operation::Cancel, &TransitionPayload::new())
            .unwrap_err();
        assert_eq!(err, WorkflowError::UnsupportedOperation(Operation::Cancel));

        let next = engine
            .apply(&case, &Caller::new("ExporterMSP", "e"), Operation::Submit, &TransitionPayload::new())
            .unwrap();
        assert_eq!(next.to, CaseStatus::ContractApproval);
    }

    #[test]
    fn test_attach_and_deactivate_document() {
        let engine = engine();
        let case = draft(&engine);
        let carrier = Caller::new("ShippingLineMSP", "ops");

        let first = engine
            .attach_document(&case, &carrier, DocumentCategory::Shipment, "cid-bl-1")
            .unwrap();
        let second = engine
            .attach_document(&first.case, &carrier, DocumentCategory::Shipment, "cid-bl-2")
            .unwrap();
        assert_eq!((first.version, second.version), (1, 2));
        assert_eq!(second.case.status, CaseStatus::Draft);

        let deactivated = engine
            .deactivate_document(&second.case, &carrier, DocumentCategory::Shipment, 1)
            .unwrap();
        let versions = deactivated.document_versions(DocumentCategory::Shipment);
        assert_eq!(versions.len(), 2);
        assert!(!versions[0].is_active);
        assert!(versions[1].is_active);

        assert!(matches!(
            engine.deactivate_document(&deactivated, &carrier, DocumentCategory::Shipment, 1),
            Err(WorkflowError::Validation(_))
        ));
        assert!(matches!(
            engine.deactivate_document(&deactivated, &carrier, DocumentCategory::Shipment, 9),
            Err(WorkflowError::NotFound { .. })
        ));
        assert!(matches!(
            engine.attach_document(&case, &Caller::new("BankA", "a"), DocumentCategory::Shipment, "cid"),
            Err(WorkflowError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_withdraw_rules() {
        let engine = engine();
        let case = draft(&engine);
        assert!(engine.withdraw(&case, &Caller::new("BankA", "a")).is_ok());
        assert!(matches!(
            engine.withdraw(&case, &Caller::new("ExporterMSP", "e")),
            Err(WorkflowError::Unauthorized { .. })
        ));

        let mut submitted = case;
        submitted.status = CaseStatus::OriginVerification;
        assert!(matches!(
            engine.withdraw(&submitted, &Caller::new("BankA", "a")),
            Err(WorkflowError::NotWithdrawable { .. })
        ));
    }
}
