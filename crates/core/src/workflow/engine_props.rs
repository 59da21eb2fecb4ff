//! Property-based tests for WorkflowEngine.
//!
//! Random operation sequences by random organizations are driven against the
//! standard table; every observed move must be an edge of the table.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use exportflow_shared::CaseId;
use proptest::prelude::*;
use rust_decimal_macros::dec;

use crate::clock::ManualClock;
use crate::workflow::capability::CapabilityMap;
use crate::workflow::case::{CaseField, NewCase};
use crate::workflow::engine::WorkflowEngine;
use crate::workflow::error::WorkflowError;
use crate::workflow::payload::TransitionPayload;
use crate::workflow::table::{TransitionRule, TransitionTable};
use crate::workflow::types::{Caller, CaseStatus, Operation};

const ORGANIZATIONS: [&str; 11] = [
    "ExporterMSP",
    "CommercialBankMSP",
    "ECXMSP",
    "ECTAMSP",
    "NationalBankMSP",
    "CustomAuthoritiesMSP",
    "ShippingLineMSP",
    "ImporterMSP",
    "ImportCustomsMSP",
    "AdminMSP",
    "RogueMSP",
];

fn sample_value(field: CaseField) -> &'static str {
    match field {
        CaseField::Notes => "Ready for review",
        CaseField::LotNumber => "LOT-2026/17",
        CaseField::LicenseNumber => "ECTA/LIC/0042",
        CaseField::QualityGrade => "Grade 2",
        CaseField::OriginCertificateNumber
        | CaseField::BankingApprovalRef
        | CaseField::CurrencyApprovalRef
        | CaseField::ExportDeclarationNumber
        | CaseField::ImportDeclarationNumber => "REF-0001",
        CaseField::TransportIdentifier => "MSC AURORA-221",
        CaseField::TransportMode => "SEA",
        CaseField::DepartureDate | CaseField::EstimatedArrivalDate | CaseField::ActualArrivalDate => {
            "2026-04-01"
        }
        CaseField::PaymentMethod => "L/C",
        CaseField::PaymentAmount | CaseField::RepatriatedAmount => "96000.50",
        CaseField::RejectionReason | CaseField::CancellationReason => "Paperwork incomplete",
        CaseField::VerifiedBy
        | CaseField::CertifiedBy
        | CaseField::ContractApprovedBy
        | CaseField::BankingApprovedBy
        | CaseField::CurrencyApprovedBy
        | CaseField::ExportClearedBy
        | CaseField::ImportClearedBy
        | CaseField::DeliveryConfirmedBy => "Officer Abebe",
    }
}

/// Payload that satisfies `rule`.
fn payload_for(rule: &TransitionRule) -> TransitionPayload {
    let mut payload = TransitionPayload::new();
    for field in &rule.required_fields {
        payload = payload.with(*field, sample_value(*field));
    }
    if rule.document.is_some() {
        payload = payload.with_document("bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi");
    }
    payload
}

fn engine() -> WorkflowEngine {
    let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    WorkflowEngine::new(
        Arc::new(TransitionTable::standard()),
        Arc::new(CapabilityMap::standard()),
        Arc::new(clock),
    )
}

fn arb_step() -> impl Strategy<Value = (Operation, usize)> {
    (
        prop::sample::select(Operation::ALL.to_vec()),
        0..ORGANIZATIONS.len(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every successful step follows a table edge; every failed step leaves the case unchanged.
    #[test]
    fn prop_random_sequences_follow_table(steps in prop::collection::vec(arb_step(), 1..60)) {
        let engine = engine();
        let table = TransitionTable::standard();
        let reachable = table.reachable_from(CaseStatus::Draft);
        let (mut case, _) = engine
            .create_case(
                &Caller::new("ExporterMSP", "exporter"),
                NewCase {
                    export_id: CaseId::new("EXP-PROP-1"),
                    exporter_id: "EXPORTER-1".to_string(),
                    exporter_name: "Guji Cooperative".to_string(),
                    coffee_type: "Arabica".to_string(),
                    quantity: dec!(1200),
                    destination_country: "Japan".to_string(),
                    estimated_value: dec!(54000),
                },
            )
            .unwrap();

        for (operation, org) in steps {
            let caller = Caller::new(ORGANIZATIONS[org], "client");
            let payload = table
                .rule(case.status, operation)
                .map(payload_for)
                .unwrap_or_default();
            let before = serde_json::to_vec(&case).unwrap();

            match engine.apply(&case, &caller, operation, &payload) {
                Ok(transition) => {
                    let rule = table.rule(case.status, operation).unwrap();
                    prop_assert_eq!(transition.from, case.status);
                    prop_assert_eq!(transition.to, rule.to);
                    prop_assert!(table.is_edge(transition.from, transition.to));
                    prop_assert!(engine.capabilities().permits(&caller.organization, &rule.allowed));
                    prop_assert!(transition.case.updated_at > case.updated_at);
                    case = transition.case;
                }
                Err(err) => {
                    prop_assert!(matches!(
                        err,
                        WorkflowError::Unauthorized { .. } | WorkflowError::InvalidTransition { .. }
                    ), "unexpected error {:?}", err);
                    prop_assert_eq!(serde_json::to_vec(&case).unwrap(), before);
                }
            }
            prop_assert!(reachable.contains(&case.status));
        }
    }

    /// Document versions per category stay 1..=n without gaps.
    #[test]
    fn prop_document_versions_are_dense(categories in prop::collection::vec(0usize..5, 1..30)) {
        use crate::workflow::case::DocumentCategory;

        let engine = engine();
        let (mut case, _) = engine
            .create_case(
                &Caller::new("ExporterMSP", "exporter"),
                NewCase {
                    export_id: CaseId::new("EXP-PROP-2"),
                    exporter_id: "EXPORTER-1".to_string(),
                    exporter_name: "Guji Cooperative".to_string(),
                    coffee_type: "Arabica".to_string(),
                    quantity: dec!(1200),
                    destination_country: "Japan".to_string(),
                    estimated_value: dec!(54000),
                },
            )
            .unwrap();

        for idx in categories {
            let category = DocumentCategory::ALL[idx];
            let owner = match category {
                DocumentCategory::Quality | DocumentCategory::OriginCertificate => "ECTAMSP",
                DocumentCategory::Currency => "NationalBankMSP",
                DocumentCategory::Customs => "CustomAuthoritiesMSP",
                DocumentCategory::Shipment => "ShippingLineMSP",
            };
            let attachment = engine
                .attach_document(&case, &Caller::new(owner, "officer"), category, "cid-doc")
                .unwrap();
            case = attachment.case;
        }

        for category in DocumentCategory::ALL {
            let versions: Vec<u32> = case
                .document_versions(category)
                .iter()
                .map(|v| v.version)
                .collect();
            let expected: Vec<u32> = (1..=u32::try_from(versions.len()).unwrap()).collect();
            prop_assert_eq!(versions, expected);
        }
    }
}
