//! Sample payloads for driving a case from draft to completion.

use exportflow_core::workflow::{CaseField as F, Operation as O, TransitionPayload};
use rust_decimal::Decimal;

/// Placeholder content reference used for every seeded document.
pub const SAMPLE_CID: &str = "bafybeihdwdcefgh4dqkjv67uzcmw7ojee6xedzdetojuzjevtenxquvyku";

/// One step of the forward path: operation, acting organization, payload.
pub struct Step {
    pub(crate) operation: O,
    pub(crate) organization: &'static str,
    pub(crate) payload: TransitionPayload,
}

fn step(operation: O, organization: &'static str, payload: TransitionPayload) -> Step {
    Step {
        operation,
        organization,
        payload,
    }
}

/// Every forward step after `SUBMIT`, settling `amount`.
pub fn forward_steps(sequence: u32, amount: Decimal) -> Vec<Step> {
    let amount = amount.round_dp(2).to_string();
    let p = TransitionPayload::new;
    vec![
        step(
            O::VerifyOrigin,
            "ECXMSP",
            p().with(F::LotNumber, format!("LOT-SEED/{sequence:03}"))
                .with(F::VerifiedBy, "Seeder Origin Desk"),
        ),
        step(
            O::ValidateLicense,
            "ECTAMSP",
            p().with(F::LicenseNumber, format!("ECTA/EXP/{sequence:04}")),
        ),
        step(
            O::CertifyQuality,
            "ECTAMSP",
            p().with(F::QualityGrade, "Grade 2")
                .with(F::CertifiedBy, "Seeder Cupping Lab")
                .with_document(SAMPLE_CID),
        ),
        step(
            O::ApproveContract,
            "ECTAMSP",
            p().with(F::ContractApprovedBy, "Seeder Contracts")
                .with(F::OriginCertificateNumber, format!("COO-{sequence:05}"))
                .with_document(SAMPLE_CID),
        ),
        step(
            O::VerifyDocuments,
            "CommercialBankMSP",
            p().with(F::BankingApprovalRef, format!("LC-{sequence:05}"))
                .with(F::BankingApprovedBy, "Seeder Trade Finance"),
        ),
        step(
            O::ApproveCurrency,
            "NationalBankMSP",
            p().with(F::CurrencyApprovalRef, format!("FX-{sequence:05}"))
                .with(F::CurrencyApprovedBy, "Seeder FX Desk")
                .with_document(SAMPLE_CID),
        ),
        step(
            O::ClearExportCustoms,
            "CustomAuthoritiesMSP",
            p().with(F::ExportDeclarationNumber, format!("EXD-{sequence:05}"))
                .with(F::ExportClearedBy, "Seeder Customs")
                .with_document(SAMPLE_CID),
        ),
        step(
            O::Ship,
            "ShippingLineMSP",
            p().with(F::TransportIdentifier, format!("SEED-VESSEL-{sequence}"))
                .with(F::TransportMode, "SEA")
                .with(F::DepartureDate, "2026-05-04")
                .with(F::EstimatedArrivalDate, "2026-06-01")
                .with_document(SAMPLE_CID),
        ),
        step(
            O::MarkArrived,
            "ShippingLineMSP",
            p().with(F::ActualArrivalDate, "2026-05-30"),
        ),
        step(
            O::DeclareImport,
            "ImporterMSP",
            p().with(F::ImportDeclarationNumber, format!("IMP-{sequence:05}")),
        ),
        step(
            O::ClearImportCustoms,
            "ImportCustomsMSP",
            p().with(F::ImportClearedBy, "Seeder Import Customs")
                .with_document(SAMPLE_CID),
        ),
        step(
            O::ConfirmPayment,
            "CommercialBankMSP",
            p().with(F::PaymentMethod, "L/C")
                .with(F::PaymentAmount, amount.clone()),
        ),
        step(
            O::ConfirmRepatriation,
            "NationalBankMSP",
            p().with(F::RepatriatedAmount, amount),
        ),
        step(O::Complete, "CommercialBankMSP", p()),
    ]
}
