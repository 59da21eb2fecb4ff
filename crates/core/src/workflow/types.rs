//! Workflow domain types for the export case lifecycle.
//!
//! This module defines the lifecycle states, the operations that move a case
//! between them, and the authenticated caller performing an operation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Export case status.
///
/// The main line runs from `Draft` to `Completed`. Each review stage has a
/// rejection state; all of them except `ImportCustomsRejected` can be
/// resubmitted back to `Draft`. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    /// Being prepared by the exporter.
    Draft,
    /// Awaiting origin verification by the commodity exchange.
    OriginVerification,
    /// Awaiting export license validation.
    LicenseValidation,
    /// Awaiting quality certification.
    QualityCertification,
    /// Awaiting sales contract approval.
    ContractApproval,
    /// Awaiting document verification by the exporter's bank.
    DocumentVerification,
    /// Awaiting foreign exchange approval by the national bank.
    CurrencyApproval,
    /// Awaiting export customs clearance.
    ExportCustomsClearance,
    /// Cleared and waiting for shipment.
    ShipmentScheduled,
    /// In transit.
    Shipped,
    /// Arrived at the destination port.
    Arrived,
    /// Awaiting import customs clearance.
    ImportCustomsClearance,
    /// Delivered to the importer.
    Delivered,
    /// Payment received by the exporter's bank.
    PaymentReceived,
    /// Export proceeds repatriated.
    CurrencyRepatriated,
    /// Lifecycle complete.
    Completed,
    /// Origin verification rejected.
    OriginRejected,
    /// License validation rejected.
    LicenseRejected,
    /// Quality certification rejected.
    QualityRejected,
    /// Contract approval rejected.
    ContractRejected,
    /// Document verification rejected.
    DocumentsRejected,
    /// Currency approval rejected.
    CurrencyRejected,
    /// Export customs rejected.
    ExportCustomsRejected,
    /// Import customs rejected (terminal).
    ImportCustomsRejected,
    /// Cancelled (terminal).
    Cancelled,
}

impl CaseStatus {
    /// Every status, main line first.
    pub const ALL: [Self; 25] = [
        Self::Draft,
        Self::OriginVerification,
        Self::LicenseValidation,
        Self::QualityCertification,
        Self::ContractApproval,
        Self::DocumentVerification,
        Self::CurrencyApproval,
        Self::ExportCustomsClearance,
        Self::ShipmentScheduled,
        Self::Shipped,
        Self::Arrived,
        Self::ImportCustomsClearance,
        Self::Delivered,
        Self::PaymentReceived,
        Self::CurrencyRepatriated,
        Self::Completed,
        Self::OriginRejected,
        Self::LicenseRejected,
        Self::QualityRejected,
        Self::ContractRejected,
        Self::DocumentsRejected,
        Self::CurrencyRejected,
        Self::ExportCustomsRejected,
        Self::ImportCustomsRejected,
        Self::Cancelled,
    ];

    /// Returns the persisted representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::OriginVerification => "ORIGIN_VERIFICATION",
            Self::LicenseValidation => "LICENSE_VALIDATION",
            Self::QualityCertification => "QUALITY_CERTIFICATION",
            Self::ContractApproval => "CONTRACT_APPROVAL",
            Self::DocumentVerification => "DOCUMENT_VERIFICATION",
            Self::CurrencyApproval => "CURRENCY_APPROVAL",
            Self::ExportCustomsClearance => "EXPORT_CUSTOMS_CLEARANCE",
            Self::ShipmentScheduled => "SHIPMENT_SCHEDULED",
            Self::Shipped => "SHIPPED",
            Self::Arrived => "ARRIVED",
            Self::ImportCustomsClearance => "IMPORT_CUSTOMS_CLEARANCE",
            Self::Delivered => "DELIVERED",
            Self::PaymentReceived => "PAYMENT_RECEIVED",
            Self::CurrencyRepatriated => "CURRENCY_REPATRIATED",
            Self::Completed => "COMPLETED",
            Self::OriginRejected => "ORIGIN_REJECTED",
            Self::LicenseRejected => "LICENSE_REJECTED",
            Self::QualityRejected => "QUALITY_REJECTED",
            Self::ContractRejected => "CONTRACT_REJECTED",
            Self::DocumentsRejected => "DOCUMENTS_REJECTED",
            Self::CurrencyRejected => "CURRENCY_REJECTED",
            Self::ExportCustomsRejected => "EXPORT_CUSTOMS_REJECTED",
            Self::ImportCustomsRejected => "IMPORT_CUSTOMS_REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses a status from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Returns true for rejection states that can be resubmitted to `Draft`.
    #[must_use]
    pub fn is_resubmittable(&self) -> bool {
        matches!(
            self,
            Self::OriginRejected
                | Self::LicenseRejected
                | Self::QualityRejected
                | Self::ContractRejected
                | Self::DocumentsRejected
                | Self::CurrencyRejected
                | Self::ExportCustomsRejected
        )
    }

    /// Returns true for every rejection state, resubmittable or not.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        self.is_resubmittable() || matches!(self, Self::ImportCustomsRejected)
    }

    /// Returns true if no operation can leave this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::ImportCustomsRejected | Self::Cancelled
        )
    }

    /// Returns true while the case is still on the main line before shipment.
    #[must_use]
    pub fn is_pre_shipment(&self) -> bool {
        matches!(
            self,
            Self::Draft
                | Self::OriginVerification
                | Self::LicenseValidation
                | Self::QualityCertification
                | Self::ContractApproval
                | Self::DocumentVerification
                | Self::CurrencyApproval
                | Self::ExportCustomsClearance
                | Self::ShipmentScheduled
        )
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operation requested against a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Submit a draft for review.
    Submit,
    /// Verify coffee origin and lot.
    VerifyOrigin,
    /// Reject at origin verification.
    RejectOrigin,
    /// Validate the export license.
    ValidateLicense,
    /// Reject at license validation.
    RejectLicense,
    /// Issue the quality certificate.
    CertifyQuality,
    /// Reject at quality certification.
    RejectQuality,
    /// Approve the sales contract and issue the origin certificate.
    ApproveContract,
    /// Reject at contract approval.
    RejectContract,
    /// Verify the document set.
    VerifyDocuments,
    /// Reject at document verification.
    RejectDocuments,
    /// Approve foreign exchange.
    ApproveCurrency,
    /// Reject at currency approval.
    RejectCurrency,
    /// Clear export customs.
    ClearExportCustoms,
    /// Reject at export customs.
    RejectExportCustoms,
    /// Ship the consignment.
    Ship,
    /// Confirm arrival at destination.
    MarkArrived,
    /// Lodge the import declaration.
    DeclareImport,
    /// Clear import customs and deliver.
    ClearImportCustoms,
    /// Reject at import customs.
    RejectImportCustoms,
    /// Confirm payment received.
    ConfirmPayment,
    /// Confirm proceeds repatriated.
    ConfirmRepatriation,
    /// Close the case.
    Complete,
    /// Send a rejected case back to draft.
    Resubmit,
    /// Cancel the case.
    Cancel,
}

impl Operation {
    /// Every operation in lifecycle order.
    pub const ALL: [Self; 25] = [
        Self::Submit,
        Self::VerifyOrigin,
        Self::RejectOrigin,
        Self::ValidateLicense,
        Self::RejectLicense,
        Self::CertifyQuality,
        Self::RejectQuality,
        Self::ApproveContract,
        Self::RejectContract,
        Self::VerifyDocuments,
        Self::RejectDocuments,
        Self::ApproveCurrency,
        Self::RejectCurrency,
        Self::ClearExportCustoms,
        Self::RejectExportCustoms,
        Self::Ship,
        Self::MarkArrived,
        Self::DeclareImport,
        Self::ClearImportCustoms,
        Self::RejectImportCustoms,
        Self::ConfirmPayment,
        Self::ConfirmRepatriation,
        Self::Complete,
        Self::Resubmit,
        Self::Cancel,
    ];

    /// Returns the persisted representation of the operation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "SUBMIT",
            Self::VerifyOrigin => "VERIFY_ORIGIN",
            Self::RejectOrigin => "REJECT_ORIGIN",
            Self::ValidateLicense => "VALIDATE_LICENSE",
            Self::RejectLicense => "REJECT_LICENSE",
            Self::CertifyQuality => "CERTIFY_QUALITY",
            Self::RejectQuality => "REJECT_QUALITY",
            Self::ApproveContract => "APPROVE_CONTRACT",
            Self::RejectContract => "REJECT_CONTRACT",
            Self::VerifyDocuments => "VERIFY_DOCUMENTS",
            Self::RejectDocuments => "REJECT_DOCUMENTS",
            Self::ApproveCurrency => "APPROVE_CURRENCY",
            Self::RejectCurrency => "REJECT_CURRENCY",
            Self::ClearExportCustoms => "CLEAR_EXPORT_CUSTOMS",
            Self::RejectExportCustoms => "REJECT_EXPORT_CUSTOMS",
            Self::Ship => "SHIP",
            Self::MarkArrived => "MARK_ARRIVED",
            Self::DeclareImport => "DECLARE_IMPORT",
            Self::ClearImportCustoms => "CLEAR_IMPORT_CUSTOMS",
            Self::RejectImportCustoms => "REJECT_IMPORT_CUSTOMS",
            Self::ConfirmPayment => "CONFIRM_PAYMENT",
            Self::ConfirmRepatriation => "CONFIRM_REPATRIATION",
            Self::Complete => "COMPLETE",
            Self::Resubmit => "RESUBMIT",
            Self::Cancel => "CANCEL",
        }
    }

    /// Parses an operation from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated party invoking an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    /// Organization label (MSP identifier) supplied by the identity layer.
    pub organization: String,
    /// Identity of the individual client within the organization.
    pub identity: String,
}

impl Caller {
    /// Creates a caller.
    pub fn new(organization: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            identity: identity.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_status_as_str_matches_serde() {
        for status in CaseStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
    }

    #[test]
    fn test_operation_as_str_matches_serde() {
        for op in Operation::ALL {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op.as_str()));
        }
    }

    #[rstest]
    #[case("DRAFT", Some(CaseStatus::Draft))]
    #[case("currency_approval", Some(CaseStatus::CurrencyApproval))]
    #[case(" Shipped ", Some(CaseStatus::Shipped))]
    #[case("PENDING", None)]
    fn test_status_parse(#[case] input: &str, #[case] expected: Option<CaseStatus>) {
        assert_eq!(CaseStatus::parse(input), expected);
    }

    #[test]
    fn test_operation_parse() {
        assert_eq!(Operation::parse("verify_origin"), Some(Operation::VerifyOrigin));
        assert_eq!(Operation::parse("APPROVE"), None);
    }

    #[test]
    fn test_status_classification() {
        assert!(CaseStatus::QualityRejected.is_resubmittable());
        assert!(!CaseStatus::ImportCustomsRejected.is_resubmittable());
        assert!(CaseStatus::ImportCustomsRejected.is_rejection());
        assert!(CaseStatus::ImportCustomsRejected.is_terminal());
        assert!(CaseStatus::Cancelled.is_terminal());
        assert!(CaseStatus::Completed.is_terminal());
        assert!(!CaseStatus::Shipped.is_terminal());
        assert!(CaseStatus::ShipmentScheduled.is_pre_shipment());
        assert!(!CaseStatus::Shipped.is_pre_shipment());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            CaseStatus::ExportCustomsClearance.to_string(),
            "EXPORT_CUSTOMS_CLEARANCE"
        );
    }
}
