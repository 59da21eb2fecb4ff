//! The export case record and its stage-specific fields.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use exportflow_shared::CaseId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::documents::{Completeness, DocumentChecklist, DocumentUpload, ExportMode};
use crate::validation::{self, ValidationResult};
use crate::workflow::capability::{Capability, CapabilitySet, caps};
use crate::workflow::types::CaseStatus;

/// A stage-specific field populated as the case advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaseField {
    /// Free-text notes from the exporter.
    Notes,
    /// Exchange lot number.
    LotNumber,
    /// Origin verifier.
    VerifiedBy,
    /// Export license number.
    LicenseNumber,
    /// Quality grade.
    QualityGrade,
    /// Quality certifier.
    CertifiedBy,
    /// Contract approver.
    ContractApprovedBy,
    /// Certificate of origin number.
    OriginCertificateNumber,
    /// Exporter bank's approval reference.
    BankingApprovalRef,
    /// Exporter bank's approver.
    BankingApprovedBy,
    /// National bank's foreign exchange approval reference.
    CurrencyApprovalRef,
    /// National bank's approver.
    CurrencyApprovedBy,
    /// Export customs declaration number.
    ExportDeclarationNumber,
    /// Export customs officer.
    ExportClearedBy,
    /// Vessel, flight, or train identifier.
    TransportIdentifier,
    /// SEA, AIR, or RAIL.
    TransportMode,
    /// Departure date.
    DepartureDate,
    /// Estimated arrival date.
    EstimatedArrivalDate,
    /// Actual arrival date.
    ActualArrivalDate,
    /// Import declaration number.
    ImportDeclarationNumber,
    /// Import customs officer.
    ImportClearedBy,
    /// Person confirming delivery.
    DeliveryConfirmedBy,
    /// Payment method.
    PaymentMethod,
    /// Amount received.
    PaymentAmount,
    /// Amount repatriated.
    RepatriatedAmount,
    /// Reason for the most recent rejection.
    RejectionReason,
    /// Reason for cancellation.
    CancellationReason,
}

impl CaseField {
    /// Returns the persisted (camelCase) field name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::LotNumber => "lotNumber",
            Self::VerifiedBy => "verifiedBy",
            Self::LicenseNumber => "licenseNumber",
            Self::QualityGrade => "qualityGrade",
            Self::CertifiedBy => "certifiedBy",
            Self::ContractApprovedBy => "contractApprovedBy",
            Self::OriginCertificateNumber => "originCertificateNumber",
            Self::BankingApprovalRef => "bankingApprovalRef",
            Self::BankingApprovedBy => "bankingApprovedBy",
            Self::CurrencyApprovalRef => "currencyApprovalRef",
            Self::CurrencyApprovedBy => "currencyApprovedBy",
            Self::ExportDeclarationNumber => "exportDeclarationNumber",
            Self::ExportClearedBy => "exportClearedBy",
            Self::TransportIdentifier => "transportIdentifier",
            Self::TransportMode => "transportMode",
            Self::DepartureDate => "departureDate",
            Self::EstimatedArrivalDate => "estimatedArrivalDate",
            Self::ActualArrivalDate => "actualArrivalDate",
            Self::ImportDeclarationNumber => "importDeclarationNumber",
            Self::ImportClearedBy => "importClearedBy",
            Self::DeliveryConfirmedBy => "deliveryConfirmedBy",
            Self::PaymentMethod => "paymentMethod",
            Self::PaymentAmount => "paymentAmount",
            Self::RepatriatedAmount => "repatriatedAmount",
            Self::RejectionReason => "rejectionReason",
            Self::CancellationReason => "cancellationReason",
        }
    }

    /// Validates a value for this field.
    pub fn validate(&self, value: &str) -> ValidationResult {
        let field = self.as_str();
        match self {
            Self::Notes => validation::validate_free_text(field, value),
            Self::VerifiedBy
            | Self::CertifiedBy
            | Self::ContractApprovedBy
            | Self::BankingApprovedBy
            | Self::CurrencyApprovedBy
            | Self::ExportClearedBy
            | Self::ImportClearedBy
            | Self::DeliveryConfirmedBy => validation::validate_approver_name(value),
            Self::LicenseNumber => validation::validate_license_number(value),
            Self::LotNumber
            | Self::OriginCertificateNumber
            | Self::BankingApprovalRef
            | Self::CurrencyApprovalRef
            | Self::ExportDeclarationNumber
            | Self::ImportDeclarationNumber => validation::validate_reference_code(field, value),
            Self::QualityGrade => validation::validate_quality_grade(value),
            Self::TransportIdentifier => validation::validate_transport_identifier(value),
            Self::TransportMode => validation::validate_transport_mode(value),
            Self::DepartureDate | Self::EstimatedArrivalDate | Self::ActualArrivalDate => {
                validation::validate_date(field, value)
            }
            Self::PaymentMethod => validation::validate_payment_method(value),
            Self::PaymentAmount | Self::RepatriatedAmount => {
                validation::validate_payment_amount(validation::parse_amount(field, value)?)
            }
            Self::RejectionReason | Self::CancellationReason => validation::validate_reason(value),
        }
    }
}

impl fmt::Display for CaseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a versioned document attached to a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentCategory {
    /// Quality certificates.
    Quality,
    /// Foreign exchange approvals.
    Currency,
    /// Customs declarations and clearances.
    Customs,
    /// Bills of lading and shipping documents.
    Shipment,
    /// Certificates of origin.
    OriginCertificate,
}

impl DocumentCategory {
    /// Every category.
    pub const ALL: [Self; 5] = [
        Self::Quality,
        Self::Currency,
        Self::Customs,
        Self::Shipment,
        Self::OriginCertificate,
    ];

    /// Returns the persisted name of the category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Currency => "currency",
            Self::Customs => "customs",
            Self::Shipment => "shipment",
            Self::OriginCertificate => "originCertificate",
        }
    }

    /// Capabilities allowed to attach or deactivate documents of this category.
    #[must_use]
    pub fn owners(&self) -> CapabilitySet {
        match self {
            Self::Quality | Self::OriginCertificate => caps(&[Capability::QualityAuthority]),
            Self::Currency => caps(&[Capability::NationalBank]),
            Self::Customs => caps(&[Capability::ExportCustoms, Capability::ImportCustoms]),
            Self::Shipment => caps(&[Capability::Carrier]),
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One version of a document in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    /// 1-based version number within the category.
    pub version: u32,
    /// Content reference (for example an IPFS CID).
    pub reference: String,
    /// Identity of the uploader.
    pub uploaded_by: String,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
    /// False once the version has been deactivated.
    pub is_active: bool,
}

/// The export case record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportCase {
    /// Case identifier; also the primary key.
    pub export_id: CaseId,
    /// Exporter identifier.
    pub exporter_id: String,
    /// Exporter display name.
    pub exporter_name: String,
    /// Coffee type.
    pub coffee_type: String,
    /// Quantity in kilograms.
    pub quantity: Decimal,
    /// Destination country.
    pub destination_country: String,
    /// Estimated value in USD.
    pub estimated_value: Decimal,
    /// Current status.
    pub status: CaseStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
    /// Organization that created the case.
    pub created_by: String,
    /// Organization that last mutated the case.
    pub updated_by: String,
    /// Stage-specific fields.
    #[serde(default)]
    pub fields: BTreeMap<CaseField, String>,
    /// Versioned documents per category.
    #[serde(default)]
    pub documents: BTreeMap<DocumentCategory, Vec<DocumentVersion>>,
    /// Selected export mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_mode: Option<ExportMode>,
    /// Growing region declared at mode selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_region: Option<String>,
    /// Mode selection time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_selected_at: Option<DateTime<Utc>>,
    /// Identity that selected the mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_selected_by: Option<String>,
    /// Required-document checklist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_checklist: Option<DocumentChecklist>,
    /// Checklist uploads in upload order.
    #[serde(default)]
    pub document_uploads: Vec<DocumentUpload>,
}

impl ExportCase {
    /// Returns a stage-specific field.
    #[must_use]
    pub fn field(&self, field: CaseField) -> Option<&str> {
        self.fields.get(&field).map(String::as_str)
    }

    /// Returns the versions recorded for `category`, oldest first.
    #[must_use]
    pub fn document_versions(&self, category: DocumentCategory) -> &[DocumentVersion] {
        self.documents
            .get(&category)
            .map_or(&[], Vec::as_slice)
    }

    /// Appends a new active version to `category` and returns its number.
    pub fn append_document(
        &mut self,
        category: DocumentCategory,
        reference: String,
        uploaded_by: String,
        uploaded_at: DateTime<Utc>,
    ) -> u32 {
        let versions = self.documents.entry(category).or_default();
        let version = u32::try_from(versions.len()).map_or(u32::MAX, |n| n.saturating_add(1));
        versions.push(DocumentVersion {
            version,
            reference,
            uploaded_by,
            uploaded_at,
            is_active: true,
        });
        version
    }

    /// Completeness of the checklist, if a mode has been selected.
    #[must_use]
    pub fn completeness(&self) -> Option<Completeness> {
        self.document_checklist
            .as_ref()
            .map(DocumentChecklist::completeness)
    }

    /// Returns true if a checklist exists and nothing required is missing.
    #[must_use]
    pub fn is_document_complete(&self) -> bool {
        self.document_checklist
            .as_ref()
            .is_some_and(DocumentChecklist::is_complete)
    }
}

/// Input for creating a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCase {
    /// Case identifier; must carry the `EXP-` prefix.
    pub export_id: CaseId,
    /// Exporter identifier.
    pub exporter_id: String,
    /// Exporter display name.
    pub exporter_name: String,
    /// Coffee type.
    pub coffee_type: String,
    /// Quantity in kilograms.
    pub quantity: Decimal,
    /// Destination country.
    pub destination_country: String,
    /// Estimated value in USD.
    pub estimated_value: Decimal,
}

impl NewCase {
    /// Validates every structural field.
    pub fn validate(&self) -> ValidationResult {
        validation::validate_case_id(self.export_id.as_str())?;
        validation::validate_exporter_id(&self.exporter_id)?;
        validation::validate_exporter_name(&self.exporter_name)?;
        validation::validate_coffee_type(&self.coffee_type)?;
        validation::validate_quantity(self.quantity)?;
        validation::validate_destination_country(&self.destination_country)?;
        validation::validate_estimated_value(self.estimated_value)
    }
}
