//! Document checklist domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the coffee is sourced for export.
///
/// Regions without a configured mapping default to vertical.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportMode {
    /// Exchange-traded: needs an exchange contract and a warehouse receipt.
    Horizontal,
    /// Direct from grower to buyer: needs a vertical contract.
    #[default]
    Vertical,
}

impl ExportMode {
    /// Every mode.
    pub const ALL: [Self; 2] = [Self::Horizontal, Self::Vertical];

    /// Returns the persisted representation of the mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Horizontal => "HORIZONTAL",
            Self::Vertical => "VERTICAL",
        }
    }

    /// Parses a mode (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for ExportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supporting document tracked by the checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    /// Export license.
    ExportLicense,
    /// Direct-trade contract (vertical mode only).
    VerticalContract,
    /// Exchange contract (horizontal mode only).
    EcxContract,
    /// Exchange warehouse receipt (horizontal mode only).
    WarehouseReceipt,
    /// Sales contract with the buyer.
    SalesContract,
    /// Commercial invoice.
    Invoice,
    /// Quality certificate.
    QualityCert,
    /// Certificate of origin.
    OriginCert,
    /// Dispatch letter.
    DispatchLetter,
    /// Customs declaration.
    CustomsDeclaration,
}

impl DocumentKind {
    /// Every document kind.
    pub const ALL: [Self; 10] = [
        Self::ExportLicense,
        Self::VerticalContract,
        Self::EcxContract,
        Self::WarehouseReceipt,
        Self::SalesContract,
        Self::Invoice,
        Self::QualityCert,
        Self::OriginCert,
        Self::DispatchLetter,
        Self::CustomsDeclaration,
    ];

    /// Documents required in every mode.
    pub const COMMON: [Self; 7] = [
        Self::ExportLicense,
        Self::SalesContract,
        Self::Invoice,
        Self::QualityCert,
        Self::OriginCert,
        Self::DispatchLetter,
        Self::CustomsDeclaration,
    ];

    /// Returns the persisted representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExportLicense => "EXPORT_LICENSE",
            Self::VerticalContract => "VERTICAL_CONTRACT",
            Self::EcxContract => "ECX_CONTRACT",
            Self::WarehouseReceipt => "WAREHOUSE_RECEIPT",
            Self::SalesContract => "SALES_CONTRACT",
            Self::Invoice => "INVOICE",
            Self::QualityCert => "QUALITY_CERT",
            Self::OriginCert => "ORIGIN_CERT",
            Self::DispatchLetter => "DISPATCH_LETTER",
            Self::CustomsDeclaration => "CUSTOMS_DECLARATION",
        }
    }

    /// Parses a kind (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Returns true if this document is required for `mode`.
    #[must_use]
    pub fn is_required_for(&self, mode: ExportMode) -> bool {
        match self {
            Self::VerticalContract => mode == ExportMode::Vertical,
            Self::EcxContract | Self::WarehouseReceipt => mode == ExportMode::Horizontal,
            _ => true,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checklist and upload status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    /// Not applicable to the case's mode.
    NotRequired,
    /// Required and not yet uploaded.
    Pending,
    /// Uploaded and awaiting review.
    Uploaded,
    /// Reviewed and accepted.
    Verified,
    /// Reviewed and rejected.
    Rejected,
}

impl DocumentStatus {
    /// Returns the persisted representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRequired => "NOT_REQUIRED",
            Self::Pending => "PENDING",
            Self::Uploaded => "UPLOADED",
            Self::Verified => "VERIFIED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Returns true if the document counts towards completeness.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Uploaded | Self::Verified)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One uploaded document and its review outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpload {
    /// Which document this is.
    pub document_type: DocumentKind,
    /// Content reference (for example an IPFS CID).
    pub cid: String,
    /// Identity of the uploader.
    pub uploaded_by: String,
    /// Upload time.
    pub uploaded_at: DateTime<Utc>,
    /// Review status of this upload.
    pub status: DocumentStatus,
    /// Identity of the reviewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
    /// Review time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Reason given when the upload was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

/// Stored region-to-mode recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionModeMapping {
    /// Growing region name.
    pub region: String,
    /// Mode recommended for exports from the region.
    pub recommended_mode: ExportMode,
    /// Free-form justification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Completeness verdict for one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completeness {
    /// True if nothing required is missing.
    pub is_complete: bool,
    /// Required documents that are neither uploaded nor verified.
    pub missing_docs: Vec<DocumentKind>,
}
