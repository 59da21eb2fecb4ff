//! Declarative transition table.
//!
//! The table is an immutable value keyed by `(current status, operation)`.
//! It is built once (either [`TransitionTable::standard`] or from a
//! declarative document) and injected into the engine, so several workflow
//! variants can coexist in one process.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::workflow::capability::{Capability, CapabilitySet, caps};
use crate::workflow::case::{CaseField, DocumentCategory};
use crate::workflow::types::{CaseStatus, Operation};

/// Errors raised while building a transition table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Two rules share the same `(from, operation)` key.
    #[error("duplicate transition for {operation} from {from}")]
    DuplicateEdge {
        /// Source status.
        from: CaseStatus,
        /// Operation.
        operation: Operation,
    },

    /// A rule allows no capability at all.
    #[error("transition {operation} from {from} allows no capability")]
    NoCapabilities {
        /// Source status.
        from: CaseStatus,
        /// Operation.
        operation: Operation,
    },

    /// A field is listed as both required and optional.
    #[error("field {field} of {operation} from {from} is both required and optional")]
    OverlappingField {
        /// Source status.
        from: CaseStatus,
        /// Operation.
        operation: Operation,
        /// The field.
        field: CaseField,
    },

    /// A capability name in configuration is not recognized.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
}

impl TableError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateEdge { .. } => "DUPLICATE_TRANSITION",
            Self::NoCapabilities { .. } => "EMPTY_CAPABILITIES",
            Self::OverlappingField { .. } => "OVERLAPPING_FIELD",
            Self::UnknownCapability(_) => "UNKNOWN_CAPABILITY",
        }
    }
}

/// One edge of the transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRule {
    /// Required source status.
    pub from: CaseStatus,
    /// Operation requested.
    pub operation: Operation,
    /// Target status.
    pub to: CaseStatus,
    /// Capabilities allowed to take the edge (any one suffices).
    pub allowed: CapabilitySet,
    /// Fields that must accompany the transition.
    #[serde(default)]
    pub required_fields: BTreeSet<CaseField>,
    /// Fields that may accompany the transition.
    #[serde(default)]
    pub optional_fields: BTreeSet<CaseField>,
    /// Document category a new version is appended to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentCategory>,
    /// Whether business amendments are accepted.
    #[serde(default)]
    pub amendable: bool,
    /// Fields removed from the case by this transition.
    #[serde(default)]
    pub clears: BTreeSet<CaseField>,
}

impl TransitionRule {
    /// Creates a rule with no fields, document, or amendments.
    #[must_use]
    pub fn new(
        from: CaseStatus,
        operation: Operation,
        to: CaseStatus,
        allowed: &[Capability],
    ) -> Self {
        Self {
            from,
            operation,
            to,
            allowed: caps(allowed),
            required_fields: BTreeSet::new(),
            optional_fields: BTreeSet::new(),
            document: None,
            amendable: false,
            clears: BTreeSet::new(),
        }
    }

    /// Adds required fields.
    #[must_use]
    pub fn requires(mut self, fields: &[CaseField]) -> Self {
        self.required_fields.extend(fields.iter().copied());
        self
    }

    /// Adds optional fields.
    #[must_use]
    pub fn optional(mut self, fields: &[CaseField]) -> Self {
        self.optional_fields.extend(fields.iter().copied());
        self
    }

    /// Appends a document version to `category` on transition.
    #[must_use]
    pub fn with_document(mut self, category: DocumentCategory) -> Self {
        self.document = Some(category);
        self
    }

    /// Accepts business amendments.
    #[must_use]
    pub fn amendable(mut self) -> Self {
        self.amendable = true;
        self
    }

    /// Removes `fields` from the case on transition.
    #[must_use]
    pub fn clears(mut self, fields: &[CaseField]) -> Self {
        self.clears.extend(fields.iter().copied());
        self
    }

    /// Returns true if `field` may appear in the payload.
    #[must_use]
    pub fn accepts(&self, field: CaseField) -> bool {
        self.required_fields.contains(&field) || self.optional_fields.contains(&field)
    }

    fn check(&self) -> Result<(), TableError> {
        if self.allowed.is_empty() {
            return Err(TableError::NoCapabilities {
                from: self.from,
                operation: self.operation,
            });
        }
        if let Some(field) = self.required_fields.intersection(&self.optional_fields).next() {
            return Err(TableError::OverlappingField {
                from: self.from,
                operation: self.operation,
                field: *field,
            });
        }
        Ok(())
    }
}

/// Declarative form of a transition table, as loaded from a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionTableSpec {
    /// Every edge of the table.
    pub rules: Vec<TransitionRule>,
}

/// Immutable map `(status, operation) -> rule`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    rules: BTreeMap<(CaseStatus, Operation), TransitionRule>,
}

impl TransitionTable {
    /// Builds a table, rejecting duplicate edges and rules without capabilities.
    pub fn from_rules(rules: impl IntoIterator<Item = TransitionRule>) -> Result<Self, TableError> {
        let mut map = BTreeMap::new();
        for rule in rules {
            rule.check()?;
            let key = (rule.from, rule.operation);
            if map.contains_key(&key) {
                return Err(TableError::DuplicateEdge {
                    from: rule.from,
                    operation: rule.operation,
                });
            }
            map.insert(key, rule);
        }
        Ok(Self { rules: map })
    }

    /// The standard export lifecycle.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            rules: standard_rules()
                .into_iter()
                .map(|rule| ((rule.from, rule.operation), rule))
                .collect(),
        }
    }

    /// Returns the rule for `(from, operation)`.
    #[must_use]
    pub fn rule(&self, from: CaseStatus, operation: Operation) -> Option<&TransitionRule> {
        self.rules.get(&(from, operation))
    }

    /// Every rule for `operation`, ordered by source status.
    pub fn rules_for(&self, operation: Operation) -> impl Iterator<Item = &TransitionRule> {
        self.rules
            .values()
            .filter(move |rule| rule.operation == operation)
    }

    /// Union of the capabilities allowed on any edge of `operation`.
    #[must_use]
    pub fn capabilities_for(&self, operation: Operation) -> CapabilitySet {
        self.rules_for(operation)
            .flat_map(|rule| rule.allowed.iter().copied())
            .collect()
    }

    /// Target of the first edge of `operation`, if the operation has any edge.
    #[must_use]
    pub fn target_of(&self, operation: Operation) -> Option<CaseStatus> {
        self.rules_for(operation).next().map(|rule| rule.to)
    }

    /// Rules leaving `from`.
    pub fn successors(&self, from: CaseStatus) -> impl Iterator<Item = &TransitionRule> {
        self.rules
            .range((from, Operation::ALL[0])..)
            .take_while(move |((status, _), _)| *status == from)
            .map(|(_, rule)| rule)
    }

    /// Returns true if some operation moves `from` to `to`.
    #[must_use]
    pub fn is_edge(&self, from: CaseStatus, to: CaseStatus) -> bool {
        self.successors(from).any(|rule| rule.to == to)
    }

    /// Every status reachable from `start`, including `start` itself.
    #[must_use]
    pub fn reachable_from(&self, start: CaseStatus) -> BTreeSet<CaseStatus> {
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(status) = queue.pop_front() {
            for rule in self.successors(status) {
                if seen.insert(rule.to) {
                    queue.push_back(rule.to);
                }
            }
        }
        seen
    }

    /// Every rule, ordered by `(from, operation)`.
    pub fn rules(&self) -> impl Iterator<Item = &TransitionRule> {
        self.rules.values()
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the table has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Declarative form of this table.
    #[must_use]
    pub fn to_spec(&self) -> TransitionTableSpec {
        TransitionTableSpec {
            rules: self.rules.values().cloned().collect(),
        }
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<TransitionTableSpec> for TransitionTable {
    type Error = TableError;

    fn try_from(spec: TransitionTableSpec) -> Result<Self, Self::Error> {
        Self::from_rules(spec.rules)
    }
}

fn standard_rules() -> Vec<TransitionRule> {
    use Capability as C;
    use CaseField as F;
    use CaseStatus as S;
    use Operation as O;

    let mut rules = vec![
        TransitionRule::new(S::Draft, O::Submit, S::OriginVerification, &[C::Exporter])
            .optional(&[F::Notes]),
        TransitionRule::new(
            S::OriginVerification,
            O::VerifyOrigin,
            S::LicenseValidation,
            &[C::CommodityExchange],
        )
        .requires(&[F::LotNumber, F::VerifiedBy])
        .optional(&[F::Notes]),
        TransitionRule::new(
            S::LicenseValidation,
            O::ValidateLicense,
            S::QualityCertification,
            &[C::QualityAuthority],
        )
        .requires(&[F::LicenseNumber]),
        TransitionRule::new(
            S::QualityCertification,
            O::CertifyQuality,
            S::ContractApproval,
            &[C::QualityAuthority],
        )
        .requires(&[F::QualityGrade, F::CertifiedBy])
        .with_document(DocumentCategory::Quality),
        TransitionRule::new(
            S::ContractApproval,
            O::ApproveContract,
            S::DocumentVerification,
            &[C::QualityAuthority],
        )
        .requires(&[F::ContractApprovedBy, F::OriginCertificateNumber])
        .with_document(DocumentCategory::OriginCertificate),
        TransitionRule::new(
            S::DocumentVerification,
            O::VerifyDocuments,
            S::CurrencyApproval,
            &[C::ExporterBank],
        )
        .requires(&[F::BankingApprovalRef, F::BankingApprovedBy]),
        TransitionRule::new(
            S::CurrencyApproval,
            O::ApproveCurrency,
            S::ExportCustomsClearance,
            &[C::NationalBank],
        )
        .requires(&[F::CurrencyApprovalRef, F::CurrencyApprovedBy])
        .with_document(DocumentCategory::Currency),
        TransitionRule::new(
            S::ExportCustomsClearance,
            O::ClearExportCustoms,
            S::ShipmentScheduled,
            &[C::ExportCustoms],
        )
        .requires(&[F::ExportDeclarationNumber, F::ExportClearedBy])
        .with_document(DocumentCategory::Customs),
        TransitionRule::new(S::ShipmentScheduled, O::Ship, S::Shipped, &[C::Carrier])
            .requires(&[F::TransportIdentifier, F::TransportMode, F::DepartureDate])
            .optional(&[F::EstimatedArrivalDate])
            .with_document(DocumentCategory::Shipment),
        TransitionRule::new(S::Shipped, O::MarkArrived, S::Arrived, &[C::Carrier])
            .requires(&[F::ActualArrivalDate]),
        TransitionRule::new(
            S::Arrived,
            O::DeclareImport,
            S::ImportCustomsClearance,
            &[C::Importer],
        )
        .requires(&[F::ImportDeclarationNumber]),
        TransitionRule::new(
            S::ImportCustomsClearance,
            O::ClearImportCustoms,
            S::Delivered,
            &[C::ImportCustoms],
        )
        .requires(&[F::ImportClearedBy])
        .optional(&[F::DeliveryConfirmedBy])
        .with_document(DocumentCategory::Customs),
        TransitionRule::new(
            S::Delivered,
            O::ConfirmPayment,
            S::PaymentReceived,
            &[C::ExporterBank],
        )
        .requires(&[F::PaymentMethod, F::PaymentAmount]),
        TransitionRule::new(
            S::PaymentReceived,
            O::ConfirmRepatriation,
            S::CurrencyRepatriated,
            &[C::NationalBank],
        )
        .requires(&[F::RepatriatedAmount]),
        TransitionRule::new(
            S::CurrencyRepatriated,
            O::Complete,
            S::Completed,
            &[C::ExporterBank],
        ),
    ];

    let rejections = [
        (S::OriginVerification, O::RejectOrigin, S::OriginRejected, C::CommodityExchange),
        (S::LicenseValidation, O::RejectLicense, S::LicenseRejected, C::QualityAuthority),
        (S::QualityCertification, O::RejectQuality, S::QualityRejected, C::QualityAuthority),
        (S::ContractApproval, O::RejectContract, S::ContractRejected, C::QualityAuthority),
        (S::DocumentVerification, O::RejectDocuments, S::DocumentsRejected, C::ExporterBank),
        (S::CurrencyApproval, O::RejectCurrency, S::CurrencyRejected, C::NationalBank),
        (
            S::ExportCustomsClearance,
            O::RejectExportCustoms,
            S::ExportCustomsRejected,
            C::ExportCustoms,
        ),
        (
            S::ImportCustomsClearance,
            O::RejectImportCustoms,
            S::ImportCustomsRejected,
            C::ImportCustoms,
        ),
    ];
    rules.extend(rejections.into_iter().map(|(from, op, to, cap)| {
        TransitionRule::new(from, op, to, &[cap]).requires(&[F::RejectionReason])
    }));

    rules.extend(
        CaseStatus::ALL
            .into_iter()
            .filter(CaseStatus::is_resubmittable)
            .map(|from| {
                TransitionRule::new(from, O::Resubmit, S::Draft, &[C::Exporter])
                    .optional(&[F::Notes])
                    .amendable()
                    .clears(&[F::RejectionReason])
            }),
    );

    rules.extend(
        CaseStatus::ALL
            .into_iter()
            .filter(|status| status.is_pre_shipment() || status.is_resubmittable())
            .map(|from| {
                TransitionRule::new(from, O::Cancel, S::Cancelled, &[C::Exporter, C::ExporterBank])
                    .requires(&[F::CancellationReason])
            }),
    );

    rules
}
