//! Capabilities and the organization-to-capability mapping.
//!
//! Transition rules never name organizations. Each rule lists the abstract
//! capabilities allowed to take it, and a [`CapabilityMap`] resolves the
//! caller's organization label into the capabilities it holds.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflow::table::TableError;

/// An abstract permission held by an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Creates and submits cases, uploads documents.
    Exporter,
    /// Verifies origin and lots.
    CommodityExchange,
    /// Licenses, certifies quality, approves contracts.
    QualityAuthority,
    /// The exporter's commercial bank.
    ExporterBank,
    /// The central bank approving foreign exchange.
    NationalBank,
    /// Customs at the origin.
    ExportCustoms,
    /// Shipping line.
    Carrier,
    /// The buyer.
    Importer,
    /// Customs at the destination.
    ImportCustoms,
    /// Maintains registry data such as region-to-mode mappings.
    RegistryAdmin,
}

impl Capability {
    /// Every capability.
    pub const ALL: [Self; 10] = [
        Self::Exporter,
        Self::CommodityExchange,
        Self::QualityAuthority,
        Self::ExporterBank,
        Self::NationalBank,
        Self::ExportCustoms,
        Self::Carrier,
        Self::Importer,
        Self::ImportCustoms,
        Self::RegistryAdmin,
    ];

    /// Returns the configuration name of the capability.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exporter => "exporter",
            Self::CommodityExchange => "commodity_exchange",
            Self::QualityAuthority => "quality_authority",
            Self::ExporterBank => "exporter_bank",
            Self::NationalBank => "national_bank",
            Self::ExportCustoms => "export_customs",
            Self::Carrier => "carrier",
            Self::Importer => "importer",
            Self::ImportCustoms => "import_customs",
            Self::RegistryAdmin => "registry_admin",
        }
    }

    /// Parses a capability from its configuration name.
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|cap| cap.as_str() == normalized)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of capabilities.
pub type CapabilitySet = BTreeSet<Capability>;

/// Builds a capability set from a slice.
#[must_use]
pub fn caps(items: &[Capability]) -> CapabilitySet {
    items.iter().copied().collect()
}

/// Resolves organization labels to capability sets.
///
/// Unknown organizations resolve to the empty set.
#[derive(Debug, Clone, Default)]
pub struct CapabilityMap {
    organizations: HashMap<String, CapabilitySet>,
}

impl CapabilityMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `capabilities` to `organization`, extending any existing grant.
    #[must_use]
    pub fn grant(mut self, organization: impl Into<String>, capabilities: &[Capability]) -> Self {
        self.organizations
            .entry(organization.into())
            .or_default()
            .extend(capabilities.iter().copied());
        self
    }

    /// The standard mapping for the export network's MSP identifiers.
    #[must_use]
    pub fn standard() -> Self {
        use Capability::{
            Carrier, CommodityExchange, ExportCustoms, Exporter, ExporterBank, ImportCustoms,
            Importer, NationalBank, QualityAuthority, RegistryAdmin,
        };

        Self::new()
            .grant("ExporterMSP", &[Exporter])
            .grant("CommercialBankMSP", &[Exporter, ExporterBank])
            .grant("ECXMSP", &[CommodityExchange])
            .grant("ECTAMSP", &[QualityAuthority, RegistryAdmin])
            .grant("NationalBankMSP", &[NationalBank])
            .grant("CustomAuthoritiesMSP", &[ExportCustoms])
            .grant("ShippingLineMSP", &[Carrier])
            .grant("ImporterMSP", &[Importer])
            .grant("ImportCustomsMSP", &[ImportCustoms])
            .grant("AdminMSP", &[RegistryAdmin])
    }

    /// Builds a map from `(organization, capability names)` entries.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let mut map = Self::new();
        for (organization, names) in entries {
            let parsed = names
                .iter()
                .map(|name| {
                    Capability::parse(name).ok_or_else(|| TableError::UnknownCapability(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            map = map.grant(organization, &parsed);
        }
        Ok(map)
    }

    /// Returns the capabilities held by `organization`.
    #[must_use]
    pub fn capabilities_of(&self, organization: &str) -> CapabilitySet {
        self.organizations
            .get(organization)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns true if `organization` holds at least one of `allowed`.
    #[must_use]
    pub fn permits(&self, organization: &str, allowed: &CapabilitySet) -> bool {
        self.organizations
            .get(organization)
            .is_some_and(|held| !held.is_disjoint(allowed))
    }

    /// Returns true if `organization` holds `capability`.
    #[must_use]
    pub fn has(&self, organization: &str, capability: Capability) -> bool {
        self.organizations
            .get(organization)
            .is_some_and(|held| held.contains(&capability))
    }

    /// Number of organizations in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.organizations.len()
    }

    /// Returns true if no organization is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
    }
}
