//! Operation payloads.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationResult};
use crate::workflow::case::{CaseField, ExportCase};

/// Replacement business fields accepted on resubmission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Amendments {
    /// New coffee type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coffee_type: Option<String>,
    /// New quantity in kilograms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    /// New destination country.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_country: Option<String>,
    /// New estimated value in USD.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_value: Option<Decimal>,
}

impl Amendments {
    /// Returns true if nothing is amended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coffee_type.is_none()
            && self.quantity.is_none()
            && self.destination_country.is_none()
            && self.estimated_value.is_none()
    }

    /// Validates every present replacement.
    pub fn validate(&self) -> ValidationResult {
        if let Some(coffee_type) = &self.coffee_type {
            validation::validate_coffee_type(coffee_type)?;
        }
        if let Some(quantity) = self.quantity {
            validation::validate_quantity(quantity)?;
        }
        if let Some(country) = &self.destination_country {
            validation::validate_destination_country(country)?;
        }
        if let Some(value) = self.estimated_value {
            validation::validate_estimated_value(value)?;
        }
        Ok(())
    }

    /// Overwrites the amended fields on `case`.
    pub fn apply_to(&self, case: &mut ExportCase) {
        if let Some(coffee_type) = &self.coffee_type {
            case.coffee_type.clone_from(coffee_type);
        }
        if let Some(quantity) = self.quantity {
            case.quantity = quantity;
        }
        if let Some(country) = &self.destination_country {
            case.destination_country.clone_from(country);
        }
        if let Some(value) = self.estimated_value {
            case.estimated_value = value;
        }
    }
}

/// Data accompanying a transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPayload {
    /// Stage-specific fields to merge into the case.
    #[serde(default)]
    pub fields: BTreeMap<CaseField, String>,
    /// Content reference of the document appended by the transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Business field replacements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amendments: Option<Amendments>,
}

impl TransitionPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field value.
    #[must_use]
    pub fn with(mut self, field: CaseField, value: impl Into<String>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    /// Attaches a document reference.
    #[must_use]
    pub fn with_document(mut self, reference: impl Into<String>) -> Self {
        self.document = Some(reference.into());
        self
    }

    /// Attaches amendments.
    #[must_use]
    pub fn with_amendments(mut self, amendments: Amendments) -> Self {
        self.amendments = Some(amendments);
        self
    }
}
