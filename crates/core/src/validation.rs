//! Field-level validation for workflow inputs.
//!
//! Every check is a pure function; nothing here touches the ledger. Inputs
//! must pass these checks before they are allowed to affect a case.

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;

/// Literal prefix carried by every case identifier and primary case key.
pub const CASE_PREFIX: &str = "EXP-";

/// Maximum length of identifiers and generic strings.
pub const MAX_STRING_LENGTH: usize = 500;
/// Maximum length of a coffee type.
pub const MAX_COFFEE_TYPE_LENGTH: usize = 100;
/// Maximum length of a country or region name.
pub const MAX_COUNTRY_NAME_LENGTH: usize = 100;
/// Maximum length of exporter and approver names.
pub const MAX_NAME_LENGTH: usize = 200;
/// Maximum length of license numbers and reference codes.
pub const MAX_LICENSE_NUMBER_LENGTH: usize = 50;
/// Maximum length of reasons and notes.
pub const MAX_REASON_LENGTH: usize = 1000;
/// Maximum length of a quality grade.
pub const MAX_GRADE_LENGTH: usize = 50;
/// Maximum length of an email address.
pub const MAX_EMAIL_LENGTH: usize = 254;
/// Username length bounds.
pub const USERNAME_LENGTH: (usize, usize) = (3, 50);

/// Minimum quantity in kilograms (100 grams).
pub const MIN_QUANTITY: Decimal = Decimal::from_parts(1, 0, 0, false, 1);
/// Maximum quantity in kilograms.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Minimum estimated value in USD.
pub const MIN_ESTIMATED_VALUE: Decimal = Decimal::ONE;
/// Maximum estimated value (and payment amount) in USD.
pub const MAX_ESTIMATED_VALUE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);
/// Maximum number of decimal places for quantities and money.
pub const MAX_DECIMAL_PLACES: u32 = 2;

/// Recognized quality grades.
pub const QUALITY_GRADES: &[&str] = &[
    "Grade 1", "Grade 2", "Grade 3", "Grade 4", "Grade 5", "A", "B", "C", "Premium", "Standard",
];
/// Recognized transport modes.
pub const TRANSPORT_MODES: &[&str] = &["SEA", "AIR", "RAIL"];
/// Recognized payment methods.
pub const PAYMENT_METHODS: &[&str] = &["L/C", "CAD", "ADVANCE", "DP"];

/// Validation errors for workflow inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required value is empty.
    #[error("{field} cannot be empty")]
    Empty {
        /// The offending field.
        field: &'static str,
    },

    /// A value is longer than allowed.
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong {
        /// The offending field.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },

    /// A value is shorter than allowed.
    #[error("{field} must be at least {min} characters")]
    TooShort {
        /// The offending field.
        field: &'static str,
        /// Minimum length in characters.
        min: usize,
    },

    /// A value contains characters outside its allowed set.
    #[error("{field} contains invalid characters")]
    InvalidCharacters {
        /// The offending field.
        field: &'static str,
    },

    /// A value contains control characters other than tab, LF, or CR.
    #[error("{field} contains invalid control characters")]
    ControlCharacters {
        /// The offending field.
        field: &'static str,
    },

    /// A case identifier does not carry the case prefix.
    #[error("case ID must start with {prefix}")]
    MissingPrefix {
        /// The expected prefix.
        prefix: &'static str,
    },

    /// A number falls outside its allowed range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        /// The offending field.
        field: &'static str,
        /// Inclusive minimum.
        min: Decimal,
        /// Inclusive maximum.
        max: Decimal,
    },

    /// A number has too many decimal places.
    #[error("{field} can have at most {max} decimal places")]
    Precision {
        /// The offending field.
        field: &'static str,
        /// Maximum decimal places.
        max: u32,
    },

    /// A value is not a number.
    #[error("{field} is not a valid number: {value}")]
    NotANumber {
        /// The offending field.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A value is not a valid date.
    #[error("{field} is not a valid date: {value}")]
    InvalidDate {
        /// The offending field.
        field: &'static str,
        /// The rejected input.
        value: String,
    },

    /// A value is not part of a fixed vocabulary.
    #[error("{field} must be one of: {allowed}")]
    NotAllowed {
        /// The offending field.
        field: &'static str,
        /// Comma-separated allowed values.
        allowed: String,
    },

    /// An operation-level payload rule was violated.
    #[error("{0}")]
    Rule(String),
}

impl ValidationError {
    /// Create an operation-level rule violation.
    #[must_use]
    pub fn rule(msg: impl Into<String>) -> Self {
        Self::Rule(msg.into())
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        400
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Empty { .. } => "FIELD_EMPTY",
            Self::TooLong { .. } | Self::TooShort { .. } => "FIELD_LENGTH",
            Self::InvalidCharacters { .. } | Self::ControlCharacters { .. } => {
                "INVALID_CHARACTERS"
            }
            Self::MissingPrefix { .. } => "MISSING_CASE_PREFIX",
            Self::OutOfRange { .. } => "OUT_OF_RANGE",
            Self::Precision { .. } => "TOO_MANY_DECIMALS",
            Self::NotANumber { .. } => "NOT_A_NUMBER",
            Self::InvalidDate { .. } => "INVALID_DATE",
            Self::NotAllowed { .. } => "VALUE_NOT_ALLOWED",
            Self::Rule(_) => "PAYLOAD_RULE",
        }
    }
}

/// Result alias for validation checks.
pub type ValidationResult<T = ()> = Result<T, ValidationError>;

fn require_text(field: &'static str, value: &str, max: usize) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn require_charset(
    field: &'static str,
    value: &str,
    allowed: impl Fn(char) -> bool,
) -> ValidationResult {
    if value.chars().all(allowed) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCharacters { field })
    }
}

fn reject_control_characters(field: &'static str, value: &str) -> ValidationResult {
    if contains_control_characters(value) {
        Err(ValidationError::ControlCharacters { field })
    } else {
        Ok(())
    }
}

fn one_of(field: &'static str, value: &str, allowed: &[&str]) -> ValidationResult {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::NotAllowed {
            field,
            allowed: allowed.join(", "),
        })
    }
}

/// Returns true if `s` contains control characters other than tab, LF, or CR.
#[must_use]
pub fn contains_control_characters(s: &str) -> bool {
    s.chars()
        .any(|c| c.is_control() && !matches!(c, '\t' | '\n' | '\r'))
}

/// Returns true if `value` has at most `max_decimals` significant decimal places.
#[must_use]
pub fn has_valid_precision(value: Decimal, max_decimals: u32) -> bool {
    value.normalize().scale() <= max_decimals
}

fn check_decimal(
    field: &'static str,
    value: Decimal,
    min: Decimal,
    max: Decimal,
) -> ValidationResult {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange { field, min, max });
    }
    if !has_valid_precision(value, MAX_DECIMAL_PLACES) {
        return Err(ValidationError::Precision {
            field,
            max: MAX_DECIMAL_PLACES,
        });
    }
    Ok(())
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Validates a case identifier: `EXP-` prefix, alphanumerics, hyphens, underscores.
pub fn validate_case_id(case_id: &str) -> ValidationResult {
    if case_id.is_empty() {
        return Err(ValidationError::Empty { field: "case ID" });
    }
    if case_id.chars().count() > MAX_STRING_LENGTH {
        return Err(ValidationError::TooLong {
            field: "case ID",
            max: MAX_STRING_LENGTH,
        });
    }
    require_charset("case ID", case_id, is_identifier_char)?;
    if !case_id.starts_with(CASE_PREFIX) || case_id.len() == CASE_PREFIX.len() {
        return Err(ValidationError::MissingPrefix {
            prefix: CASE_PREFIX,
        });
    }
    Ok(())
}

/// Validates an exporter identifier used as an owner-index dimension.
pub fn validate_exporter_id(exporter_id: &str) -> ValidationResult {
    if exporter_id.is_empty() {
        return Err(ValidationError::Empty {
            field: "exporter ID",
        });
    }
    if exporter_id.chars().count() > MAX_STRING_LENGTH {
        return Err(ValidationError::TooLong {
            field: "exporter ID",
            max: MAX_STRING_LENGTH,
        });
    }
    require_charset("exporter ID", exporter_id, is_identifier_char)
}

/// Validates the exporter's display name.
pub fn validate_exporter_name(name: &str) -> ValidationResult {
    require_text("exporter name", name, MAX_NAME_LENGTH)?;
    reject_control_characters("exporter name", name)
}

/// Validates the coffee type. Any type is accepted; the vocabulary lives upstream.
pub fn validate_coffee_type(coffee_type: &str) -> ValidationResult {
    require_text("coffee type", coffee_type, MAX_COFFEE_TYPE_LENGTH)?;
    reject_control_characters("coffee type", coffee_type)
}

/// Validates a quantity in kilograms.
pub fn validate_quantity(quantity: Decimal) -> ValidationResult {
    check_decimal("quantity", quantity, MIN_QUANTITY, MAX_QUANTITY)
}

/// Validates an estimated value in USD.
pub fn validate_estimated_value(value: Decimal) -> ValidationResult {
    check_decimal(
        "estimated value",
        value,
        MIN_ESTIMATED_VALUE,
        MAX_ESTIMATED_VALUE,
    )
}

/// Validates a payment or repatriation amount in USD.
pub fn validate_payment_amount(amount: Decimal) -> ValidationResult {
    check_decimal("payment amount", amount, Decimal::ZERO, MAX_ESTIMATED_VALUE)
}

/// Parses a decimal amount supplied as text.
pub fn parse_amount(field: &'static str, value: &str) -> ValidationResult<Decimal> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: value.to_string(),
        })
}

/// Validates a destination country: letters, spaces, and hyphens.
pub fn validate_destination_country(country: &str) -> ValidationResult {
    require_text("destination country", country, MAX_COUNTRY_NAME_LENGTH)?;
    require_charset("destination country", country, |c| {
        c.is_ascii_alphabetic() || c == ' ' || c == '-'
    })
}

/// Validates an origin region name: letters, spaces, and hyphens.
pub fn validate_region(region: &str) -> ValidationResult {
    require_text("region", region, MAX_COUNTRY_NAME_LENGTH)?;
    require_charset("region", region, |c| {
        c.is_ascii_alphabetic() || c == ' ' || c == '-'
    })
}

fn validate_code(field: &'static str, value: &str) -> ValidationResult {
    require_text(field, value, MAX_LICENSE_NUMBER_LENGTH)?;
    require_charset(field, value, |c| {
        c.is_ascii_alphanumeric() || c == '-' || c == '/'
    })
}

/// Validates an export license number: alphanumerics, hyphens, slashes.
pub fn validate_license_number(license_number: &str) -> ValidationResult {
    validate_code("export license number", license_number)
}

/// Validates a reference code such as a lot, declaration, or approval number.
pub fn validate_reference_code(field: &'static str, value: &str) -> ValidationResult {
    validate_code(field, value)
}

/// Validates rejection and cancellation reasons.
pub fn validate_reason(reason: &str) -> ValidationResult {
    require_text("reason", reason, MAX_REASON_LENGTH)?;
    reject_control_characters("reason", reason)
}

/// Validates optional free text such as reviewer notes.
pub fn validate_free_text(field: &'static str, text: &str) -> ValidationResult {
    if text.chars().count() > MAX_REASON_LENGTH {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_REASON_LENGTH,
        });
    }
    reject_control_characters(field, text)
}

/// Validates the name of the person approving or rejecting.
pub fn validate_approver_name(name: &str) -> ValidationResult {
    require_text("approver name", name, MAX_NAME_LENGTH)?;
    reject_control_characters("approver name", name)
}

/// Validates a vessel, flight, or train identifier.
pub fn validate_transport_identifier(identifier: &str) -> ValidationResult {
    require_text("transport identifier", identifier, MAX_STRING_LENGTH)?;
    require_charset("transport identifier", identifier, |c| {
        c.is_ascii_alphanumeric() || c == ' ' || c == '-'
    })
}

/// Validates a quality grade against the standard vocabulary (case-insensitive).
pub fn validate_quality_grade(grade: &str) -> ValidationResult {
    require_text("quality grade", grade, MAX_GRADE_LENGTH)?;
    let normalized = grade.trim();
    if QUALITY_GRADES
        .iter()
        .any(|g| g.eq_ignore_ascii_case(normalized))
    {
        Ok(())
    } else {
        Err(ValidationError::NotAllowed {
            field: "quality grade",
            allowed: QUALITY_GRADES.join(", "),
        })
    }
}

/// Validates a transport mode (SEA, AIR, or RAIL).
pub fn validate_transport_mode(mode: &str) -> ValidationResult {
    one_of("transport mode", mode, TRANSPORT_MODES)
}

/// Validates a payment method (L/C, CAD, ADVANCE, or DP).
pub fn validate_payment_method(method: &str) -> ValidationResult {
    one_of("payment method", method, PAYMENT_METHODS)
}

/// Validates a calendar date (`YYYY-MM-DD`) or an RFC 3339 timestamp.
pub fn validate_date(field: &'static str, value: &str) -> ValidationResult {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    let is_date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(trimmed).is_ok();
    if is_date {
        Ok(())
    } else {
        Err(ValidationError::InvalidDate {
            field,
            value: value.to_string(),
        })
    }
}

/// Validates a content reference (for example an IPFS CID) for a document.
pub fn validate_document_reference(reference: &str) -> ValidationResult {
    require_text("document reference", reference, MAX_STRING_LENGTH)?;
    if reference.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidCharacters {
            field: "document reference",
        });
    }
    reject_control_characters("document reference", reference)
}

/// Validates a username: 3-50 characters of alphanumerics, `.`, `_`, `-`.
pub fn validate_username(username: &str) -> ValidationResult {
    let len = username.chars().count();
    if len == 0 {
        return Err(ValidationError::Empty { field: "username" });
    }
    if len < USERNAME_LENGTH.0 {
        return Err(ValidationError::TooShort {
            field: "username",
            min: USERNAME_LENGTH.0,
        });
    }
    if len > USERNAME_LENGTH.1 {
        return Err(ValidationError::TooLong {
            field: "username",
            max: USERNAME_LENGTH.1,
        });
    }
    require_charset("username", username, |c| {
        c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
    })
}

/// Validates an email address: one `@`, a non-empty local part, a dotted domain.
pub fn validate_email(email: &str) -> ValidationResult {
    require_text("email", email, MAX_EMAIL_LENGTH)?;
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidCharacters { field: "email" });
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidCharacters { field: "email" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_constants() {
        assert_eq!(MIN_QUANTITY, dec!(0.1));
        assert_eq!(MAX_QUANTITY, dec!(1000000));
        assert_eq!(MAX_ESTIMATED_VALUE, dec!(100000000));
    }

    #[rstest]
    #[case("EXP-1")]
    #[case("EXP-2024_ab-9")]
    fn test_case_id_valid(#[case] id: &str) {
        assert!(validate_case_id(id).is_ok());
    }

    #[rstest]
    #[case("", ValidationError::Empty { field: "case ID" })]
    #[case("EXP-1 2", ValidationError::InvalidCharacters { field: "case ID" })]
    #[case("ORD-1", ValidationError::MissingPrefix { prefix: CASE_PREFIX })]
    #[case("EXP-", ValidationError::MissingPrefix { prefix: CASE_PREFIX })]
    fn test_case_id_invalid(#[case] id: &str, #[case] expected: ValidationError) {
        assert_eq!(validate_case_id(id), Err(expected));
    }

    #[test]
    fn test_case_id_too_long() {
        let id = format!("EXP-{}", "a".repeat(MAX_STRING_LENGTH));
        assert!(matches!(
            validate_case_id(&id),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(validate_quantity(dec!(0.1)).is_ok());
        assert!(validate_quantity(dec!(1000000)).is_ok());
        assert!(validate_quantity(dec!(19200.50)).is_ok());
        assert!(matches!(
            validate_quantity(dec!(0.09)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_quantity(dec!(1000000.01)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_quantity(dec!(10.123)),
            Err(ValidationError::Precision { .. })
        ));
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_precision() {
        assert!(validate_estimated_value(dec!(150.1000)).is_ok());
    }

    #[test]
    fn test_estimated_value_bounds() {
        assert!(validate_estimated_value(dec!(1)).is_ok());
        assert!(validate_estimated_value(dec!(0.99)).is_err());
        assert!(validate_estimated_value(dec!(100000000.01)).is_err());
    }

    #[test]
    fn test_payment_amount_allows_zero_but_not_negative() {
        assert!(validate_payment_amount(Decimal::ZERO).is_ok());
        assert!(validate_payment_amount(dec!(-1)).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("payment amount", " 125.50 "), Ok(dec!(125.50)));
        assert!(matches!(
            parse_amount("payment amount", "lots"),
            Err(ValidationError::NotANumber { .. })
        ));
    }

    #[test]
    fn test_destination_country() {
        assert!(validate_destination_country("United States").is_ok());
        assert!(validate_destination_country("Guinea-Bissau").is_ok());
        assert!(validate_destination_country("Germany1").is_err());
        assert!(validate_destination_country("   ").is_err());
    }

    #[test]
    fn test_license_number() {
        assert!(validate_license_number("ECTA/LIC-2024/001").is_ok());
        assert!(validate_license_number("LIC 001").is_err());
        assert!(validate_license_number(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_reason_rejects_control_characters() {
        assert!(validate_reason("Moisture content too high\nretest").is_ok());
        assert_eq!(
            validate_reason("bad\u{0007}"),
            Err(ValidationError::ControlCharacters { field: "reason" })
        );
        assert!(validate_reason("").is_err());
    }

    #[rstest]
    #[case("Grade 1", true)]
    #[case("grade 2", true)]
    #[case(" Premium ", true)]
    #[case("a", true)]
    #[case("Grade 9", false)]
    #[case("Excellent", false)]
    fn test_quality_grade(#[case] grade: &str, #[case] ok: bool) {
        assert_eq!(validate_quality_grade(grade).is_ok(), ok);
    }

    #[test]
    fn test_transport_mode_and_payment_method() {
        assert!(validate_transport_mode("SEA").is_ok());
        assert!(validate_transport_mode("ROAD").is_err());
        assert!(validate_payment_method("L/C").is_ok());
        assert!(validate_payment_method("CASH").is_err());
    }

    #[test]
    fn test_transport_identifier() {
        assert!(validate_transport_identifier("MSC AURORA-221").is_ok());
        assert!(validate_transport_identifier("MSC#221").is_err());
    }

    #[test]
    fn test_dates() {
        assert!(validate_date("departure date", "2026-03-01").is_ok());
        assert!(validate_date("departure date", "2026-03-01T08:00:00Z").is_ok());
        assert!(validate_date("departure date", "01/03/2026").is_err());
        assert!(validate_date("departure date", "").is_err());
    }

    #[test]
    fn test_document_reference() {
        assert!(validate_document_reference("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").is_ok());
        assert!(validate_document_reference("has space").is_err());
    }

    #[test]
    fn test_username_and_email() {
        assert!(validate_username("exporter.one").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_email("ops@exporter.et").is_ok());
        assert!(validate_email("ops@exporter").is_err());
        assert!(validate_email("ops@@exporter.et").is_err());
        assert!(validate_email("@exporter.et").is_err());
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::TooLong {
            field: "coffee type",
            max: 100,
        };
        assert_eq!(
            err.to_string(),
            "coffee type exceeds maximum length of 100 characters"
        );
    }
}
