//! Property-based tests for field validation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::validation::{
    CASE_PREFIX, MAX_DECIMAL_PLACES, MAX_QUANTITY, MIN_QUANTITY, ValidationError,
    contains_control_characters, has_valid_precision, validate_case_id, validate_quantity,
    validate_reason,
};

/// Strategy for quantities with exactly two decimal places inside the allowed range.
fn arb_valid_quantity() -> impl Strategy<Value = Decimal> {
    (10i64..=100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for control characters that are never allowed.
fn arb_forbidden_control() -> impl Strategy<Value = char> {
    prop_oneof![
        (0u32..9).prop_map(|c| char::from_u32(c).unwrap_or('\0')),
        Just('\u{000B}'),
        Just('\u{000C}'),
        (14u32..32).prop_map(|c| char::from_u32(c).unwrap_or('\0')),
        Just('\u{007F}'),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any suffix of identifier characters after the prefix is a valid case ID.
    #[test]
    fn prop_prefixed_ids_are_valid(suffix in "[A-Za-z0-9_-]{1,64}") {
        let id = format!("{CASE_PREFIX}{suffix}");
        prop_assert!(validate_case_id(&id).is_ok());
    }

    /// IDs that do not start with the prefix are rejected.
    #[test]
    fn prop_unprefixed_ids_are_rejected(id in "[A-DF-Za-z0-9][A-Za-z0-9_-]{0,32}") {
        prop_assert_eq!(
            validate_case_id(&id),
            Err(ValidationError::MissingPrefix { prefix: CASE_PREFIX })
        );
    }

    /// Every two-decimal quantity in range is accepted.
    #[test]
    fn prop_quantities_in_range_accepted(quantity in arb_valid_quantity()) {
        prop_assert!(quantity >= MIN_QUANTITY && quantity <= MAX_QUANTITY);
        prop_assert!(validate_quantity(quantity).is_ok());
    }

    /// A third significant decimal place is always rejected.
    #[test]
    fn prop_three_decimals_rejected(units in 1i64..1_000_000i64, last in 1i64..10i64) {
        let quantity = Decimal::new(units * 10 + last, 3);
        prop_assert!(!has_valid_precision(quantity, MAX_DECIMAL_PLACES));
        prop_assert!(validate_quantity(quantity).is_err());
    }

    /// A forbidden control character anywhere in a reason is rejected.
    #[test]
    fn prop_control_characters_rejected(
        prefix in "[a-zA-Z ]{1,20}",
        ctrl in arb_forbidden_control(),
        suffix in "[a-zA-Z ]{0,20}",
    ) {
        let reason = format!("{prefix}{ctrl}{suffix}");
        prop_assert!(contains_control_characters(&reason));
        prop_assert_eq!(
            validate_reason(&reason),
            Err(ValidationError::ControlCharacters { field: "reason" })
        );
    }

    /// Tabs and line breaks are allowed in reasons.
    #[test]
    fn prop_whitespace_controls_allowed(words in prop::collection::vec("[a-z]{1,8}", 1..6)) {
        let reason = words.join("\t\r\n");
        prop_assert!(validate_reason(&reason).is_ok());
    }
}
