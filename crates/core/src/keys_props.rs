//! Property-based tests for composite keys.

use proptest::prelude::*;

use crate::keys::{composite_key, partial_composite_range, split_composite_key};

fn arb_segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9~_@. -]{0,24}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Splitting a composite key yields exactly the namespace and parts it was built from.
    #[test]
    fn prop_split_inverts_compose(
        namespace in "[a-z~]{1,16}",
        parts in prop::collection::vec(arb_segment(), 0..5),
    ) {
        let borrowed: Vec<&str> = parts.iter().map(String::as_str).collect();
        let key = composite_key(&namespace, &borrowed).unwrap();
        let (ns, split) = split_composite_key(&key).unwrap();
        prop_assert_eq!(ns, namespace);
        prop_assert_eq!(split, parts);
    }

    /// Every key extending a partial key falls inside its range.
    #[test]
    fn prop_partial_range_covers_extensions(
        namespace in "[a-z~]{1,16}",
        prefix in prop::collection::vec(arb_segment(), 0..3),
        suffix in prop::collection::vec(arb_segment(), 0..3),
    ) {
        let prefix_refs: Vec<&str> = prefix.iter().map(String::as_str).collect();
        let full: Vec<&str> = prefix
            .iter()
            .chain(suffix.iter())
            .map(String::as_str)
            .collect();
        let (start, end) = partial_composite_range(&namespace, &prefix_refs).unwrap();
        let key = composite_key(&namespace, &full).unwrap();
        prop_assert!(start <= key);
        prop_assert!(key < end);
    }
}
