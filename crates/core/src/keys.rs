//! Persisted key layout.
//!
//! Primary case records live under the literal `EXP-` prefix. Secondary index
//! entries use composite keys of the form `\0namespace\0part\0part\0`, which
//! sort before every primary key and never collide with them.

use thiserror::Error;

use crate::validation::CASE_PREFIX;

/// Delimiter between composite key segments.
pub const COMPOSITE_DELIMITER: char = '\u{0}';

/// Highest Unicode scalar; closes an open-ended partial-key range.
pub const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

/// Owner index: exporter identifier to case.
pub const EXPORTER_INDEX: &str = "exporter~export";
/// Owner index: creating organization to case.
pub const ORGANIZATION_INDEX: &str = "org~export";
/// Uniqueness index: username to user identifier.
pub const USERNAME_INDEX: &str = "username";
/// Uniqueness index: email to user identifier.
pub const EMAIL_INDEX: &str = "email";
/// Namespace of primary user records.
pub const USER_NAMESPACE: &str = "user";

/// Prefix of region-to-mode configuration records.
pub const REGION_MODE_PREFIX: &str = "REGION-MODE-";

/// Value stored under every owner-index key.
pub const INDEX_MARKER: &[u8] = &[0x00];

/// Errors raised while building or splitting composite keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Composite key namespace is empty.
    #[error("composite key namespace cannot be empty")]
    EmptyNamespace,

    /// A namespace or part contains the delimiter byte.
    #[error("composite key segment {segment:?} contains a NUL byte")]
    ContainsDelimiter {
        /// The offending segment.
        segment: String,
    },

    /// The key is not in composite layout.
    #[error("{key:?} is not a composite key")]
    NotComposite {
        /// The offending key.
        key: String,
    },
}

fn check_segment(segment: &str) -> Result<(), KeyError> {
    if segment.contains(COMPOSITE_DELIMITER) {
        Err(KeyError::ContainsDelimiter {
            segment: segment.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Builds a composite key from a namespace and its parts.
pub fn composite_key(namespace: &str, parts: &[&str]) -> Result<String, KeyError> {
    if namespace.is_empty() {
        return Err(KeyError::EmptyNamespace);
    }
    check_segment(namespace)?;

    let mut key = String::with_capacity(
        namespace.len() + parts.iter().map(|p| p.len() + 1).sum::<usize>() + 2,
    );
    key.push(COMPOSITE_DELIMITER);
    key.push_str(namespace);
    key.push(COMPOSITE_DELIMITER);
    for part in parts {
        check_segment(part)?;
        key.push_str(part);
        key.push(COMPOSITE_DELIMITER);
    }
    Ok(key)
}

/// Splits a composite key back into its namespace and parts.
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>), KeyError> {
    let not_composite = || KeyError::NotComposite {
        key: key.to_string(),
    };

    let body = key
        .strip_prefix(COMPOSITE_DELIMITER)
        .and_then(|rest| rest.strip_suffix(COMPOSITE_DELIMITER))
        .ok_or_else(not_composite)?;

    let mut segments = body.split(COMPOSITE_DELIMITER);
    let namespace = segments
        .next()
        .filter(|ns| !ns.is_empty())
        .ok_or_else(not_composite)?;
    Ok((
        namespace.to_string(),
        segments.map(str::to_string).collect(),
    ))
}

/// Returns the half-open key range covering every composite key that starts
/// with `namespace` followed by `parts`.
pub fn partial_composite_range(
    namespace: &str,
    parts: &[&str],
) -> Result<(String, String), KeyError> {
    let start = composite_key(namespace, parts)?;
    let mut end = start.clone();
    end.push(MAX_UNICODE_RUNE);
    Ok((start, end))
}

/// Half-open key range covering every primary case record.
///
/// Case identifiers only use `[A-Za-z0-9_-]`, all of which sort below `~`.
#[must_use]
pub fn case_range() -> (String, String) {
    (CASE_PREFIX.to_string(), format!("{CASE_PREFIX}~"))
}

/// Key of the region-to-mode mapping for `region`.
#[must_use]
pub fn region_mode_key(region: &str) -> String {
    format!("{REGION_MODE_PREFIX}{region}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_layout() {
        let key = composite_key(EXPORTER_INDEX, &["EXPORTER-7", "EXP-1"]).unwrap();
        assert_eq!(key, "\u{0}exporter~export\u{0}EXPORTER-7\u{0}EXP-1\u{0}");
    }

    #[test]
    fn test_composite_key_without_parts() {
        let key = composite_key(USER_NAMESPACE, &[]).unwrap();
        assert_eq!(key, "\u{0}user\u{0}");
        let (ns, parts) = split_composite_key(&key).unwrap();
        assert_eq!(ns, "user");
        assert!(parts.is_empty());
    }

    #[test]
    fn test_composite_key_rejects_nul() {
        assert_eq!(
            composite_key(EMAIL_INDEX, &["a\u{0}b"]),
            Err(KeyError::ContainsDelimiter {
                segment: "a\u{0}b".to_string()
            })
        );
        assert_eq!(composite_key("", &["x"]), Err(KeyError::EmptyNamespace));
    }

    #[test]
    fn test_split_rejects_primary_keys() {
        assert!(matches!(
            split_composite_key("EXP-1"),
            Err(KeyError::NotComposite { .. })
        ));
    }

    #[test]
    fn test_partial_range_contains_matching_keys_only() {
        let (start, end) = partial_composite_range(EXPORTER_INDEX, &["E1"]).unwrap();
        let inside = composite_key(EXPORTER_INDEX, &["E1", "EXP-9"]).unwrap();
        let other_owner = composite_key(EXPORTER_INDEX, &["E10", "EXP-9"]).unwrap();
        let other_ns = composite_key(ORGANIZATION_INDEX, &["E1", "EXP-9"]).unwrap();

        assert!(start <= inside && inside < end);
        assert!(!(start <= other_owner && other_owner < end));
        assert!(!(start <= other_ns && other_ns < end));
    }

    #[test]
    fn test_case_range_excludes_composite_and_region_keys() {
        let (start, end) = case_range();
        for key in ["EXP-1", "EXP-zz_9", "EXP-A-B"] {
            assert!(start.as_str() <= key && key < end.as_str());
        }
        let composite = composite_key(EXPORTER_INDEX, &["E", "EXP-1"]).unwrap();
        let region = region_mode_key("Sidama");
        assert!(composite < start);
        assert!(!(start <= region && region < end));
    }
}
