//! Typed identifiers for type-safe record references.
//!
//! Ledger keys are plain strings; wrapping them prevents accidentally passing a
//! `UserId` where a `CaseId` is expected.

use serde::{Deserialize, Serialize};

/// Macro to generate typed string identifier wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            ///
            /// No validation happens here; the validation layer checks the
            /// format before an identifier reaches the ledger.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

typed_id!(CaseId, "Unique identifier for an export case (`EXP-` prefixed).");
typed_id!(UserId, "Unique identifier for a registered user.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
