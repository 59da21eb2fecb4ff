//! Mode-dependent document checklist.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::types::{Completeness, DocumentKind, DocumentStatus, ExportMode};

/// Per-case required-document snapshot.
///
/// The set of required kinds is fixed by the mode at construction. Kinds that
/// do not apply to the mode are `NotRequired` and stay that way regardless of
/// later uploads or reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChecklist {
    /// Mode the checklist was built for.
    pub mode: ExportMode,
    /// Status per document kind.
    pub entries: BTreeMap<DocumentKind, DocumentStatus>,
}

impl DocumentChecklist {
    /// Builds the initial checklist for `mode`.
    #[must_use]
    pub fn for_mode(mode: ExportMode) -> Self {
        let entries = DocumentKind::ALL
            .into_iter()
            .map(|kind| {
                let status = if kind.is_required_for(mode) {
                    DocumentStatus::Pending
                } else {
                    DocumentStatus::NotRequired
                };
                (kind, status)
            })
            .collect();
        Self { mode, entries }
    }

    /// Returns the checklist status of `kind`.
    #[must_use]
    pub fn status_of(&self, kind: DocumentKind) -> DocumentStatus {
        self.entries
            .get(&kind)
            .copied()
            .unwrap_or(DocumentStatus::NotRequired)
    }

    /// Required kinds that are neither uploaded nor verified, in kind order.
    #[must_use]
    pub fn missing(&self) -> Vec<DocumentKind> {
        self.entries
            .iter()
            .filter(|(_, status)| **status != DocumentStatus::NotRequired && !status.is_satisfied())
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Returns true if every required kind is uploaded or verified.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Completeness verdict with the missing list.
    #[must_use]
    pub fn completeness(&self) -> Completeness {
        let missing_docs = self.missing();
        Completeness {
            is_complete: missing_docs.is_empty(),
            missing_docs,
        }
    }

    fn update(&mut self, kind: DocumentKind, next: impl FnOnce(DocumentStatus) -> DocumentStatus) {
        if let Some(status) = self.entries.get_mut(&kind)
            && *status != DocumentStatus::NotRequired
        {
            *status = next(*status);
        }
    }

    /// Records an upload: `Pending` and `Rejected` become `Uploaded`.
    pub fn record_upload(&mut self, kind: DocumentKind) -> DocumentStatus {
        self.update(kind, |current| match current {
            DocumentStatus::Pending | DocumentStatus::Rejected => DocumentStatus::Uploaded,
            other => other,
        });
        self.status_of(kind)
    }

    /// Records a successful review.
    pub fn record_verification(&mut self, kind: DocumentKind) -> DocumentStatus {
        self.update(kind, |_| DocumentStatus::Verified);
        self.status_of(kind)
    }

    /// Records a rejected review. A verified entry may be demoted.
    pub fn record_rejection(&mut self, kind: DocumentKind) -> DocumentStatus {
        self.update(kind, |_| DocumentStatus::Rejected);
        self.status_of(kind)
    }
}
