//! Reconstructed past states of a case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::case::ExportCase;

/// The case as it stood after one committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    /// Transaction that produced this state.
    pub tx_id: String,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
    /// True if the mutation deleted the record.
    pub is_delete: bool,
    /// The record after the mutation; `None` for deletions.
    pub value: Option<ExportCase>,
}

impl HistorySnapshot {
    /// Status after the mutation, if the record still existed.
    #[must_use]
    pub fn status(&self) -> Option<crate::workflow::CaseStatus> {
        self.value.as_ref().map(|case| case.status)
    }
}
