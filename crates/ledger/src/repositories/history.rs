//! Audit history reconstruction.

use std::sync::Arc;

use exportflow_core::history::HistorySnapshot;
use exportflow_core::validation;
use exportflow_core::workflow::WorkflowError;

use super::cases::decode_case;
use crate::store::{KeyModification, RecordStore};

/// Lazily decoded history of one case, oldest first.
///
/// Yields an error for the first malformed entry and stops there.
#[derive(Debug)]
pub struct HistoryIter {
    key: String,
    entries: std::vec::IntoIter<KeyModification>,
    failed: bool,
}

impl Iterator for HistoryIter {
    type Item = Result<HistorySnapshot, WorkflowError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let entry = self.entries.next()?;
        let value = match (&entry.value, entry.is_delete) {
            (Some(bytes), false) => match decode_case(&self.key, bytes) {
                Ok(case) => Some(case),
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            },
            _ => None,
        };
        Some(Ok(HistorySnapshot {
            tx_id: entry.tx_id,
            timestamp: entry.timestamp,
            is_delete: entry.is_delete,
            value,
        }))
    }
}

/// Reads case history from a record store.
pub struct HistoryReader<S: RecordStore + ?Sized> {
    store: Arc<S>,
}

impl<S: RecordStore + ?Sized> std::fmt::Debug for HistoryReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryReader").finish_non_exhaustive()
    }
}

impl<S: RecordStore + ?Sized> HistoryReader<S> {
    /// Creates a new history reader.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Iterate the history of a case. Each call starts from the beginning.
    ///
    /// An unknown case has an empty history.
    pub fn iter(&self, case_id: &str) -> Result<HistoryIter, WorkflowError> {
        validation::validate_case_id(case_id)?;
        Ok(HistoryIter {
            key: case_id.to_string(),
            entries: self.store.history(case_id)?.into_iter(),
            failed: false,
        })
    }

    /// Every snapshot of a case.
    ///
    /// # Errors
    /// * `MalformedRecord` if any historical value does not decode
    pub fn snapshots(&self, case_id: &str) -> Result<Vec<HistorySnapshot>, WorkflowError> {
        self.iter(case_id)?.collect()
    }
}
