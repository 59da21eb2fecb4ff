//! Bulk case queries.
//!
//! Scans are best-effort: a stored value that does not decode as a case is
//! skipped, reported to [`ScanMetrics`], and logged. Single-record reads and
//! history reconstruction fail on the same input instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use exportflow_core::documents::{ExportMode, ModeUsageReport};
use exportflow_core::keys;
use exportflow_core::workflow::{CaseStatus, ExportCase, WorkflowError};
use tracing::warn;

use crate::store::{RecordStore, Selector};

/// Observes records skipped by bulk scans.
pub trait ScanMetrics: Send + Sync {
    /// A stored value under `key` did not decode.
    fn record_skipped(&self, key: &str, reason: &str);
}

/// Counts skipped records.
#[derive(Debug, Default)]
pub struct SkippedRecordCounter {
    skipped: AtomicU64,
}

impl SkippedRecordCounter {
    /// Create a counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records skipped so far.
    pub fn count(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

impl ScanMetrics for SkippedRecordCounter {
    fn record_skipped(&self, _key: &str, _reason: &str) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Read-only queries over every case.
pub struct CaseQueries<S: RecordStore + ?Sized> {
    store: Arc<S>,
    metrics: Arc<dyn ScanMetrics>,
}

impl<S: RecordStore + ?Sized> std::fmt::Debug for CaseQueries<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseQueries").finish_non_exhaustive()
    }
}

impl<S: RecordStore + ?Sized> CaseQueries<S> {
    /// Creates queries reporting skipped records to `metrics`.
    #[must_use]
    pub fn new(store: Arc<S>, metrics: Arc<dyn ScanMetrics>) -> Self {
        Self { store, metrics }
    }

    fn decode_all(&self, entries: Vec<(String, Vec<u8>)>) -> Vec<ExportCase> {
        entries
            .into_iter()
            .filter_map(|(key, bytes)| match serde_json::from_slice::<ExportCase>(&bytes) {
                Ok(case) => Some(case),
                Err(err) => {
                    let reason = err.to_string();
                    warn!(key = %key, error = %reason, "Skipping malformed record");
                    self.metrics.record_skipped(&key, &reason);
                    None
                }
            })
            .collect()
    }

    /// Every case, in key order.
    pub fn all_cases(&self) -> Result<Vec<ExportCase>, WorkflowError> {
        let (start, end) = keys::case_range();
        Ok(self.decode_all(self.store.scan(&start, &end)?))
    }

    /// Cases in `status`, via a field selector.
    ///
    /// Only keys inside the case range are considered, so the result agrees
    /// with [`Self::all_cases`].
    pub fn by_status(&self, status: CaseStatus) -> Result<Vec<ExportCase>, WorkflowError> {
        let (start, end) = keys::case_range();
        let selector = Selector::field_equals("status", status.as_str());
        let entries = self
            .store
            .query(&selector)?
            .into_iter()
            .filter(|(key, _)| start.as_str() <= key.as_str() && key.as_str() < end.as_str())
            .collect();
        let cases = self.decode_all(entries);
        Ok(cases.into_iter().filter(|case| case.status == status).collect())
    }

    /// Cases that selected `mode`.
    pub fn by_mode(&self, mode: ExportMode) -> Result<Vec<ExportCase>, WorkflowError> {
        Ok(self
            .all_cases()?
            .into_iter()
            .filter(|case| case.export_mode == Some(mode))
            .collect())
    }

    /// Cases whose document completeness equals `complete`.
    ///
    /// Cases without a checklist count as incomplete.
    pub fn by_document_completeness(
        &self,
        complete: bool,
    ) -> Result<Vec<ExportCase>, WorkflowError> {
        Ok(self
            .all_cases()?
            .into_iter()
            .filter(|case| case.is_document_complete() == complete)
            .collect())
    }

    /// Counts and shares of each export mode.
    pub fn mode_usage_report(
        &self,
        generated_at: DateTime<Utc>,
    ) -> Result<ModeUsageReport, WorkflowError> {
        let cases = self.all_cases()?;
        Ok(ModeUsageReport::from_cases(&cases, generated_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_counts() {
        let counter = SkippedRecordCounter::new();
        counter.record_skipped("EXP-1", "bad");
        counter.record_skipped("EXP-2", "bad");
        assert_eq!(counter.count(), 2);
    }
}
