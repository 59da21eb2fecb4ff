//! In-memory versioned ledger.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use exportflow_core::clock::{Clock, SystemClock};
use tracing::{debug, warn};

use crate::events::{EventSink, TracingEventSink};
use crate::store::{
    CommitReceipt, KeyModification, RecordStore, Selector, StoreError, Version, VersionedValue,
    Write, WriteBatch,
};

#[derive(Debug, Default)]
struct LedgerState {
    records: BTreeMap<String, VersionedValue>,
    history: HashMap<String, Vec<KeyModification>>,
    sequence: Version,
    last_commit: Option<DateTime<Utc>>,
}

/// Thread-safe [`RecordStore`] kept entirely in memory.
///
/// Commits are serialized behind a write lock; reads share a read lock.
/// Commit timestamps never go backwards even if the clock does.
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLedger").finish_non_exhaustive()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(TracingEventSink))
    }
}

impl MemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
            clock,
            sink,
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read_state()?.records.len())
    }

    /// Returns true if no key is live.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Write raw bytes outside of any transaction.
    ///
    /// Bypasses read-set validation and records a history entry like any
    /// other commit. Meant for loading fixtures and legacy data.
    pub fn put_raw(&self, key: &str, value: Vec<u8>) -> Result<CommitReceipt, StoreError> {
        self.commit(WriteBatch {
            tx_id: uuid::Uuid::now_v7().to_string(),
            writes: BTreeMap::from([(key.to_string(), Write::Put(value))]),
            ..WriteBatch::default()
        })
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, LedgerState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("ledger lock poisoned".to_string()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("ledger lock poisoned".to_string()))
    }
}

impl RecordStore for MemoryLedger {
    fn read(&self, key: &str) -> Result<Option<VersionedValue>, StoreError> {
        Ok(self.read_state()?.records.get(key).cloned())
    }

    fn scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        if start >= end {
            return Ok(Vec::new());
        }
        let state = self.read_state()?;
        Ok(state
            .records
            .range::<str, _>((
                std::ops::Bound::Included(start),
                std::ops::Bound::Excluded(end),
            ))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect())
    }

    fn query(&self, selector: &Selector) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let state = self.read_state()?;
        Ok(state
            .records
            .iter()
            .filter(|(_, entry)| selector.matches_bytes(&entry.value))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect())
    }

    fn history(&self, key: &str) -> Result<Vec<KeyModification>, StoreError> {
        Ok(self
            .read_state()?
            .history
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
        let receipt = {
            let mut state = self.write_state()?;

            for (key, observed) in &batch.reads {
                let current = state.records.get(key).map(|entry| entry.version);
                if current != *observed {
                    debug!(tx_id = %batch.tx_id, key = %key, "Read conflict, rejecting commit");
                    return Err(StoreError::Conflict { key: key.clone() });
                }
            }
            if batch.writes.keys().any(String::is_empty) {
                return Err(StoreError::EmptyKey);
            }

            let now = self.clock.now();
            let timestamp = state.last_commit.map_or(now, |last| last.max(now));
            state.sequence += 1;
            let version = state.sequence;

            for (key, write) in &batch.writes {
                let modification = match write {
                    Write::Put(value) => {
                        state.records.insert(
                            key.clone(),
                            VersionedValue {
                                value: value.clone(),
                                version,
                            },
                        );
                        KeyModification {
                            tx_id: batch.tx_id.clone(),
                            timestamp,
                            is_delete: false,
                            value: Some(value.clone()),
                        }
                    }
                    Write::Delete => {
                        state.records.remove(key);
                        KeyModification {
                            tx_id: batch.tx_id.clone(),
                            timestamp,
                            is_delete: true,
                            value: None,
                        }
                    }
                };
                state
                    .history
                    .entry(key.clone())
                    .or_default()
                    .push(modification);
            }
            state.last_commit = Some(timestamp);

            debug!(
                tx_id = %batch.tx_id,
                version,
                writes = batch.writes.len(),
                "Committed"
            );
            CommitReceipt {
                tx_id: batch.tx_id.clone(),
                version,
                timestamp,
            }
        };

        if let Some(event) = &batch.event
            && let Err(err) = self.sink.publish(event)
        {
            warn!(tx_id = %event.tx_id, event = %event.name, error = %err, "Event delivery failed");
        }
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{RecordingEventSink, SinkError};
    use crate::store::LedgerEvent;
    use chrono::TimeZone;
    use exportflow_core::clock::ManualClock;

    fn ledger() -> (MemoryLedger, Arc<RecordingEventSink>) {
        let sink = Arc::new(RecordingEventSink::new());
        let clock = ManualClock::starting_at(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        (MemoryLedger::new(Arc::new(clock), sink.clone()), sink)
    }

    fn put(key: &str, value: &str) -> WriteBatch {
        WriteBatch {
            tx_id: format!("tx-{key}-{value}"),
            writes: BTreeMap::from([(key.to_string(), Write::Put(value.as_bytes().to_vec()))]),
            ..WriteBatch::default()
        }
    }

    #[test]
    fn test_commit_and_read() {
        let (ledger, _) = ledger();
        let receipt = ledger.commit(put("EXP-1", "a")).unwrap();
        let read = ledger.read("EXP-1").unwrap().unwrap();
        assert_eq!(read.value, b"a");
        assert_eq!(read.version, receipt.version);
        assert!(ledger.read("EXP-2").unwrap().is_none());
    }

    #[test]
    fn test_stale_read_conflicts() {
        let (ledger, _) = ledger();
        ledger.commit(put("EXP-1", "a")).unwrap();
        let observed = ledger.read("EXP-1").unwrap().map(|v| v.version);
        ledger.commit(put("EXP-1", "b")).unwrap();

        let mut stale = put("EXP-1", "c");
        stale.reads.insert("EXP-1".to_string(), observed);
        assert_eq!(
            ledger.commit(stale),
            Err(StoreError::Conflict {
                key: "EXP-1".to_string()
            })
        );
        assert_eq!(ledger.read("EXP-1").unwrap().unwrap().value, b"b");
    }

    #[test]
    fn test_absent_read_conflicts_with_concurrent_create() {
        let (ledger, _) = ledger();
        let mut first = put("EXP-1", "a");
        first.reads.insert("EXP-1".to_string(), None);
        let mut second = put("EXP-1", "b");
        second.reads.insert("EXP-1".to_string(), None);

        ledger.commit(first).unwrap();
        assert!(matches!(ledger.commit(second), Err(StoreError::Conflict { .. })));
    }

    #[test]
    fn test_delete_and_recreate_gets_fresh_version() {
        let (ledger, _) = ledger();
        let v1 = ledger.commit(put("EXP-1", "a")).unwrap().version;
        ledger
            .commit(WriteBatch {
                tx_id: "tx-del".to_string(),
                writes: BTreeMap::from([("EXP-1".to_string(), Write::Delete)]),
                ..WriteBatch::default()
            })
            .unwrap();
        let v3 = ledger.commit(put("EXP-1", "a")).unwrap().version;
        assert!(v3 > v1);

        let history = ledger.history("EXP-1").unwrap();
        assert_eq!(history.len(), 3);
        assert!(history[1].is_delete);
        assert!(history[1].value.is_none());
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_scan_is_half_open_and_ordered() {
        let (ledger, _) = ledger();
        for key in ["EXP-2", "EXP-1", "REGION-MODE-Sidama", "EXP-3"] {
            ledger.commit(put(key, "{}")).unwrap();
        }
        let keys: Vec<String> = ledger
            .scan("EXP-", "EXP-3")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, ["EXP-1", "EXP-2"]);
        assert!(ledger.scan("EXP-~", "EXP-").unwrap().is_empty());
    }

    #[test]
    fn test_event_delivered_only_after_commit() {
        let (ledger, sink) = ledger();
        let mut batch = put("EXP-1", "a");
        batch.event = Some(LedgerEvent {
            tx_id: batch.tx_id.clone(),
            name: "ExportCreated".to_string(),
            payload: b"{}".to_vec(),
        });
        batch.reads.insert("EXP-1".to_string(), Some(99));
        assert!(ledger.commit(batch.clone()).is_err());
        assert!(sink.is_empty());

        batch.reads.clear();
        ledger.commit(batch).unwrap();
        assert_eq!(sink.len(), 1);
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn publish(&self, _event: &LedgerEvent) -> Result<(), SinkError> {
            Err(SinkError("offline".to_string()))
        }
    }

    #[test]
    fn test_sink_failure_does_not_fail_commit() {
        let ledger = MemoryLedger::new(Arc::new(SystemClock), Arc::new(FailingSink));
        let mut batch = put("EXP-1", "a");
        batch.event = Some(LedgerEvent {
            tx_id: batch.tx_id.clone(),
            name: "ExportCreated".to_string(),
            payload: Vec::new(),
        });
        assert!(ledger.commit(batch).is_ok());
        assert_eq!(ledger.len().unwrap(), 1);
    }
}
