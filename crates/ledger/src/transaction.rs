//! Transaction facade over a [`RecordStore`].
//!
//! A transaction reads committed state, buffers its writes, and commits them
//! in one batch. Reads do not see the transaction's own buffered writes.

use std::collections::BTreeMap;

use exportflow_core::keys;
use exportflow_core::workflow::CaseEvent;

use crate::store::{
    CommitReceipt, KeyModification, LedgerEvent, RecordStore, Selector, StoreError, Version,
    Write, WriteBatch,
};

/// One unit of work against a record store.
///
/// Dropping a transaction without committing discards its writes.
pub struct Transaction<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    tx_id: String,
    reads: BTreeMap<String, Option<Version>>,
    writes: BTreeMap<String, Write>,
    event: Option<LedgerEvent>,
}

impl<S: RecordStore + ?Sized> std::fmt::Debug for Transaction<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("tx_id", &self.tx_id)
            .field("reads", &self.reads.len())
            .field("writes", &self.writes.len())
            .finish_non_exhaustive()
    }
}

impl<'a, S: RecordStore + ?Sized> Transaction<'a, S> {
    /// Begin a transaction with a fresh identifier.
    pub fn begin(store: &'a S) -> Self {
        Self {
            store,
            tx_id: uuid::Uuid::now_v7().to_string(),
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
            event: None,
        }
    }

    /// The transaction identifier.
    #[must_use]
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Read the committed value of `key` and record the version observed.
    ///
    /// The first observation of a key is the one validated at commit.
    pub fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let current = self.store.read(key)?;
        self.reads
            .entry(key.to_string())
            .or_insert_with(|| current.as_ref().map(|entry| entry.version));
        Ok(current.map(|entry| entry.value))
    }

    /// Buffer a write of `value` under `key`.
    pub fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.writes.insert(key.to_string(), Write::Put(value));
        Ok(())
    }

    /// Buffer a deletion of `key`.
    pub fn delete_state(&mut self, key: &str) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::EmptyKey);
        }
        self.writes.insert(key.to_string(), Write::Delete);
        Ok(())
    }

    /// Committed entries in `[start, end)`.
    ///
    /// Range reads are not added to the read set.
    pub fn state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        self.store.scan(start, end)
    }

    /// Committed entries whose composite key starts with `namespace` and `parts`.
    pub fn state_by_partial_composite_key(
        &self,
        namespace: &str,
        parts: &[&str],
    ) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let (start, end) = keys::partial_composite_range(namespace, parts)?;
        self.store.scan(&start, &end)
    }

    /// Build a composite key.
    pub fn create_composite_key(namespace: &str, parts: &[&str]) -> Result<String, StoreError> {
        Ok(keys::composite_key(namespace, parts)?)
    }

    /// Split a composite key into its namespace and parts.
    pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>), StoreError> {
        Ok(keys::split_composite_key(key)?)
    }

    /// Committed JSON entries matching a selector document.
    pub fn query_result(&self, query: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        self.store.query(&Selector::parse(query)?)
    }

    /// Every committed modification of `key`, oldest first.
    pub fn history_for_key(&self, key: &str) -> Result<Vec<KeyModification>, StoreError> {
        self.store.history(key)
    }

    /// Set the event published after commit. A later call replaces an earlier one.
    pub fn set_event(&mut self, name: &str, payload: Vec<u8>) {
        self.event = Some(LedgerEvent {
            tx_id: self.tx_id.clone(),
            name: name.to_string(),
            payload,
        });
    }

    /// Set a case event as the transaction's event.
    pub fn set_case_event(&mut self, event: &CaseEvent) -> Result<(), StoreError> {
        let payload = event
            .to_bytes()
            .map_err(|e| StoreError::Backend(format!("event encoding failed: {e}")))?;
        self.set_event(event.name(), payload);
        Ok(())
    }

    /// Submit the buffered writes.
    ///
    /// # Errors
    /// * `StoreError::Conflict` if any key this transaction read has changed
    pub fn commit(self) -> Result<CommitReceipt, StoreError> {
        self.store.commit(WriteBatch {
            tx_id: self.tx_id,
            reads: self.reads,
            writes: self.writes,
            event: self.event,
        })
    }
}
