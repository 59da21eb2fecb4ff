//! Record store interface.
//!
//! A [`RecordStore`] is a versioned key-value store with append-only per-key
//! history. Reads return committed state together with the version observed;
//! writes are submitted as a [`WriteBatch`] that commits all-or-nothing after
//! its read set is validated.
//!
//! ## Conflict detection
//!
//! Every read a transaction makes is recorded with the version it saw (or
//! `None` for an absent key). `commit` rejects the whole batch with
//! [`StoreError::Conflict`] if any of those keys changed since, so the losing
//! writer retries from a fresh read.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use exportflow_core::keys::KeyError;
use exportflow_core::workflow::WorkflowError;
use serde_json::Value;

/// Version stamp of a committed value. Drawn from a ledger-wide sequence, so a
/// key that is deleted and recreated never reuses a version.
pub type Version = u64;

/// A committed value and the version that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    /// Raw bytes.
    pub value: Vec<u8>,
    /// Commit sequence that produced the value.
    pub version: Version,
}

/// One entry of a key's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    /// Transaction that wrote the entry.
    pub tx_id: String,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
    /// True if the entry is a deletion.
    pub is_delete: bool,
    /// Value written; `None` for deletions.
    pub value: Option<Vec<u8>>,
}

/// A buffered mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    /// Store the bytes under the key.
    Put(Vec<u8>),
    /// Remove the key.
    Delete,
}

/// Named payload delivered to the event sink after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
    /// Transaction that emitted the event.
    pub tx_id: String,
    /// Event name.
    pub name: String,
    /// Event payload.
    pub payload: Vec<u8>,
}

/// Everything one transaction read and wants to write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    /// Transaction identifier.
    pub tx_id: String,
    /// Versions observed by the transaction's reads.
    pub reads: BTreeMap<String, Option<Version>>,
    /// Mutations to apply.
    pub writes: BTreeMap<String, Write>,
    /// Event to publish once committed.
    pub event: Option<LedgerEvent>,
}

impl WriteBatch {
    /// Returns true if the batch writes nothing.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Outcome of a committed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Transaction identifier.
    pub tx_id: String,
    /// Version stamped on every written key.
    pub version: Version,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
}

/// Errors returned by a record store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A key in the read set changed before commit.
    #[error("read conflict on {key}: the key changed after it was read")]
    Conflict {
        /// The stale key.
        key: String,
    },

    /// Keys must be non-empty.
    #[error("record keys cannot be empty")]
    EmptyKey,

    /// A composite key could not be built or split.
    #[error(transparent)]
    Key(#[from] KeyError),

    /// A rich-query selector could not be parsed.
    #[error("invalid query selector: {0}")]
    InvalidSelector(String),

    /// The backend failed (lock poisoned, I/O, ...).
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Conflict { .. } => "STORE_CONFLICT",
            Self::EmptyKey | Self::Key(_) | Self::InvalidSelector(_) => "INVALID_KEY",
            Self::Backend(_) => "STORE_ERROR",
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { key } => Self::StoreConflict { key },
            other => Self::Store(other.to_string()),
        }
    }
}

/// Equality selector for rich queries.
///
/// Accepts either `{"selector": {...}}` or the bare inner object. Each field
/// must equal the given JSON value; dotted names reach into nested objects and
/// `{"$eq": v}` is accepted as an explicit equality.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    fields: BTreeMap<String, Value>,
}

impl Selector {
    /// Parse a selector document.
    pub fn parse(query: &str) -> Result<Self, StoreError> {
        let doc: Value =
            serde_json::from_str(query).map_err(|e| StoreError::InvalidSelector(e.to_string()))?;
        let inner = match doc {
            Value::Object(mut map) => match map.remove("selector") {
                Some(Value::Object(selector)) => selector,
                Some(_) => {
                    return Err(StoreError::InvalidSelector(
                        "\"selector\" must be an object".to_string(),
                    ));
                }
                None => map,
            },
            _ => {
                return Err(StoreError::InvalidSelector(
                    "selector document must be an object".to_string(),
                ));
            }
        };

        let mut fields = BTreeMap::new();
        for (name, condition) in inner {
            let expected = match condition {
                Value::Object(mut op) if op.contains_key("$eq") => {
                    op.remove("$eq").unwrap_or(Value::Null)
                }
                Value::Object(op) if op.keys().any(|k| k.starts_with('$')) => {
                    return Err(StoreError::InvalidSelector(format!(
                        "unsupported operator on {name}"
                    )));
                }
                other => other,
            };
            fields.insert(name, expected);
        }
        Ok(Self { fields })
    }

    /// Selector matching documents whose `field` equals `value`.
    #[must_use]
    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            fields: BTreeMap::from([(field.into(), value.into())]),
        }
    }

    /// Returns true if the JSON document satisfies every condition.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        self.fields.iter().all(|(path, expected)| {
            path.split('.')
                .try_fold(document, |node, segment| node.get(segment))
                .is_some_and(|actual| actual == expected)
        })
    }

    /// Returns true if the raw bytes are a JSON document satisfying the selector.
    /// Non-JSON values never match.
    #[must_use]
    pub fn matches_bytes(&self, bytes: &[u8]) -> bool {
        serde_json::from_slice::<Value>(bytes).is_ok_and(|doc| self.matches(&doc))
    }
}

/// A versioned key-value store with per-key history.
///
/// Implementations must be safe to share between threads. Reads only ever see
/// committed state.
pub trait RecordStore: Send + Sync {
    /// Read the committed value of `key`.
    fn read(&self, key: &str) -> Result<Option<VersionedValue>, StoreError>;

    /// Committed entries with `start <= key < end`, in key order.
    fn scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Committed JSON entries matching `selector`, in key order.
    fn query(&self, selector: &Selector) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Every modification of `key`, oldest first.
    fn history(&self, key: &str) -> Result<Vec<KeyModification>, StoreError>;

    /// Validate the read set and apply every write, or apply nothing.
    ///
    /// # Errors
    /// * `StoreError::Conflict` if a key read by the batch changed since
    fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError>;
}
