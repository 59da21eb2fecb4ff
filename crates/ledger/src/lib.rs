//! Ledger layer for Exportflow.
//!
//! This crate provides:
//! - The `RecordStore` interface and an in-memory versioned implementation
//! - A transaction facade with optimistic conflict detection
//! - Repositories for cases, documents, users, bulk queries, and history
//! - Identity and event-delivery seams

pub mod events;
pub mod identity;
pub mod memory;
pub mod repositories;
pub mod store;
pub mod transaction;

#[cfg(test)]
mod memory_props;

pub use events::{EventSink, RecordingEventSink, TracingEventSink};
pub use identity::{IdentityError, IdentityProvider, StaticIdentity};
pub use memory::MemoryLedger;
pub use repositories::{
    CaseQueries, CaseRepository, DocumentRepository, HistoryReader, UserRegistry,
};
pub use store::{RecordStore, Selector, StoreError, WriteBatch};
pub use transaction::Transaction;
