//! Export case workflow state machine.
//!
//! This module implements the case lifecycle: the declarative transition
//! table, capability-based authorization, and the pure engine that applies
//! an operation to a case.
//!
//! # Modules
//!
//! - `types` - Lifecycle states, operations, and the caller
//! - `capability` - Capabilities and the organization-to-capability mapping
//! - `table` - The transition table and its declarative form
//! - `case` - The export case record
//! - `payload` - Operation payloads and resubmission amendments
//! - `engine` - State transition logic
//! - `events` - Notifications for off-ledger consumers
//! - `error` - Workflow-specific error types

pub mod capability;
pub mod case;
pub mod engine;
pub mod error;
pub mod events;
pub mod payload;
pub mod table;
pub mod types;

#[cfg(test)]
mod engine_props;

pub use capability::{Capability, CapabilityMap, CapabilitySet};
pub use case::{CaseField, DocumentCategory, DocumentVersion, ExportCase, NewCase};
pub use engine::{Attachment, Transition, WorkflowEngine};
pub use error::WorkflowError;
pub use events::{CaseEvent, EventAction};
pub use payload::{Amendments, TransitionPayload};
pub use table::{TableError, TransitionRule, TransitionTable, TransitionTableSpec};
pub use types::{Caller, CaseStatus, Operation};
