//! Core business logic for Exportflow.
//!
//! This crate contains pure workflow logic with ZERO storage or logging dependencies.
//! All domain types, validation rules, and transition decisions live here; the
//! ledger crate persists what this crate computes.
//!
//! # Modules
//!
//! - `validation` - Field-level syntactic and range checks
//! - `workflow` - Transition table, capabilities, and the case state machine
//! - `documents` - Mode-dependent document checklist
//! - `keys` - Composite key encoding for secondary indexes
//! - `history` - Reconstructed case snapshots
//! - `clock` - Time source injected into the engines

pub mod clock;
pub mod documents;
pub mod history;
pub mod keys;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod keys_props;
#[cfg(test)]
mod validation_props;
