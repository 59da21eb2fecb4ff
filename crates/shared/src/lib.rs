//! Shared configuration, error classification, and identifiers for Exportflow.
//!
//! This crate provides common pieces used across all other crates:
//! - Typed identifiers for cases and users
//! - The error taxonomy shared by every layer (`ErrorKind`)
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::ErrorKind;
pub use types::{CaseId, UserId};
