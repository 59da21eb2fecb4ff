//! Document checklist subsystem.
//!
//! Tracks which supporting documents a case needs for its export mode and
//! whether each one has been uploaded, verified, or rejected. The checklist
//! lives inside the case record and is persisted through the same
//! read-modify-write path as workflow transitions.
//!
//! # Modules
//!
//! - `types` - Modes, document kinds, statuses, and uploads
//! - `checklist` - The per-case checklist and completeness predicate
//! - `service` - Mode selection, upload, and review operations
//! - `report` - Mode usage statistics
//! - `error` - Checklist-specific error types

pub mod checklist;
pub mod error;
pub mod report;
pub mod service;
pub mod types;

pub use checklist::DocumentChecklist;
pub use error::DocumentError;
pub use report::ModeUsageReport;
pub use service::{DocumentPolicy, DocumentService, DocumentStatusView, ModeSelection};
pub use types::{
    Completeness, DocumentKind, DocumentStatus, DocumentUpload, ExportMode, RegionModeMapping,
};
