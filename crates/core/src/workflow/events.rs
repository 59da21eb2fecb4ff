//! Notifications emitted for off-ledger consumers.

use chrono::{DateTime, Utc};
use exportflow_shared::CaseId;
use serde::{Deserialize, Serialize};

use crate::workflow::types::CaseStatus;

/// What happened to the case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    /// The case was created.
    Create,
    /// The case moved to a new status.
    StatusUpdate,
    /// A draft case was withdrawn and deleted.
    Withdraw,
}

/// Event payload published after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseEvent {
    /// The case.
    pub export_id: CaseId,
    /// What happened.
    pub action: EventAction,
    /// Status after the mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_status: Option<CaseStatus>,
    /// Mutation time.
    pub timestamp: DateTime<Utc>,
    /// Organization that performed the mutation.
    pub actor: String,
}

impl CaseEvent {
    /// Event for a newly created case.
    #[must_use]
    pub fn created(export_id: CaseId, timestamp: DateTime<Utc>, actor: impl Into<String>) -> Self {
        Self {
            export_id,
            action: EventAction::Create,
            new_status: Some(CaseStatus::Draft),
            timestamp,
            actor: actor.into(),
        }
    }

    /// Event for a status transition.
    #[must_use]
    pub fn status_updated(
        export_id: CaseId,
        new_status: CaseStatus,
        timestamp: DateTime<Utc>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            export_id,
            action: EventAction::StatusUpdate,
            new_status: Some(new_status),
            timestamp,
            actor: actor.into(),
        }
    }

    /// Event for a withdrawn draft.
    #[must_use]
    pub fn withdrawn(export_id: CaseId, timestamp: DateTime<Utc>, actor: impl Into<String>) -> Self {
        Self {
            export_id,
            action: EventAction::Withdraw,
            new_status: None,
            timestamp,
            actor: actor.into(),
        }
    }

    /// Name under which the event is published.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self.action {
            EventAction::Create => "ExportCreated",
            EventAction::StatusUpdate => "ExportStatusUpdated",
            EventAction::Withdraw => "ExportWithdrawn",
        }
    }

    /// JSON payload bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
