//! Event delivery for off-ledger consumers.
//!
//! Delivery is fire-and-forget: a failing sink is logged and never rolls
//! back or retries the commit that emitted the event.

use std::sync::{Mutex, PoisonError};

use exportflow_core::workflow::CaseEvent;
use tracing::info;

use crate::store::LedgerEvent;

/// A sink refused an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("event sink failed: {0}")]
pub struct SinkError(pub String);

/// Receives events after their transaction commits.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn publish(&self, event: &LedgerEvent) -> Result<(), SinkError>;
}

/// Logs every event at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &LedgerEvent) -> Result<(), SinkError> {
        info!(
            tx_id = %event.tx_id,
            event = %event.name,
            payload = %String::from_utf8_lossy(&event.payload),
            "Event published"
        );
        Ok(())
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl RecordingEventSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event received so far.
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every received event that decodes as a case event, with its name.
    pub fn case_events(&self) -> Vec<(String, CaseEvent)> {
        self.events()
            .into_iter()
            .filter_map(|event| {
                serde_json::from_slice::<CaseEvent>(&event.payload)
                    .ok()
                    .map(|decoded| (event.name, decoded))
            })
            .collect()
    }

    /// Number of events received.
    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing was received.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: &LedgerEvent) -> Result<(), SinkError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingEventSink::new();
        assert!(sink.is_empty());
        for name in ["ExportCreated", "ExportStatusUpdated"] {
            sink.publish(&LedgerEvent {
                tx_id: "tx".to_string(),
                name: name.to_string(),
                payload: b"{}".to_vec(),
            })
            .unwrap();
        }
        let names: Vec<String> = sink.events().into_iter().map(|e| e.name).collect();
        assert_eq!(names, ["ExportCreated", "ExportStatusUpdated"]);
        assert!(sink.case_events().is_empty());
    }
}
