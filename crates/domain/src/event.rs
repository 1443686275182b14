//! Event: an immutable record of something that happened to a device.
//!
//! Events are produced when devices are created or destroyed, when
//! transitions are accepted, rejected, committed and completed, and when a
//! media fault is recovered. They form the diagnostics journal; nothing in
//! the engine reacts to them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Fault;
use crate::id::{DeviceId, EventId};
use crate::time::{Timestamp, now};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DeviceCreated,
    TransitionAccepted,
    TransitionRejected,
    StateCommitted,
    TransitionCompleted,
    MediaLoadFailed,
    PlaybackRejected,
    TransitionCancelled,
    DeviceDestroyed,
}

impl EventType {
    /// Journal entry type recording a recovered fault.
    #[must_use]
    pub fn for_fault(fault: Fault) -> Self {
        match fault {
            Fault::TransitionInProgress => Self::TransitionRejected,
            Fault::MediaLoadFailed => Self::MediaLoadFailed,
            Fault::PlaybackRejected => Self::PlaybackRejected,
            Fault::TeardownDuringTransition => Self::TransitionCancelled,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DeviceCreated => "device_created",
            Self::TransitionAccepted => "transition_accepted",
            Self::TransitionRejected => "transition_rejected",
            Self::StateCommitted => "state_committed",
            Self::TransitionCompleted => "transition_completed",
            Self::MediaLoadFailed => "media_load_failed",
            Self::PlaybackRejected => "playback_rejected",
            Self::TransitionCancelled => "transition_cancelled",
            Self::DeviceDestroyed => "device_destroyed",
        };
        f.write_str(s)
    }
}

/// A journal entry about one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEvent {
    pub id: EventId,
    pub event_type: EventType,
    pub device_id: DeviceId,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl DeviceEvent {
    /// Record a new event stamped with the current time.
    #[must_use]
    pub fn new(event_type: EventType, device_id: DeviceId, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            device_id,
            data,
            timestamp: now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_assign_fresh_id_to_each_event() {
        let device = DeviceId::new();
        let a = DeviceEvent::new(EventType::StateCommitted, device, serde_json::json!({}));
        let b = DeviceEvent::new(EventType::StateCommitted, device, serde_json::json!({}));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn should_serialize_event_type_as_snake_case() {
        let json = serde_json::to_string(&EventType::MediaLoadFailed).unwrap();
        assert_eq!(json, "\"media_load_failed\"");
        assert_eq!(EventType::MediaLoadFailed.to_string(), "media_load_failed");
    }

    #[test]
    fn should_journal_teardown_as_cancellation() {
        assert_eq!(
            EventType::for_fault(Fault::TeardownDuringTransition),
            EventType::TransitionCancelled
        );
    }
}
