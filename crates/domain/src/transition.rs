//! Transition requests and their provenance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::DeviceState;
use crate::time::{Timestamp, now};

/// Why a transition started. Diagnostic only; never changes behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    /// Started by the visibility trigger or an auto-revert timer.
    Auto,
    /// Started by a tap on one of the device's surfaces.
    User,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::User => f.write_str("user"),
        }
    }
}

/// A request to move a device toward a resting state.
///
/// Consumed immediately by the scheduler; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest {
    pub target: DeviceState,
    pub source: TriggerSource,
    pub requested_at: Timestamp,
}

impl TransitionRequest {
    /// Stamp a new request with the current time.
    #[must_use]
    pub fn new(target: DeviceState, source: TriggerSource) -> Self {
        Self {
            target,
            source,
            requested_at: now(),
        }
    }
}

/// Responses offered by the security notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityAction {
    Dismiss,
    Answer,
    Unlock,
}

impl SecurityAction {
    /// Every action clears the notification.
    #[must_use]
    pub fn target(self) -> DeviceState {
        match self {
            Self::Dismiss | Self::Answer | Self::Unlock => DeviceState::Clear,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_stamp_request_with_current_time() {
        let before = now();
        let request = TransitionRequest::new(DeviceState::On, TriggerSource::User);
        assert!(request.requested_at >= before);
        assert_eq!(request.target, DeviceState::On);
    }

    #[test]
    fn should_clear_on_every_security_action() {
        for action in [
            SecurityAction::Dismiss,
            SecurityAction::Answer,
            SecurityAction::Unlock,
        ] {
            assert_eq!(action.target(), DeviceState::Clear);
        }
    }

    #[test]
    fn should_display_trigger_source_lowercase() {
        assert_eq!(TriggerSource::Auto.to_string(), "auto");
    }
}
