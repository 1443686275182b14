//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts via `#[from]`.
//! None of these ever reach a rendering surface: rejected requests surface
//! as a `false` return, media problems are recovered inside the scheduler
//! and only show up as [`Fault`]s in the diagnostics journal.

use serde::{Deserialize, Serialize};

use crate::device::{DeviceKind, DeviceState};

/// Top-level error for engine operations addressed by device handle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No device with the given handle exists (or it was destroyed).
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The device refused the requested transition.
    #[error("transition rejected")]
    Transition(#[from] TransitionError),
}

/// A lookup by identifier found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of thing that was looked up (e.g. `"Device"`).
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}

/// Why a transition request was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Another transition is still running on this device.
    #[error("a transition is already in progress")]
    InProgress,

    /// The target is not a resting state reachable for this kind.
    #[error("{target} is not a valid target for a {kind} device")]
    InvalidTarget {
        /// Kind of the device addressed.
        kind: DeviceKind,
        /// Requested target state.
        target: DeviceState,
    },

    /// The device already rests in the requested state.
    #[error("device is already {0}")]
    AlreadyAtTarget(DeviceState),

    /// The device was torn down.
    #[error("device has been destroyed")]
    Destroyed,
}

/// Failure reported by a media element while portraying a transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    /// The new source could not be fetched or decoded.
    #[error("failed to load media {url}")]
    LoadFailed {
        /// Source that failed.
        url: String,
    },

    /// The runtime declined to start playback (autoplay policy).
    #[error("playback rejected by autoplay policy")]
    PlaybackRejected,

    /// Playback did not reach its end within the watchdog window.
    #[error("playback stalled")]
    Stalled,
}

/// Recoverable conditions recorded in the diagnostics journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fault {
    /// A request arrived while another transition was running.
    TransitionInProgress,
    /// A media source could not be loaded; a still was shown instead.
    MediaLoadFailed,
    /// Autoplay was refused; a still was shown instead.
    PlaybackRejected,
    /// The device was destroyed while a transition was active.
    TeardownDuringTransition,
}

impl From<&MediaError> for Fault {
    fn from(err: &MediaError) -> Self {
        match err {
            MediaError::LoadFailed { .. } | MediaError::Stalled => Self::MediaLoadFailed,
            MediaError::PlaybackRejected => Self::PlaybackRejected,
        }
    }
}

impl TransitionError {
    /// The journal fault this rejection represents, if any.
    ///
    /// Only overlapping requests are worth recording; the other reasons are
    /// plain caller mistakes.
    #[must_use]
    pub fn fault(&self) -> Option<Fault> {
        matches!(self, Self::InProgress).then_some(Fault::TransitionInProgress)
    }
}
