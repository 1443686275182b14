//! Device kinds and their state machines.
//!
//! | Kind | States | Transitions |
//! |------|--------|-------------|
//! | Light | off, on | off→on, on→off |
//! | Curtain | closed, opening, open, closing | closed→opening→open, open→closing→closed |
//! | Lock | locked, unlocking, unlocked | locked→unlocking→unlocked, auto relock to locked |
//! | Security | clear, alert, notification | clear→alert→notification, back to clear on action or timeout |
//! | Climate | 18..=26 °C | one degree per step toward the target |
//!
//! Requests always name a *resting* state; intermediate states are only ever
//! entered by the scheduler while walking a [`DeviceKind::path`].

mod state;

pub use state::{CLIMATE_MAX_CELSIUS, CLIMATE_MIN_CELSIUS, ClimateMode, DeviceState};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// Capability set of a simulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Light,
    Curtain,
    Lock,
    Security,
    Climate,
}

impl DeviceKind {
    /// Every kind the engine knows how to simulate.
    pub const ALL: [Self; 5] = [
        Self::Light,
        Self::Curtain,
        Self::Lock,
        Self::Security,
        Self::Climate,
    ];

    /// State a freshly created device rests in.
    #[must_use]
    pub fn default_state(self) -> DeviceState {
        match self {
            Self::Light => DeviceState::Off,
            Self::Curtain => DeviceState::Closed,
            Self::Lock => DeviceState::Locked,
            Self::Security => DeviceState::Clear,
            Self::Climate => DeviceState::Temperature(CLIMATE_MAX_CELSIUS),
        }
    }

    /// Full state set of this kind, intermediate states included.
    #[must_use]
    pub fn states(self) -> Vec<DeviceState> {
        use DeviceState as S;
        match self {
            Self::Light => vec![S::Off, S::On],
            Self::Curtain => vec![S::Closed, S::Opening, S::Open, S::Closing],
            Self::Lock => vec![S::Locked, S::Unlocking, S::Unlocked],
            Self::Security => vec![S::Clear, S::Alert, S::Notification],
            Self::Climate => (CLIMATE_MIN_CELSIUS..=CLIMATE_MAX_CELSIUS)
                .map(S::Temperature)
                .collect(),
        }
    }

    /// Whether `state` belongs to this kind at all.
    #[must_use]
    pub fn accepts(self, state: DeviceState) -> bool {
        match (self, state) {
            (Self::Climate, DeviceState::Temperature(t)) => {
                (CLIMATE_MIN_CELSIUS..=CLIMATE_MAX_CELSIUS).contains(&t)
            }
            (Self::Climate, _) => false,
            (kind, state) => kind.states().contains(&state),
        }
    }

    /// Whether `state` is a legal request target (not an intermediate state).
    #[must_use]
    pub fn is_resting(self, state: DeviceState) -> bool {
        use DeviceState as S;
        self.accepts(state) && !matches!(state, S::Opening | S::Closing | S::Unlocking | S::Alert)
    }

    /// Ordered states the scheduler commits to move from `from` to `target`.
    ///
    /// The last element is always `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError::InvalidTarget`] if `target` is not a resting
    /// state of this kind or no path leads there from `from`, and
    /// [`TransitionError::AlreadyAtTarget`] if `from == target`.
    pub fn path(
        self,
        from: DeviceState,
        target: DeviceState,
    ) -> Result<Vec<DeviceState>, TransitionError> {
        use DeviceState as S;

        let invalid = TransitionError::InvalidTarget { kind: self, target };
        if !self.is_resting(target) {
            return Err(invalid);
        }
        if from == target {
            return Err(TransitionError::AlreadyAtTarget(target));
        }

        match (self, from, target) {
            (Self::Light, _, target) => Ok(vec![target]),
            (Self::Curtain, S::Closed, S::Open) => Ok(vec![S::Opening, S::Open]),
            (Self::Curtain, S::Open, S::Closed) => Ok(vec![S::Closing, S::Closed]),
            (Self::Lock, S::Locked, S::Unlocked) => Ok(vec![S::Unlocking, S::Unlocked]),
            (Self::Lock, S::Unlocked, S::Locked) => Ok(vec![S::Locked]),
            (Self::Security, S::Clear, S::Notification) => Ok(vec![S::Alert, S::Notification]),
            (Self::Security, S::Notification, S::Clear) => Ok(vec![S::Clear]),
            (Self::Climate, S::Temperature(from), S::Temperature(to)) => Ok(if to > from {
                (from + 1..=to).map(S::Temperature).collect()
            } else {
                (to..from).rev().map(S::Temperature).collect()
            }),
            _ => Err(invalid),
        }
    }

    /// State this kind falls back to on its own after resting in `state`.
    #[must_use]
    pub fn auto_revert(self, state: DeviceState) -> Option<DeviceState> {
        match (self, state) {
            (Self::Lock, DeviceState::Unlocked) => Some(DeviceState::Locked),
            (Self::Security, DeviceState::Notification) => Some(DeviceState::Clear),
            _ => None,
        }
    }

    /// Target requested when the owning section scrolls into view.
    #[must_use]
    pub fn auto_target(self) -> DeviceState {
        match self {
            Self::Light => DeviceState::On,
            Self::Curtain => DeviceState::Open,
            Self::Lock => DeviceState::Unlocked,
            Self::Security => DeviceState::Notification,
            Self::Climate => DeviceState::Temperature(ClimateMode::Comfort.preset()),
        }
    }

    /// Target a user tap on any surface asks for, given the committed state.
    ///
    /// `None` means the tap does nothing in this state (e.g. an unlocked lock
    /// waiting to relock).
    #[must_use]
    pub fn toggle_target(self, state: DeviceState) -> Option<DeviceState> {
        use DeviceState as S;
        match (self, state) {
            (Self::Light, S::Off) => Some(S::On),
            (Self::Light, S::On) => Some(S::Off),
            (Self::Curtain, S::Closed) => Some(S::Open),
            (Self::Curtain, S::Open) => Some(S::Closed),
            (Self::Lock, S::Locked) => Some(S::Unlocked),
            (Self::Security, S::Clear) => Some(S::Notification),
            (Self::Security, S::Notification) => Some(S::Clear),
            (Self::Climate, S::Temperature(t)) => Some(S::Temperature(
                ClimateMode::from_celsius(t).next().preset(),
            )),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Curtain => f.write_str("curtain"),
            Self::Lock => f.write_str("lock"),
            Self::Security => f.write_str("security"),
            Self::Climate => f.write_str("climate"),
        }
    }
}
