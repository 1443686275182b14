//! Transition descriptor table: how long each step takes and whether it is
//! portrayed by playable media.
//!
//! The table is pure data: built once from [`Timing`] and shared read-only by
//! every device.

use std::time::Duration;

use crate::device::{DeviceKind, DeviceState};

/// Tunable step durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Lock: time spent `unlocking` before `unlocked` commits.
    pub lock_unlock: Duration,
    /// Lock: time spent `unlocked` before the automatic relock.
    pub lock_relock: Duration,
    /// Security: time spent in `alert` before the notification shows.
    pub security_alert: Duration,
    /// Security: time a notification stays up before clearing itself.
    pub security_auto_clear: Duration,
    /// Curtain: nominal length of the opening/closing clips.
    pub curtain_clip: Duration,
    /// Climate: time per one-degree step.
    pub climate_step: Duration,
    /// Extra time a clip may overrun its nominal length before it is
    /// considered stalled.
    pub media_grace: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            lock_unlock: Duration::from_millis(1200),
            lock_relock: Duration::from_millis(1500),
            security_alert: Duration::from_millis(600),
            security_auto_clear: Duration::from_secs(8),
            curtain_clip: Duration::from_secs(4),
            climate_step: Duration::from_millis(400),
            media_grace: Duration::from_secs(2),
        }
    }
}

/// Timing and portrayal of one step of a transition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDescriptor {
    /// Wait before the step's state is committed.
    pub delay: Duration,
    /// Nominal clip length when the step is portrayed by playable media.
    ///
    /// The step only completes once the clip ends (or, on failure, once this
    /// much time has passed since the step's commit).
    pub clip: Option<Duration>,
}

impl StepDescriptor {
    const fn after(delay: Duration) -> Self {
        Self { delay, clip: None }
    }

    const fn playing(clip: Duration) -> Self {
        Self {
            delay: Duration::ZERO,
            clip: Some(clip),
        }
    }

    /// Total nominal time this step occupies.
    #[must_use]
    pub fn nominal(&self) -> Duration {
        self.delay + self.clip.unwrap_or_default()
    }
}

/// Read-only mapping from `(kind, from, to)` steps to their descriptors.
#[derive(Debug, Clone, Default)]
pub struct DescriptorTable {
    timing: Timing,
}

impl DescriptorTable {
    /// Build a table from the given timings.
    #[must_use]
    pub fn new(timing: Timing) -> Self {
        Self { timing }
    }

    /// Timings the table was built from.
    #[must_use]
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Descriptor for the single step `from → to`.
    #[must_use]
    pub fn step(&self, kind: DeviceKind, from: DeviceState, to: DeviceState) -> StepDescriptor {
        use DeviceState as S;
        let t = &self.timing;
        match (kind, from, to) {
            (DeviceKind::Curtain, S::Closed, S::Opening)
            | (DeviceKind::Curtain, S::Open, S::Closing) => StepDescriptor::playing(t.curtain_clip),
            (DeviceKind::Lock, S::Unlocking, S::Unlocked) => StepDescriptor::after(t.lock_unlock),
            (DeviceKind::Security, S::Alert, S::Notification) => {
                StepDescriptor::after(t.security_alert)
            }
            (DeviceKind::Climate, _, _) => StepDescriptor::after(t.climate_step),
            _ => StepDescriptor::after(Duration::ZERO),
        }
    }

    /// Delay before `kind` reverts on its own from `state`, if it does.
    #[must_use]
    pub fn revert_delay(&self, kind: DeviceKind, state: DeviceState) -> Option<Duration> {
        kind.auto_revert(state).map(|_| match kind {
            DeviceKind::Security => self.timing.security_auto_clear,
            _ => self.timing.lock_relock,
        })
    }

    /// Sum of the nominal step durations along `path`, starting at `from`.
    #[must_use]
    pub fn nominal_duration(
        &self,
        kind: DeviceKind,
        from: DeviceState,
        path: &[DeviceState],
    ) -> Duration {
        let mut current = from;
        path.iter()
            .map(|&next| {
                let step = self.step(kind, current, next);
                current = next;
                step.nominal()
            })
            .sum()
    }

    /// Watchdog window for a clip of nominal length `clip`.
    #[must_use]
    pub fn media_deadline(&self, clip: Duration) -> Duration {
        clip + self.timing.media_grace
    }
}
