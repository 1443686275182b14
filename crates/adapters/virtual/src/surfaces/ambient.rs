//! Ambient overlay: the glow behind a section.

use homifi_app::binding::Surface;
use homifi_app::store::DeviceSnapshot;
use homifi_domain::device::{ClimateMode, DeviceKind, DeviceState};

use super::Rendered;

/// Colour family of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Neutral,
    Bright,
    Progress,
    Success,
    Attention,
    Cool,
    Comfort,
    Warm,
}

impl Tone {
    #[must_use]
    pub fn of(kind: DeviceKind, state: DeviceState) -> Self {
        use DeviceState as S;
        match (kind, state) {
            (DeviceKind::Light, S::On) | (DeviceKind::Curtain, S::Open) => Self::Bright,
            (DeviceKind::Curtain, S::Opening | S::Closing) | (DeviceKind::Lock, S::Unlocking) => {
                Self::Progress
            }
            (DeviceKind::Lock, S::Unlocked) => Self::Success,
            (DeviceKind::Security, S::Alert | S::Notification) => Self::Attention,
            (DeviceKind::Climate, S::Temperature(t)) => match ClimateMode::from_celsius(t) {
                ClimateMode::Cool => Self::Cool,
                ClimateMode::Comfort => Self::Comfort,
                ClimateMode::Warm => Self::Warm,
            },
            _ => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientView {
    pub tone: Tone,
    pub pulsing: bool,
}

/// Background glow bound to one device.
pub struct AmbientOverlay {
    rendered: Rendered<AmbientView>,
}

impl Default for AmbientOverlay {
    fn default() -> Self {
        Self {
            rendered: Rendered::new(),
        }
    }
}

impl AmbientOverlay {
    #[must_use]
    pub fn view(&self) -> Option<AmbientView> {
        self.rendered.get().map(|(_, view)| view)
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<DeviceSnapshot> {
        self.rendered.get().map(|(snapshot, _)| snapshot)
    }
}

impl Surface for AmbientOverlay {
    fn name(&self) -> &str {
        "ambient-overlay"
    }

    fn render(&self, snapshot: &DeviceSnapshot) {
        let view = AmbientView {
            tone: Tone::of(snapshot.kind, snapshot.state),
            pulsing: snapshot.is_transitioning,
        };
        self.rendered.set(snapshot, view);
    }
}
