//! Status card: the Control Center style summary line.

use homifi_app::binding::Surface;
use homifi_app::store::DeviceSnapshot;
use homifi_domain::device::{ClimateMode, DeviceKind, DeviceState};

use super::Rendered;

/// What the status card shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusView {
    pub label: String,
    pub busy: bool,
}

/// Human readable summary of `snapshot`.
#[must_use]
pub fn status_label(snapshot: &DeviceSnapshot) -> String {
    use DeviceState as S;
    let label = match (snapshot.kind, snapshot.state) {
        (DeviceKind::Light, S::On) => "Lights On",
        (DeviceKind::Light, _) => "Lights Off",
        (DeviceKind::Curtain, S::Opening) => "Opening...",
        (DeviceKind::Curtain, S::Closing) => "Closing...",
        (DeviceKind::Curtain, S::Open) => "Curtains Open",
        (DeviceKind::Curtain, _) => "Curtains Closed",
        (DeviceKind::Lock, S::Unlocking) => "Unlocking...",
        (DeviceKind::Lock, S::Unlocked) => "Unlocked",
        (DeviceKind::Lock, _) => "Locked",
        (DeviceKind::Security, S::Alert | S::Notification) => "Visitor Detected",
        (DeviceKind::Security, _) => "All Clear",
        (DeviceKind::Climate, state) => return climate_label(snapshot, state),
    };
    label.to_string()
}

fn climate_label(snapshot: &DeviceSnapshot, state: DeviceState) -> String {
    if snapshot.is_transitioning {
        let heading = snapshot
            .pending_target
            .and_then(DeviceState::celsius)
            .map(ClimateMode::from_celsius);
        return match heading {
            Some(ClimateMode::Cool) => "Cooling...",
            Some(ClimateMode::Warm) => "Warming...",
            _ => "Adjusting...",
        }
        .to_string();
    }
    match state.celsius().map(ClimateMode::from_celsius) {
        Some(ClimateMode::Cool) => "Cool Mode".to_string(),
        Some(ClimateMode::Warm) => "Warm Mode".to_string(),
        _ => "Comfort Mode".to_string(),
    }
}

/// Summary card bound to one device.
pub struct StatusCard {
    rendered: Rendered<StatusView>,
}

impl Default for StatusCard {
    fn default() -> Self {
        Self {
            rendered: Rendered::new(),
        }
    }
}

impl StatusCard {
    #[must_use]
    pub fn view(&self) -> Option<StatusView> {
        self.rendered.get().map(|(_, view)| view)
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<DeviceSnapshot> {
        self.rendered.get().map(|(snapshot, _)| snapshot)
    }
}

impl Surface for StatusCard {
    fn name(&self) -> &str {
        "status-card"
    }

    fn render(&self, snapshot: &DeviceSnapshot) {
        let view = StatusView {
            label: status_label(snapshot),
            busy: snapshot.is_transitioning,
        };
        self.rendered.set(snapshot, view);
    }
}
