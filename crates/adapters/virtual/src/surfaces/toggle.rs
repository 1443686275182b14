//! Toggle surfaces: the full-size switch and its copy inside the phone mockup.

use std::fmt;

use homifi_app::binding::Surface;
use homifi_app::store::DeviceSnapshot;
use homifi_domain::device::DeviceState;

use super::{Rendered, is_active};

/// Where a toggle sits on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleRole {
    Primary,
    Mockup,
}

impl fmt::Display for ToggleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary-toggle"),
            Self::Mockup => f.write_str("mockup-toggle"),
        }
    }
}

/// What a toggle shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleView {
    pub state: DeviceState,
    /// Knob on the "on" side.
    pub active: bool,
    /// Whether a tap would do anything right now.
    pub enabled: bool,
}

/// A switch bound to one device.
pub struct ToggleSurface {
    role: ToggleRole,
    label: String,
    rendered: Rendered<ToggleView>,
}

impl ToggleSurface {
    #[must_use]
    pub fn new(role: ToggleRole) -> Self {
        Self {
            role,
            label: role.to_string(),
            rendered: Rendered::new(),
        }
    }

    #[must_use]
    pub fn role(&self) -> ToggleRole {
        self.role
    }

    #[must_use]
    pub fn view(&self) -> Option<ToggleView> {
        self.rendered.get().map(|(_, view)| view)
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<DeviceSnapshot> {
        self.rendered.get().map(|(snapshot, _)| snapshot)
    }
}

impl Surface for ToggleSurface {
    fn name(&self) -> &str {
        &self.label
    }

    fn render(&self, snapshot: &DeviceSnapshot) {
        let view = ToggleView {
            state: snapshot.state,
            active: is_active(snapshot.kind, snapshot.state),
            enabled: !snapshot.is_transitioning
                && snapshot.kind.toggle_target(snapshot.state).is_some(),
        };
        self.rendered.set(snapshot, view);
    }
}
