//! Rendering surfaces of a feature section.
//!
//! Each surface turns a [`DeviceSnapshot`] into a small view model and keeps
//! the last one for inspection. None of them hold device state of their own.

mod ambient;
mod backdrop;
mod status;
mod toggle;

pub use ambient::{AmbientOverlay, AmbientView, Tone};
pub use backdrop::Backdrop;
pub use status::{StatusCard, StatusView, status_label};
pub use toggle::{ToggleRole, ToggleSurface, ToggleView};

use std::sync::{Mutex, PoisonError};

use homifi_app::store::DeviceSnapshot;
use homifi_domain::device::{CLIMATE_MAX_CELSIUS, DeviceKind, DeviceState};

/// Whether `state` reads as "on" for a toggle of `kind`.
#[must_use]
pub fn is_active(kind: DeviceKind, state: DeviceState) -> bool {
    use DeviceState as S;
    match kind {
        DeviceKind::Light => state == S::On,
        DeviceKind::Curtain => matches!(state, S::Opening | S::Open),
        DeviceKind::Lock => matches!(state, S::Unlocking | S::Unlocked),
        DeviceKind::Security => matches!(state, S::Alert | S::Notification),
        DeviceKind::Climate => state.celsius().is_some_and(|t| t < CLIMATE_MAX_CELSIUS),
    }
}

/// Last snapshot a surface rendered, with the view it produced.
struct Rendered<V> {
    inner: Mutex<Option<(DeviceSnapshot, V)>>,
}

impl<V: Clone> Rendered<V> {
    fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    fn set(&self, snapshot: &DeviceSnapshot, view: V) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some((*snapshot, view));
    }

    fn get(&self) -> Option<(DeviceSnapshot, V)> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
