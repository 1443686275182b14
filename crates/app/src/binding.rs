//! Surface bindings: the mount/unmount contract for rendering surfaces.
//!
//! A surface owns no device state. It renders the snapshot it is handed and
//! asks for changes only through the device's request operations.

use std::sync::Arc;

use crate::store::{DeviceSnapshot, DeviceStore, Subscription};

/// Anything that turns a device snapshot into pixels.
pub trait Surface: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Render `snapshot`. Called once at mount and once per committed change.
    fn render(&self, snapshot: &DeviceSnapshot);
}

/// A mounted surface. Dropping it unmounts.
#[must_use = "dropping the binding unmounts the surface"]
pub struct SurfaceBinding<S> {
    surface: Arc<S>,
    subscription: Subscription,
}

impl<S: Surface + 'static> SurfaceBinding<S> {
    /// Render the current snapshot, then follow every committed change.
    pub fn mount(store: &Arc<DeviceStore>, surface: Arc<S>) -> Self {
        surface.render(&store.snapshot());
        let target = Arc::clone(&surface);
        let subscription = store.subscribe(move |snapshot| target.render(snapshot));
        tracing::debug!(device_id = %store.id(), surface = surface.name(), "surface mounted");
        Self {
            surface,
            subscription,
        }
    }

    #[must_use]
    pub fn surface(&self) -> &Arc<S> {
        &self.surface
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.subscription.is_active()
    }

    pub fn unmount(self) {
        tracing::debug!(surface = self.surface.name(), "surface unmounted");
        self.subscription.unsubscribe();
    }
}
