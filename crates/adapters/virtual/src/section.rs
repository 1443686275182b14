//! Feature section: one device, its surfaces and its visibility watch.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use homifi_app::binding::SurfaceBinding;
use homifi_app::ports::AssetResolver;
use homifi_app::visibility::{VisibilityTrigger, WatchHandle};
use homifi_domain::device::DeviceKind;
use homifi_domain::error::NotFoundError;
use homifi_domain::id::{ContainerId, DeviceId};
use homifi_domain::transition::{SecurityAction, TriggerSource};
use homifi_domain::viewport::{Span, VisibilityOptions};

use crate::media::SimulatedMediaElement;
use crate::surfaces::{
    AmbientOverlay, AmbientView, Backdrop, StatusCard, StatusView, ToggleRole, ToggleSurface,
    ToggleView,
};
use crate::{HomeDevice, HomeEngine};

/// Everything a section currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub primary: Option<ToggleView>,
    pub mockup: Option<ToggleView>,
    pub status: Option<StatusView>,
    pub ambient: Option<AmbientView>,
    pub photo: Option<String>,
}

struct Mounted {
    primary: SurfaceBinding<ToggleSurface>,
    mockup: SurfaceBinding<ToggleSurface>,
    status: SurfaceBinding<StatusCard>,
    ambient: SurfaceBinding<AmbientOverlay>,
    backdrop: SurfaceBinding<Backdrop>,
}

impl Mounted {
    fn unmount(self) {
        self.primary.unmount();
        self.mockup.unmount();
        self.status.unmount();
        self.ambient.unmount();
        self.backdrop.unmount();
    }
}

/// An interactive section of the page.
pub struct Section {
    kind: DeviceKind,
    container: ContainerId,
    bounds: Span,
    device: Arc<HomeDevice>,
    mounted: Mutex<Option<Mounted>>,
    watch: Mutex<Option<WatchHandle>>,
}

impl Section {
    /// Create the section's device, mount its surfaces and start watching
    /// its container. Entering the viewport requests the kind's auto target.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if the freshly created device cannot be
    /// looked up again.
    pub fn mount(
        engine: &HomeEngine,
        trigger: &Arc<VisibilityTrigger>,
        kind: DeviceKind,
        bounds: Span,
        options: VisibilityOptions,
        media: Option<Arc<SimulatedMediaElement>>,
    ) -> Result<Self, NotFoundError> {
        let id = match media {
            Some(media) => engine.create_media_device(kind, media),
            None => engine.create_device(kind),
        };
        let device = engine.device(id)?;
        let store = device.store();

        let resolver: Arc<dyn AssetResolver> = engine.resolver().clone();
        let mounted = Mounted {
            primary: SurfaceBinding::mount(store, Arc::new(ToggleSurface::new(ToggleRole::Primary))),
            mockup: SurfaceBinding::mount(store, Arc::new(ToggleSurface::new(ToggleRole::Mockup))),
            status: SurfaceBinding::mount(store, Arc::new(StatusCard::default())),
            ambient: SurfaceBinding::mount(store, Arc::new(AmbientOverlay::default())),
            backdrop: SurfaceBinding::mount(store, Arc::new(Backdrop::new(resolver))),
        };

        let container = ContainerId::new();
        let target: Weak<HomeDevice> = Arc::downgrade(&device);
        let watch = trigger.watch(container, options, move || {
            if let Some(device) = target.upgrade() {
                let accepted =
                    device.request_transition(device.kind().auto_target(), TriggerSource::Auto);
                tracing::info!(device_id = %device.id(), kind = %device.kind(), accepted, "auto-trigger fired");
            }
        });

        tracing::debug!(device_id = %id, %kind, %container, "section mounted");
        Ok(Self {
            kind,
            container,
            bounds,
            device,
            mounted: Mutex::new(Some(mounted)),
            watch: Mutex::new(Some(watch)),
        })
    }

    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        self.device.id()
    }

    #[must_use]
    pub fn device(&self) -> &Arc<HomeDevice> {
        &self.device
    }

    #[must_use]
    pub fn container(&self) -> ContainerId {
        self.container
    }

    #[must_use]
    pub fn bounds(&self) -> Span {
        self.bounds
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        lock(&self.mounted).is_some()
    }

    /// A user tap on one of the section's toggles.
    pub fn tap(&self, role: ToggleRole) -> bool {
        let accepted = self.device.toggle(TriggerSource::User);
        tracing::debug!(device_id = %self.device_id(), %role, accepted, "tap");
        accepted
    }

    /// A button on the security notification.
    pub fn act(&self, action: SecurityAction) -> bool {
        self.device.perform(action)
    }

    /// What every surface shows right now. `None` once torn down.
    #[must_use]
    pub fn view(&self) -> Option<SectionView> {
        let mounted = lock(&self.mounted);
        let mounted = mounted.as_ref()?;
        Some(SectionView {
            primary: mounted.primary.surface().view(),
            mockup: mounted.mockup.surface().view(),
            status: mounted.status.surface().view(),
            ambient: mounted.ambient.surface().view(),
            photo: mounted.backdrop.surface().photo(),
        })
    }

    /// Whether every surface rendered exactly the device's current snapshot.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let current = Some(self.device.snapshot());
        let mounted = lock(&self.mounted);
        let Some(mounted) = mounted.as_ref() else {
            return true;
        };
        [
            mounted.primary.surface().snapshot(),
            mounted.mockup.surface().snapshot(),
            mounted.status.surface().snapshot(),
            mounted.ambient.surface().snapshot(),
            mounted.backdrop.surface().snapshot(),
        ]
        .into_iter()
        .all(|rendered| rendered == current)
    }

    /// Stop watching, unmount every surface and destroy the device.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if the device was already destroyed.
    pub fn teardown(&self, engine: &HomeEngine) -> Result<(), NotFoundError> {
        lock(&self.watch).take();
        if let Some(mounted) = lock(&self.mounted).take() {
            mounted.unmount();
        }
        tracing::debug!(device_id = %self.device_id(), kind = %self.kind, "section torn down");
        engine.destroy(self.device_id())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
