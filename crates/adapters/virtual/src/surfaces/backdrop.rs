//! Backdrop: the room photo behind a section.

use std::sync::Arc;

use homifi_app::binding::Surface;
use homifi_app::ports::AssetResolver;
use homifi_app::store::DeviceSnapshot;

use super::Rendered;

/// Shows the still for the committed state.
///
/// Intermediate states keep the previous photo: the resolver only knows
/// stills for resting states.
pub struct Backdrop {
    resolver: Arc<dyn AssetResolver>,
    rendered: Rendered<Option<String>>,
}

impl Backdrop {
    #[must_use]
    pub fn new(resolver: Arc<dyn AssetResolver>) -> Self {
        Self {
            resolver,
            rendered: Rendered::new(),
        }
    }

    /// URL of the photo on screen.
    #[must_use]
    pub fn photo(&self) -> Option<String> {
        self.rendered.get().and_then(|(_, photo)| photo)
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<DeviceSnapshot> {
        self.rendered.get().map(|(snapshot, _)| snapshot)
    }
}

impl Surface for Backdrop {
    fn name(&self) -> &str {
        "backdrop"
    }

    fn render(&self, snapshot: &DeviceSnapshot) {
        let photo = self
            .resolver
            .still(snapshot.kind, snapshot.state)
            .map(|still| still.url)
            .or_else(|| self.photo());
        self.rendered.set(snapshot, photo);
    }
}
