//! Scroll simulator: the viewport-geometry provider for a simulated page.

use std::sync::Arc;

use homifi_app::visibility::VisibilityTrigger;
use homifi_domain::id::ContainerId;
use homifi_domain::viewport::Span;

/// A viewport moving over a page of stacked containers.
#[derive(Debug, Clone)]
pub struct ScrollSimulator {
    viewport_height: f64,
    scroll_top: f64,
    containers: Vec<(ContainerId, Span)>,
}

impl ScrollSimulator {
    #[must_use]
    pub fn new(viewport_height: f64) -> Self {
        Self {
            viewport_height,
            scroll_top: 0.0,
            containers: Vec::new(),
        }
    }

    /// Place `container` on the page.
    pub fn place(&mut self, container: ContainerId, bounds: Span) {
        self.containers.retain(|(id, _)| *id != container);
        self.containers.push((container, bounds));
    }

    /// Remove `container` from the page.
    pub fn remove(&mut self, container: ContainerId) {
        self.containers.retain(|(id, _)| *id != container);
    }

    #[must_use]
    pub fn viewport(&self) -> Span {
        Span::new(self.scroll_top, self.viewport_height)
    }

    /// Bottom of the lowest container.
    #[must_use]
    pub fn page_height(&self) -> f64 {
        self.containers
            .iter()
            .map(|(_, bounds)| bounds.bottom())
            .fold(self.viewport_height, f64::max)
    }

    /// Highest reachable scroll offset.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (self.page_height() - self.viewport_height).max(0.0)
    }

    #[must_use]
    pub fn at_bottom(&self) -> bool {
        self.scroll_top >= self.max_scroll()
    }

    /// Jump to `offset`, clamped to the page.
    pub fn scroll_to(&mut self, offset: f64) {
        self.scroll_top = offset.clamp(0.0, self.max_scroll());
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.scroll_to(self.scroll_top + delta);
    }

    /// Tell `trigger` where every container is. Returns how many crossed
    /// their threshold with this report.
    pub fn report(&self, trigger: &Arc<VisibilityTrigger>) -> usize {
        let viewport = self.viewport();
        self.containers
            .iter()
            .filter(|(container, bounds)| trigger.report_geometry(*container, *bounds, viewport))
            .count()
    }
}
