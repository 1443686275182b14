//! The whole product page: five feature sections stacked below a
//! hero, one shared engine, one visibility trigger and a scrolling viewport.

use std::sync::Arc;

use homifi_app::engine::Engine;
use homifi_app::event_bus::InProcessEventBus;
use homifi_app::ports::AssetResolver;
use homifi_app::visibility::VisibilityTrigger;
use homifi_domain::descriptor::{DescriptorTable, Timing};
use homifi_domain::device::{DeviceKind, DeviceState};
use homifi_domain::error::NotFoundError;
use homifi_domain::viewport::{Span, VisibilityOptions};

use crate::assets::StaticAssetResolver;
use crate::media::{MediaScript, SimulatedMediaElement};
use crate::scroll::ScrollSimulator;
use crate::section::Section;
use crate::HomeEngine;

/// Page order of the feature sections.
pub const SECTION_ORDER: [DeviceKind; 5] = [
    DeviceKind::Light,
    DeviceKind::Curtain,
    DeviceKind::Climate,
    DeviceKind::Lock,
    DeviceKind::Security,
];

/// How to build the page.
#[derive(Debug, Clone)]
pub struct ShowcaseOptions {
    pub timing: Timing,
    pub visibility: VisibilityOptions,
    pub viewport_height: f64,
    pub section_height: f64,
    /// Script for the curtain section's video element.
    pub media: MediaScript,
    /// Base URL of the photo and video assets.
    pub asset_base: String,
    pub journal_capacity: usize,
}

impl Default for ShowcaseOptions {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            visibility: VisibilityOptions::default(),
            viewport_height: 800.0,
            section_height: 900.0,
            media: MediaScript::default(),
            asset_base: String::new(),
            journal_capacity: 1024,
        }
    }
}

/// The simulated page.
pub struct Showcase {
    engine: HomeEngine,
    bus: InProcessEventBus,
    trigger: Arc<VisibilityTrigger>,
    scroll: ScrollSimulator,
    media: Arc<SimulatedMediaElement>,
    sections: Vec<Section>,
}

impl Showcase {
    /// Lay out and mount every section. The viewport starts at the top of
    /// the hero, so nothing has been reported yet.
    ///
    /// # Errors
    ///
    /// Returns [`NotFoundError`] if a section's device cannot be looked up.
    pub fn build(options: ShowcaseOptions) -> Result<Self, NotFoundError> {
        let resolver = Arc::new(StaticAssetResolver::with_base(options.asset_base));
        let bus = InProcessEventBus::new(options.journal_capacity);
        let engine = Engine::new(
            DescriptorTable::new(options.timing),
            Arc::clone(&resolver),
            Arc::new(bus.clone()),
        );
        let trigger = VisibilityTrigger::new();
        let mut scroll = ScrollSimulator::new(options.viewport_height);

        let mut script = options.media;
        if script.initial.is_none() {
            script.initial = resolver.clip(DeviceKind::Curtain, DeviceState::Opening);
        }
        let media = Arc::new(SimulatedMediaElement::new(script));

        let mut sections = Vec::with_capacity(SECTION_ORDER.len());
        let mut top = options.viewport_height;
        for kind in SECTION_ORDER {
            let bounds = Span::new(top, options.section_height);
            let element = (kind == DeviceKind::Curtain).then(|| Arc::clone(&media));
            let section = Section::mount(
                &engine,
                &trigger,
                kind,
                bounds,
                options.visibility,
                element,
            )?;
            scroll.place(section.container(), bounds);
            sections.push(section);
            top += options.section_height;
        }

        tracing::info!(
            sections = sections.len(),
            page_height = scroll.page_height(),
            "showcase built"
        );
        Ok(Self {
            engine,
            bus,
            trigger,
            scroll,
            media,
            sections,
        })
    }

    #[must_use]
    pub fn engine(&self) -> &HomeEngine {
        &self.engine
    }

    /// The diagnostics journal.
    #[must_use]
    pub fn bus(&self) -> &InProcessEventBus {
        &self.bus
    }

    #[must_use]
    pub fn trigger(&self) -> &Arc<VisibilityTrigger> {
        &self.trigger
    }

    #[must_use]
    pub fn scroll(&self) -> &ScrollSimulator {
        &self.scroll
    }

    /// The curtain section's video element.
    #[must_use]
    pub fn media(&self) -> &Arc<SimulatedMediaElement> {
        &self.media
    }

    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    pub fn section(&self, kind: DeviceKind) -> Option<&Section> {
        self.sections.iter().find(|section| section.kind() == kind)
    }

    /// Move the viewport and report the new geometry. Returns how many
    /// sections crossed their threshold.
    pub fn scroll_by(&mut self, delta: f64) -> usize {
        self.scroll.scroll_by(delta);
        self.scroll.report(&self.trigger)
    }

    /// Jump the viewport to `offset` and report the new geometry.
    pub fn scroll_to(&mut self, offset: f64) -> usize {
        self.scroll.scroll_to(offset);
        self.scroll.report(&self.trigger)
    }

    /// Whether every mounted section renders one consistent state.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.sections.iter().all(Section::is_consistent)
    }

    /// Tear every section down.
    pub fn teardown(&mut self) {
        for section in self.sections.drain(..) {
            self.scroll.remove(section.container());
            if let Err(err) = section.teardown(&self.engine) {
                tracing::warn!(error = %err, "section already torn down");
            }
        }
        tracing::info!("showcase torn down");
    }
}
