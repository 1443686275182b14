//! # homifi-adapter-virtual
//!
//! Simulated host for the device engine: everything a browser page would
//! provide, scripted and observable.
//!
//! ## Provided pieces
//!
//! | Piece | Port / contract | Behaviour |
//! |-------|-----------------|-----------|
//! | [`SimulatedMediaElement`] | `MediaElement` | Scripted load latency, clip length, load failures and autoplay rejection; logs every visible frame |
//! | [`StaticAssetResolver`] | `AssetResolver` | The product's room photos and curtain videos |
//! | [`ScrollSimulator`] | viewport geometry | Stacked containers under a scrolling viewport |
//! | [`surfaces`] | `Surface` | Primary and mockup toggles, status card, ambient overlay, backdrop |
//! | [`Section`] | – | One device with its surfaces and auto-trigger |
//! | [`Showcase`] | – | The five feature sections on one page |
//!
//! ## Dependency rule
//!
//! Depends on `homifi-app` (port traits, engine) and `homifi-domain` only.

pub mod assets;
pub mod media;
pub mod scroll;
pub mod section;
pub mod showcase;
pub mod surfaces;

use homifi_app::device::Device;
use homifi_app::engine::Engine;
use homifi_app::event_bus::InProcessEventBus;

pub use assets::StaticAssetResolver;
pub use media::{Frame, MediaScript, SimulatedMediaElement};
pub use scroll::ScrollSimulator;
pub use section::{Section, SectionView};
pub use showcase::{SECTION_ORDER, Showcase, ShowcaseOptions};

/// Engine wired to the simulated host.
pub type HomeEngine = Engine<StaticAssetResolver, SimulatedMediaElement, InProcessEventBus>;

/// Device handle wired to the simulated host.
pub type HomeDevice = Device<StaticAssetResolver, SimulatedMediaElement, InProcessEventBus>;
