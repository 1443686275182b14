//! Port definitions: traits that hosts implement.
//!
//! Ports are the boundaries between the engine and the page it runs in.
//! They are defined here (in `app`) so that both the engine and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod assets;
pub mod event_bus;
pub mod media;

pub use assets::AssetResolver;
pub use event_bus::EventPublisher;
pub use media::MediaElement;
