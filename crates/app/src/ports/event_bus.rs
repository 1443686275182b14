//! Event bus port: where the diagnostics journal goes.

use homifi_domain::event::DeviceEvent;

/// Receives diagnostic events from the engine.
///
/// Publishing is fire-and-forget: the engine never waits on it and never
/// fails because of it.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to all current listeners.
    fn publish(&self, event: DeviceEvent);
}

impl<T: EventPublisher> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: DeviceEvent) {
        (**self).publish(event);
    }
}
