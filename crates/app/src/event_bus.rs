//! In-process event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use homifi_domain::event::DeviceEvent;

use crate::ports::EventPublisher;

/// In-process diagnostics bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped). Clones share the same channel.
#[derive(Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<DeviceEvent>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: DeviceEvent) {
        // broadcast::send fails only when there are zero receivers.
        let _ = self.sender.send(event);
    }
}

/// Drain every event currently buffered in `rx` without waiting.
pub fn drain(rx: &mut broadcast::Receiver<DeviceEvent>) -> Vec<DeviceEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event journal receiver lagged");
            }
            Err(_) => break,
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use homifi_domain::event::EventType;
    use homifi_domain::id::DeviceId;

    #[tokio::test]
    async fn should_deliver_event_to_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();

        let event = DeviceEvent::new(
            EventType::StateCommitted,
            DeviceId::new(),
            serde_json::json!({"state": "on"}),
        );
        let event_id = event.id;

        bus.publish(event);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, event_id);
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.clone().subscribe();

        let event = DeviceEvent::new(EventType::DeviceCreated, DeviceId::new(), serde_json::json!({}));
        let event_id = event.id;

        bus.publish(event);

        assert_eq!(rx1.recv().await.unwrap().id, event_id);
        assert_eq!(rx2.recv().await.unwrap().id, event_id);
    }

    #[test]
    fn should_succeed_when_no_subscribers() {
        let bus = InProcessEventBus::new(16);
        bus.publish(DeviceEvent::new(
            EventType::StateCommitted,
            DeviceId::new(),
            serde_json::json!({}),
        ));
    }

    #[test]
    fn should_drain_buffered_events_in_order() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();
        let device = DeviceId::new();
        bus.publish(DeviceEvent::new(EventType::TransitionAccepted, device, serde_json::json!({})));
        bus.publish(DeviceEvent::new(EventType::TransitionCompleted, device, serde_json::json!({})));

        let types: Vec<_> = drain(&mut rx).into_iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![EventType::TransitionAccepted, EventType::TransitionCompleted]
        );
        assert!(drain(&mut rx).is_empty());
    }
}
