//! Device handle: the per-device facade a section talks to.

use std::sync::Arc;

use homifi_domain::descriptor::DescriptorTable;
use homifi_domain::device::{DeviceKind, DeviceState};
use homifi_domain::error::{Fault, TransitionError};
use homifi_domain::event::{DeviceEvent, EventType};
use homifi_domain::id::DeviceId;
use homifi_domain::transition::{SecurityAction, TriggerSource};

use crate::ports::{AssetResolver, EventPublisher, MediaElement};
use crate::scheduler::TransitionScheduler;
use crate::store::{DeviceSnapshot, DeviceStore, Subscription};

/// One simulated device: its store and the scheduler that drives it.
pub struct Device<R, M, P> {
    store: Arc<DeviceStore>,
    scheduler: Arc<TransitionScheduler<R, M, P>>,
    publisher: Arc<P>,
}

impl<R, M, P> Device<R, M, P>
where
    R: AssetResolver + 'static,
    M: MediaElement + 'static,
    P: EventPublisher + 'static,
{
    /// Create a device of `kind` resting in its default state.
    ///
    /// `media` is the element clip-portrayed transitions play on; devices
    /// without one simply keep nominal time.
    #[must_use]
    pub fn new(
        kind: DeviceKind,
        table: Arc<DescriptorTable>,
        resolver: Arc<R>,
        publisher: Arc<P>,
        media: Option<Arc<M>>,
    ) -> Self {
        let store = Arc::new(DeviceStore::new(DeviceId::new(), kind));
        let scheduler = Arc::new(TransitionScheduler::new(
            Arc::clone(&store),
            table,
            resolver,
            Arc::clone(&publisher),
            media,
        ));
        Self {
            store,
            scheduler,
            publisher,
        }
    }

    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.store.id()
    }

    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.store.kind()
    }

    /// Last committed state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.store.state()
    }

    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        self.store.snapshot()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.store
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<TransitionScheduler<R, M, P>> {
        &self.scheduler
    }

    /// See [`DeviceStore::subscribe`].
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&DeviceSnapshot) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    /// Ask for `target`. Returns whether the request was accepted.
    ///
    /// A request made while another transition runs is silently ignored.
    pub fn request_transition(&self, target: DeviceState, source: TriggerSource) -> bool {
        self.try_request_transition(target, source).is_ok()
    }

    /// Like [`request_transition`](Self::request_transition), with the reason
    /// for a rejection.
    ///
    /// # Errors
    ///
    /// Returns why the request was not accepted; nothing changed.
    pub fn try_request_transition(
        &self,
        target: DeviceState,
        source: TriggerSource,
    ) -> Result<(), TransitionError> {
        self.scheduler.request(target, source)
    }

    /// What a tap on any of the device's surfaces does.
    ///
    /// Returns `false` when the tap was ignored.
    pub fn toggle(&self, source: TriggerSource) -> bool {
        if self.store.is_transitioning() {
            tracing::debug!(device_id = %self.id(), "tap ignored, transition in progress");
            return false;
        }
        match self.kind().toggle_target(self.state()) {
            Some(target) => self.request_transition(target, source),
            None => false,
        }
    }

    /// Respond to the security notification.
    ///
    /// Only a security device showing its notification accepts actions.
    pub fn perform(&self, action: SecurityAction) -> bool {
        if self.kind() != DeviceKind::Security || self.state() != DeviceState::Notification {
            tracing::debug!(device_id = %self.id(), ?action, "action ignored");
            return false;
        }
        tracing::info!(device_id = %self.id(), ?action, "security action");
        self.request_transition(action.target(), TriggerSource::User)
    }

    /// Tear the device down: stop every timer, detach every subscription and
    /// release media resources. Nothing is committed afterwards.
    ///
    /// Calling it twice is harmless.
    pub fn destroy(&self) {
        if self.store.is_destroyed() {
            return;
        }
        self.scheduler.cancel();
        let was_transitioning = self.store.teardown();

        if was_transitioning {
            tracing::info!(device_id = %self.id(), "teardown during transition");
            self.publish(
                EventType::for_fault(Fault::TeardownDuringTransition),
                serde_json::json!({ "fault": Fault::TeardownDuringTransition }),
            );
        }
        tracing::info!(device_id = %self.id(), kind = %self.kind(), "device destroyed");
        self.publish(
            EventType::DeviceDestroyed,
            serde_json::json!({ "state": self.state().to_string() }),
        );
    }

    fn publish(&self, event_type: EventType, data: serde_json::Value) {
        self.publisher
            .publish(DeviceEvent::new(event_type, self.id(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::{InProcessEventBus, drain};
    use crate::testing::{FakeMedia, FakeResolver, Recorder, settle};
    use homifi_domain::media::MediaAsset;
    use std::time::Duration;

    type TestDevice = Device<FakeResolver, FakeMedia, InProcessEventBus>;

    fn device(kind: DeviceKind, media: Option<Arc<FakeMedia>>) -> (TestDevice, InProcessEventBus) {
        let bus = InProcessEventBus::new(256);
        let device = Device::new(
            kind,
            Arc::new(DescriptorTable::default()),
            Arc::new(FakeResolver),
            Arc::new(bus.clone()),
            media,
        );
        (device, bus)
    }

    #[tokio::test(start_paused = true)]
    async fn should_return_false_when_transition_in_progress() {
        let (light, _bus) = device(DeviceKind::Light, None);
        let recorder = Recorder::attach(light.store());

        assert!(light.request_transition(DeviceState::On, TriggerSource::Auto));
        let before = (light.snapshot(), recorder.count());
        assert!(!light.request_transition(DeviceState::Off, TriggerSource::User));
        assert_eq!((light.snapshot(), recorder.count()), before);

        settle().await;
        assert_eq!(light.state(), DeviceState::On);
    }

    #[tokio::test(start_paused = true)]
    async fn should_explain_rejections() {
        let (curtain, _bus) = device(DeviceKind::Curtain, None);

        assert_eq!(
            curtain.try_request_transition(DeviceState::Opening, TriggerSource::User),
            Err(TransitionError::InvalidTarget {
                kind: DeviceKind::Curtain,
                target: DeviceState::Opening,
            })
        );
        assert_eq!(
            curtain.try_request_transition(DeviceState::Closed, TriggerSource::User),
            Err(TransitionError::AlreadyAtTarget(DeviceState::Closed))
        );
        assert_eq!(
            curtain.try_request_transition(DeviceState::On, TriggerSource::User),
            Err(TransitionError::InvalidTarget {
                kind: DeviceKind::Curtain,
                target: DeviceState::On,
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_flip_light_on_tap() {
        let (light, _bus) = device(DeviceKind::Light, None);

        assert!(light.toggle(TriggerSource::User));
        settle().await;
        assert_eq!(light.state(), DeviceState::On);

        assert!(light.toggle(TriggerSource::User));
        settle().await;
        assert_eq!(light.state(), DeviceState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_tap_while_unlocked() {
        let (lock, _bus) = device(DeviceKind::Lock, None);

        assert!(lock.toggle(TriggerSource::User));
        tokio::time::sleep(Duration::from_millis(1300)).await;
        assert_eq!(lock.state(), DeviceState::Unlocked);

        assert!(!lock.toggle(TriggerSource::User));
    }

    #[tokio::test(start_paused = true)]
    async fn should_accept_security_action_only_in_notification() {
        let (security, _bus) = device(DeviceKind::Security, None);
        assert!(!security.perform(SecurityAction::Answer));

        security.request_transition(DeviceState::Notification, TriggerSource::Auto);
        tokio::time::sleep(Duration::from_millis(700)).await;

        assert!(security.perform(SecurityAction::Dismiss));
        settle().await;
        assert_eq!(security.state(), DeviceState::Clear);
        assert!(!security.scheduler().revert_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_everything_when_destroyed_mid_transition() {
        let media = Arc::new(FakeMedia::playing(&MediaAsset::clip(FakeResolver::CLOSING)));
        let (curtain, bus) = device(DeviceKind::Curtain, Some(Arc::clone(&media)));
        let mut rx = bus.subscribe();
        let recorder = Recorder::attach(curtain.store());

        curtain.request_transition(DeviceState::Open, TriggerSource::Auto);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(media.outstanding_proxies(), 1);
        assert_eq!(media.loads_in_flight(), 1);

        curtain.destroy();
        assert_eq!(media.outstanding_proxies(), 0);
        let seen = recorder.count();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(recorder.count(), seen);
        assert_eq!(curtain.state(), DeviceState::Opening);
        assert_eq!(media.loads_in_flight(), 0);
        assert_eq!(curtain.store().subscriber_count(), 0);
        assert!(!curtain.request_transition(DeviceState::Closed, TriggerSource::User));

        let types: Vec<_> = drain(&mut rx).into_iter().map(|e| e.event_type).collect();
        assert!(types.contains(&EventType::TransitionCancelled));
        assert!(!types.contains(&EventType::TransitionCompleted));
        assert_eq!(types.last(), Some(&EventType::TransitionRejected));
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_relock_after_destroy() {
        let (lock, _bus) = device(DeviceKind::Lock, None);
        lock.request_transition(DeviceState::Unlocked, TriggerSource::Auto);
        tokio::time::sleep(Duration::from_millis(1300)).await;
        assert!(lock.scheduler().revert_pending());

        lock.destroy();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(lock.state(), DeviceState::Unlocked);
        assert!(!lock.scheduler().revert_pending());
    }
}
