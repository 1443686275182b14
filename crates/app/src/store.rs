//! Device state store: the single source of truth for one simulated device.
//!
//! The store holds the canonical [`DeviceState`], the single-flight
//! `is_transitioning` guard and the list of surface subscriptions. It never
//! drives time itself: the [`TransitionScheduler`](crate::scheduler::TransitionScheduler)
//! is the only caller of the commit operations.
//!
//! Subscribers are notified synchronously, outside of any lock, in commit
//! order. Each notification carries a full [`DeviceSnapshot`], so every
//! surface always renders the same committed state and flag. A change made
//! from inside a callback is queued and delivered once every subscriber has
//! seen the change being delivered.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use homifi_domain::device::{DeviceKind, DeviceState};
use homifi_domain::error::TransitionError;
use homifi_domain::id::{DeviceId, SubscriptionId};
use homifi_domain::time::{Timestamp, now};
use homifi_domain::transition::{TransitionRequest, TriggerSource};

use crate::lock;

/// Everything a surface needs to render a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub id: DeviceId,
    pub kind: DeviceKind,
    /// Last committed state.
    pub state: DeviceState,
    pub is_transitioning: bool,
    /// Terminal state of the running transition, `None` when idle.
    pub pending_target: Option<DeviceState>,
    /// Why the current (or last) transition started.
    pub trigger_source: Option<TriggerSource>,
    pub committed_at: Timestamp,
}

struct Canonical {
    state: DeviceState,
    is_transitioning: bool,
    pending_target: Option<DeviceState>,
    trigger_source: Option<TriggerSource>,
    committed_at: Timestamp,
    destroyed: bool,
}

type Callback = Box<dyn Fn(&DeviceSnapshot) + Send + Sync>;

struct Slot {
    id: SubscriptionId,
    active: AtomicBool,
    callback: Callback,
}

#[derive(Default)]
struct Outbox {
    pending: VecDeque<DeviceSnapshot>,
    delivering: bool,
}

/// Canonical state holder for one device.
pub struct DeviceStore {
    id: DeviceId,
    kind: DeviceKind,
    canonical: Mutex<Canonical>,
    subscribers: Mutex<Vec<Arc<Slot>>>,
    outbox: Mutex<Outbox>,
}

impl DeviceStore {
    /// Create a store resting in the kind's default state.
    #[must_use]
    pub fn new(id: DeviceId, kind: DeviceKind) -> Self {
        Self {
            id,
            kind,
            canonical: Mutex::new(Canonical {
                state: kind.default_state(),
                is_transitioning: false,
                pending_target: None,
                trigger_source: None,
                committed_at: now(),
                destroyed: false,
            }),
            subscribers: Mutex::new(Vec::new()),
            outbox: Mutex::new(Outbox::default()),
        }
    }

    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Last committed state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        lock(&self.canonical).state
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        lock(&self.canonical).is_transitioning
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        lock(&self.canonical).destroyed
    }

    /// Consistent copy of the canonical state and flags.
    #[must_use]
    pub fn snapshot(&self) -> DeviceSnapshot {
        let canonical = lock(&self.canonical);
        self.snapshot_of(&canonical)
    }

    /// Register `callback` for every committed change.
    ///
    /// The returned [`Subscription`] detaches on drop; after that the
    /// callback is never invoked again, even mid-transition. A destroyed
    /// store hands out an already-detached subscription.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&DeviceSnapshot) + Send + Sync + 'static,
    {
        let slot = Arc::new(Slot {
            id: SubscriptionId::new(),
            active: AtomicBool::new(true),
            callback: Box::new(callback),
        });

        if self.is_destroyed() {
            slot.active.store(false, Ordering::Release);
        } else {
            lock(&self.subscribers).push(Arc::clone(&slot));
        }

        Subscription {
            slot,
            store: Arc::downgrade(self),
        }
    }

    /// Number of attached subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).len()
    }

    /// Accept `request` if the device is idle and the target is reachable.
    ///
    /// On success the device is marked transitioning toward the target,
    /// subscribers are told, and the ordered path of states to commit is
    /// returned. On rejection nothing changes and nobody is notified.
    pub(crate) fn begin(
        &self,
        request: &TransitionRequest,
    ) -> Result<(DeviceState, Vec<DeviceState>), TransitionError> {
        let (from, path) = {
            let mut canonical = lock(&self.canonical);
            if canonical.destroyed {
                return Err(TransitionError::Destroyed);
            }
            if canonical.is_transitioning {
                return Err(TransitionError::InProgress);
            }
            let from = canonical.state;
            let path = self.kind.path(from, request.target)?;

            canonical.is_transitioning = true;
            canonical.pending_target = Some(request.target);
            canonical.trigger_source = Some(request.source);
            self.enqueue(&canonical);
            (from, path)
        };

        self.notify();
        Ok((from, path))
    }

    /// Commit an intermediate state of the running transition.
    ///
    /// Returns `false` (and commits nothing) once the store is destroyed.
    pub(crate) fn commit(&self, state: DeviceState) -> bool {
        self.apply(state, false)
    }

    /// Commit the final state and clear the transition flags.
    ///
    /// Returns `false` (and commits nothing) once the store is destroyed.
    pub(crate) fn complete(&self, state: DeviceState) -> bool {
        self.apply(state, true)
    }

    /// Detach every subscription and refuse all further changes.
    ///
    /// Returns whether a transition was in flight.
    pub(crate) fn teardown(&self) -> bool {
        let was_transitioning = {
            let mut canonical = lock(&self.canonical);
            canonical.destroyed = true;
            let was = canonical.is_transitioning;
            canonical.is_transitioning = false;
            canonical.pending_target = None;
            was
        };

        let detached = std::mem::take(&mut *lock(&self.subscribers));
        for slot in &detached {
            slot.active.store(false, Ordering::Release);
        }
        was_transitioning
    }

    fn apply(&self, state: DeviceState, last: bool) -> bool {
        {
            let mut canonical = lock(&self.canonical);
            if canonical.destroyed {
                return false;
            }
            canonical.state = state;
            canonical.committed_at = now();
            if last {
                canonical.is_transitioning = false;
                canonical.pending_target = None;
            }
            self.enqueue(&canonical);
        }

        self.notify();
        true
    }

    /// Queue the current snapshot while the canonical lock is held, so the
    /// queue order is the commit order.
    fn enqueue(&self, canonical: &Canonical) {
        lock(&self.outbox).pending.push_back(self.snapshot_of(canonical));
    }

    /// Deliver queued snapshots. A nested call from inside a callback only
    /// leaves its snapshot queued for the outermost call to deliver.
    fn notify(&self) {
        {
            let mut outbox = lock(&self.outbox);
            if outbox.delivering {
                return;
            }
            outbox.delivering = true;
        }

        loop {
            let next = {
                let mut outbox = lock(&self.outbox);
                let next = outbox.pending.pop_front();
                if next.is_none() {
                    outbox.delivering = false;
                }
                next
            };
            let Some(snapshot) = next else {
                return;
            };

            let slots: Vec<Arc<Slot>> = lock(&self.subscribers).clone();
            for slot in slots {
                // A callback may detach another subscription mid-loop.
                if slot.active.load(Ordering::Acquire) {
                    (slot.callback)(&snapshot);
                }
            }
        }
    }

    fn detach(&self, id: SubscriptionId) {
        lock(&self.subscribers).retain(|slot| slot.id != id);
    }

    fn snapshot_of(&self, canonical: &Canonical) -> DeviceSnapshot {
        DeviceSnapshot {
            id: self.id,
            kind: self.kind,
            state: canonical.state,
            is_transitioning: canonical.is_transitioning,
            pending_target: canonical.pending_target,
            trigger_source: canonical.trigger_source,
            committed_at: canonical.committed_at,
        }
    }
}

/// A surface's registration with a [`DeviceStore`].
///
/// Detaches when dropped or when [`unsubscribe`](Self::unsubscribe) is called.
/// Holds only a weak reference to the store, so a live subscription never
/// keeps a torn-down device alive.
#[must_use = "dropping a subscription detaches it immediately"]
pub struct Subscription {
    slot: Arc<Slot>,
    store: Weak<DeviceStore>,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.slot.id
    }

    /// Whether the callback can still be invoked.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.slot.active.load(Ordering::Acquire)
    }

    /// Detach now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.slot.active.store(false, Ordering::Release);
        if let Some(store) = self.store.upgrade() {
            store.detach(self.slot.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.slot.id)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(kind: DeviceKind) -> Arc<DeviceStore> {
        Arc::new(DeviceStore::new(DeviceId::new(), kind))
    }

    fn recorder(store: &Arc<DeviceStore>) -> (Subscription, Arc<Mutex<Vec<DeviceSnapshot>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = store.subscribe(move |snap| sink.lock().unwrap().push(*snap));
        (sub, seen)
    }

    fn request(target: DeviceState) -> TransitionRequest {
        TransitionRequest::new(target, TriggerSource::User)
    }

    #[test]
    fn should_start_in_default_state_and_idle() {
        let store = store(DeviceKind::Curtain);
        let snap = store.snapshot();
        assert_eq!(snap.state, DeviceState::Closed);
        assert!(!snap.is_transitioning);
        assert_eq!(snap.pending_target, None);
        assert_eq!(snap.trigger_source, None);
    }

    #[test]
    fn should_mark_transitioning_and_notify_when_request_accepted() {
        let store = store(DeviceKind::Curtain);
        let (_sub, seen) = recorder(&store);

        let (from, path) = store.begin(&request(DeviceState::Open)).unwrap();

        assert_eq!(from, DeviceState::Closed);
        assert_eq!(path, vec![DeviceState::Opening, DeviceState::Open]);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_transitioning);
        assert_eq!(seen[0].state, DeviceState::Closed);
        assert_eq!(seen[0].pending_target, Some(DeviceState::Open));
        assert_eq!(seen[0].trigger_source, Some(TriggerSource::User));
    }

    #[test]
    fn should_reject_without_side_effects_when_already_transitioning() {
        let store = store(DeviceKind::Light);
        let (_sub, seen) = recorder(&store);
        store.begin(&request(DeviceState::On)).unwrap();
        let before = store.snapshot();

        let err = store.begin(&request(DeviceState::Off)).unwrap_err();

        assert_eq!(err, TransitionError::InProgress);
        assert_eq!(store.snapshot(), before);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn should_reject_invalid_target_without_marking_transitioning() {
        let store = store(DeviceKind::Lock);
        let err = store.begin(&request(DeviceState::Unlocking)).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTarget { .. }));
        assert!(!store.is_transitioning());
    }

    #[test]
    fn should_keep_flag_set_across_intermediate_commits() {
        let store = store(DeviceKind::Curtain);
        store.begin(&request(DeviceState::Open)).unwrap();

        assert!(store.commit(DeviceState::Opening));

        let snap = store.snapshot();
        assert_eq!(snap.state, DeviceState::Opening);
        assert!(snap.is_transitioning);
        assert_eq!(snap.pending_target, Some(DeviceState::Open));
    }

    #[test]
    fn should_clear_flags_on_completion() {
        let store = store(DeviceKind::Curtain);
        let (_sub, seen) = recorder(&store);
        store.begin(&request(DeviceState::Open)).unwrap();
        store.commit(DeviceState::Opening);

        assert!(store.complete(DeviceState::Open));

        let snap = store.snapshot();
        assert_eq!(snap.state, DeviceState::Open);
        assert!(!snap.is_transitioning);
        assert_eq!(snap.pending_target, None);
        assert_eq!(snap.trigger_source, Some(TriggerSource::User));

        let states: Vec<_> = seen.lock().unwrap().iter().map(|s| s.state).collect();
        assert_eq!(
            states,
            vec![DeviceState::Closed, DeviceState::Opening, DeviceState::Open]
        );
    }

    #[test]
    fn should_stop_notifying_after_unsubscribe() {
        let store = store(DeviceKind::Light);
        let (sub, seen) = recorder(&store);
        store.begin(&request(DeviceState::On)).unwrap();

        sub.unsubscribe();
        store.complete(DeviceState::On);

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn should_not_retain_dropped_subscriptions() {
        let store = store(DeviceKind::Light);
        for _ in 0..100 {
            let (sub, _) = recorder(&store);
            drop(sub);
        }
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn should_notify_every_subscriber_exactly_once_per_commit() {
        let store = store(DeviceKind::Light);
        let (_a, seen_a) = recorder(&store);
        let (_b, seen_b) = recorder(&store);

        store.begin(&request(DeviceState::On)).unwrap();
        store.complete(DeviceState::On);

        assert_eq!(seen_a.lock().unwrap().len(), 2);
        assert_eq!(*seen_a.lock().unwrap(), *seen_b.lock().unwrap());
    }

    #[test]
    fn should_skip_subscription_detached_by_an_earlier_callback() {
        let store = store(DeviceKind::Light);
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let victim_hook = Arc::clone(&victim);
        let _killer = store.subscribe(move |_| {
            victim_hook.lock().unwrap().take();
        });
        let (sub, seen) = recorder(&store);
        *victim.lock().unwrap() = Some(sub);

        store.begin(&request(DeviceState::On)).unwrap();

        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn should_deliver_in_commit_order_when_callback_requests_on_completion() {
        let store = store(DeviceKind::Curtain);
        let requester = Arc::downgrade(&store);
        let _closer = store.subscribe(move |snap| {
            if snap.state == DeviceState::Open && !snap.is_transitioning {
                if let Some(store) = requester.upgrade() {
                    store.begin(&request(DeviceState::Closed)).unwrap();
                }
            }
        });
        let (_sub, seen) = recorder(&store);

        store.begin(&request(DeviceState::Open)).unwrap();
        store.commit(DeviceState::Opening);
        store.complete(DeviceState::Open);

        let seen = seen.lock().unwrap();
        let order: Vec<_> = seen
            .iter()
            .map(|s| (s.state, s.is_transitioning, s.pending_target))
            .collect();
        assert_eq!(
            order,
            vec![
                (DeviceState::Closed, true, Some(DeviceState::Open)),
                (DeviceState::Opening, true, Some(DeviceState::Open)),
                (DeviceState::Open, false, None),
                (DeviceState::Open, true, Some(DeviceState::Closed)),
            ]
        );
        assert_eq!(seen.last(), Some(&store.snapshot()));
    }

    #[test]
    fn should_refuse_commits_after_teardown() {
        let store = store(DeviceKind::Curtain);
        let (sub, seen) = recorder(&store);
        store.begin(&request(DeviceState::Open)).unwrap();

        assert!(store.teardown());

        assert!(!store.commit(DeviceState::Opening));
        assert!(!store.complete(DeviceState::Open));
        assert_eq!(store.state(), DeviceState::Closed);
        assert!(!sub.is_active());
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn should_reject_requests_after_teardown() {
        let store = store(DeviceKind::Light);
        store.teardown();
        let err = store.begin(&request(DeviceState::On)).unwrap_err();
        assert_eq!(err, TransitionError::Destroyed);
    }

    #[test]
    fn should_hand_out_detached_subscription_after_teardown() {
        let store = store(DeviceKind::Light);
        store.teardown();
        let (sub, _) = recorder(&store);
        assert!(!sub.is_active());
        assert_eq!(store.subscriber_count(), 0);
    }
}
