//! Visibility trigger: one-shot "entered the viewport" events per container.
//!
//! The host reports how much of each container is on screen; the trigger
//! knows nothing about devices. The first report at or above a watch's
//! threshold stops observing that container and arms a settle timer, after
//! which `on_enter` runs exactly once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::task::AbortHandle;

use homifi_domain::id::ContainerId;
use homifi_domain::viewport::{Span, VisibilityOptions, visible_fraction};

use crate::lock;

type OnEnter = Box<dyn FnOnce() + Send>;

struct Watch {
    generation: u64,
    options: VisibilityOptions,
    on_enter: OnEnter,
}

struct Settle {
    generation: u64,
    handle: AbortHandle,
}

/// Observes any number of containers independently.
#[derive(Default)]
pub struct VisibilityTrigger {
    watches: Mutex<HashMap<ContainerId, Watch>>,
    settling: Mutex<HashMap<ContainerId, Settle>>,
    generations: AtomicU64,
}

impl VisibilityTrigger {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Start observing `container`.
    ///
    /// Watching a container twice replaces the earlier watch. The returned
    /// handle stops observing, and cancels a pending settle timer, on drop;
    /// a handle whose watch was replaced leaves the replacement alone.
    pub fn watch<F>(
        self: &Arc<Self>,
        container: ContainerId,
        options: VisibilityOptions,
        on_enter: F,
    ) -> WatchHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel_settle(container);
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let previous = lock(&self.watches).insert(
            container,
            Watch {
                generation,
                options,
                on_enter: Box::new(on_enter),
            },
        );
        if previous.is_some() {
            tracing::debug!(%container, "replacing existing visibility watch");
        }
        WatchHandle {
            container,
            generation,
            trigger: Arc::downgrade(self),
        }
    }

    /// Report the visible fraction of `container`.
    ///
    /// Returns `true` when this report crossed the threshold and armed the
    /// settle timer. Reports for containers that are not watched (or have
    /// already fired) are ignored.
    pub fn report(self: &Arc<Self>, container: ContainerId, fraction: f64) -> bool {
        let watch = {
            let mut watches = lock(&self.watches);
            let crossed = watches
                .get(&container)
                .is_some_and(|watch| fraction >= watch.options.threshold);
            if crossed { watches.remove(&container) } else { None }
        };
        let Some(watch) = watch else {
            return false;
        };

        let generation = watch.generation;
        let delay = watch.options.settle_delay;
        tracing::debug!(%container, fraction, delay_ms = delay.as_millis(), "container entered viewport");

        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut settling = lock(&this.settling);
                if settling.get(&container).is_some_and(|s| s.generation == generation) {
                    settling.remove(&container);
                }
            }
            (watch.on_enter)();
        });
        lock(&self.settling).insert(
            container,
            Settle {
                generation,
                handle: task.abort_handle(),
            },
        );
        true
    }

    /// Report the geometry of `container` against `viewport`.
    ///
    /// The watch's bottom root margin is applied before intersecting.
    pub fn report_geometry(
        self: &Arc<Self>,
        container: ContainerId,
        bounds: Span,
        viewport: Span,
    ) -> bool {
        let margin = match lock(&self.watches).get(&container) {
            Some(watch) => watch.options.root_margin_bottom,
            None => return false,
        };
        self.report(container, visible_fraction(bounds, viewport, margin))
    }

    #[must_use]
    pub fn is_watching(&self, container: ContainerId) -> bool {
        lock(&self.watches).contains_key(&container)
    }

    /// Whether `container` crossed its threshold and is waiting to fire.
    #[must_use]
    pub fn is_settling(&self, container: ContainerId) -> bool {
        lock(&self.settling).contains_key(&container)
    }

    /// Containers still being observed.
    #[must_use]
    pub fn watched(&self) -> Vec<ContainerId> {
        lock(&self.watches).keys().copied().collect()
    }

    /// Stop observing `container` and cancel its pending settle timer, but
    /// only if both still belong to the watch created as `generation`.
    fn release(&self, container: ContainerId, generation: u64) {
        {
            let mut watches = lock(&self.watches);
            if watches.get(&container).is_some_and(|w| w.generation == generation) {
                watches.remove(&container);
            }
        }
        let settle = {
            let mut settling = lock(&self.settling);
            if settling.get(&container).is_some_and(|s| s.generation == generation) {
                settling.remove(&container)
            } else {
                None
            }
        };
        if let Some(settle) = settle {
            tracing::debug!(%container, "settle timer cancelled");
            settle.handle.abort();
        }
    }

    fn cancel_settle(&self, container: ContainerId) {
        if let Some(settle) = lock(&self.settling).remove(&container) {
            tracing::debug!(%container, "settle timer cancelled");
            settle.handle.abort();
        }
    }
}

/// Keeps a container observed; unwatches on drop.
#[must_use = "dropping the handle stops observing the container"]
pub struct WatchHandle {
    container: ContainerId,
    generation: u64,
    trigger: Weak<VisibilityTrigger>,
}

impl WatchHandle {
    #[must_use]
    pub fn container(&self) -> ContainerId {
        self.container
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        if let Some(trigger) = self.trigger.upgrade() {
            trigger.release(self.container, self.generation);
        }
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn should_fire_once_after_settle_delay_when_threshold_reached() {
        let trigger = VisibilityTrigger::new();
        let container = ContainerId::new();
        let (count, on_enter) = counter();
        let _handle = trigger.watch(container, VisibilityOptions::default(), on_enter);

        assert!(trigger.report(container, 0.5));
        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        assert!(!trigger.report(container, 1.0));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!trigger.is_watching(container));
    }

    #[tokio::test(start_paused = true)]
    async fn should_ignore_reports_below_threshold() {
        let trigger = VisibilityTrigger::new();
        let container = ContainerId::new();
        let (count, on_enter) = counter();
        let _handle = trigger.watch(container, VisibilityOptions::default(), on_enter);

        assert!(!trigger.report(container, 0.29));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(trigger.is_watching(container));
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_sections_independent() {
        let trigger = VisibilityTrigger::new();
        let (first, second) = (ContainerId::new(), ContainerId::new());
        let (first_count, first_enter) = counter();
        let (second_count, second_enter) = counter();
        let _a = trigger.watch(first, VisibilityOptions::default(), first_enter);
        let _b = trigger.watch(second, VisibilityOptions::default(), second_enter);

        trigger.report(first, 0.9);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 0);
        assert!(trigger.is_watching(second));
    }

    #[tokio::test(start_paused = true)]
    async fn should_cancel_pending_fire_when_handle_dropped() {
        let trigger = VisibilityTrigger::new();
        let container = ContainerId::new();
        let (count, on_enter) = counter();
        let handle = trigger.watch(container, VisibilityOptions::default(), on_enter);

        trigger.report(container, 1.0);
        assert!(trigger.is_settling(container));
        drop(handle);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!trigger.is_settling(container));
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_replacement_watch_when_first_handle_dropped() {
        let trigger = VisibilityTrigger::new();
        let container = ContainerId::new();
        let (first_count, first_enter) = counter();
        let (second_count, second_enter) = counter();
        let first = trigger.watch(container, VisibilityOptions::default(), first_enter);
        let _second = trigger.watch(container, VisibilityOptions::default(), second_enter);

        drop(first);
        assert!(trigger.is_watching(container));

        assert!(trigger.report(container, 1.0));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(first_count.load(Ordering::SeqCst), 0);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_apply_root_margin_to_geometry() {
        let trigger = VisibilityTrigger::new();
        let container = ContainerId::new();
        let (count, on_enter) = counter();
        let _handle = trigger.watch(container, VisibilityOptions::default(), on_enter);

        let viewport = Span::new(0.0, 800.0);
        // 200 of 600 px above the viewport bottom, but only 100 once the
        // margin is applied.
        assert!(!trigger.report_geometry(container, Span::new(600.0, 600.0), viewport));
        assert!(trigger.report_geometry(container, Span::new(400.0, 600.0), viewport));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_fire_immediately_with_zero_settle_delay() {
        let trigger = VisibilityTrigger::new();
        let container = ContainerId::new();
        let (count, on_enter) = counter();
        let options = VisibilityOptions {
            settle_delay: Duration::ZERO,
            ..VisibilityOptions::default()
        };
        let _handle = trigger.watch(container, options, on_enter);

        trigger.report(container, 0.3);
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
