//! Transition scheduler: walks an accepted request through its timed steps.
//!
//! For each state on the path the scheduler waits the step's delay, commits
//! the state to the [`DeviceStore`] and, when the step is portrayed by a clip,
//! hands off to the [`MediaSynchronizer`] before moving on. Media faults are
//! recovered here: the target's still is shown, the fault is journaled, and
//! the chain keeps its nominal timing so the device still lands on target.
//!
//! Kinds with an auto-revert rule get a second single-shot timer once the
//! chain completes; when it fires it re-enters [`TransitionScheduler::request`]
//! like any other caller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::Instant;

use homifi_domain::descriptor::DescriptorTable;
use homifi_domain::device::{DeviceKind, DeviceState};
use homifi_domain::error::{Fault, MediaError, TransitionError};
use homifi_domain::event::{DeviceEvent, EventType};
use homifi_domain::transition::{TransitionRequest, TriggerSource};

use crate::lock;
use crate::media_sync::MediaSynchronizer;
use crate::ports::{AssetResolver, EventPublisher, MediaElement};
use crate::store::DeviceStore;

/// Owns every timer of one device.
pub struct TransitionScheduler<R, M, P> {
    store: Arc<DeviceStore>,
    table: Arc<DescriptorTable>,
    resolver: Arc<R>,
    publisher: Arc<P>,
    media: Option<MediaSynchronizer<M>>,
    chain: Mutex<Option<AbortHandle>>,
    revert: Mutex<Option<AbortHandle>>,
}

impl<R, M, P> TransitionScheduler<R, M, P>
where
    R: AssetResolver + 'static,
    M: MediaElement + 'static,
    P: EventPublisher + 'static,
{
    #[must_use]
    pub fn new(
        store: Arc<DeviceStore>,
        table: Arc<DescriptorTable>,
        resolver: Arc<R>,
        publisher: Arc<P>,
        media: Option<Arc<M>>,
    ) -> Self {
        Self {
            store,
            table,
            resolver,
            publisher,
            media: media.map(MediaSynchronizer::new),
            chain: Mutex::new(None),
            revert: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.store
    }

    #[must_use]
    pub fn media(&self) -> Option<&MediaSynchronizer<M>> {
        self.media.as_ref()
    }

    /// Whether an auto-revert timer is armed.
    #[must_use]
    pub fn revert_pending(&self) -> bool {
        lock(&self.revert)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Accept or reject a request toward `target`.
    ///
    /// Never waits for the transition: on success the step chain is spawned
    /// and this returns immediately. Must be called from within a tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns the [`TransitionError`] the store rejected the request with.
    /// Rejections have no effect besides a journal entry.
    pub fn request(
        self: &Arc<Self>,
        target: DeviceState,
        source: TriggerSource,
    ) -> Result<(), TransitionError> {
        let request = TransitionRequest::new(target, source);
        let device_id = self.store.id();

        let (from, path) = match self.store.begin(&request) {
            Ok(accepted) => accepted,
            Err(err) => {
                tracing::debug!(device_id = %device_id, %target, %source, error = %err, "transition rejected");
                self.publish(
                    EventType::TransitionRejected,
                    serde_json::json!({
                        "target": target.to_string(),
                        "source": source.to_string(),
                        "reason": err.to_string(),
                        "fault": err.fault(),
                    }),
                );
                return Err(err);
            }
        };

        self.cancel_revert();
        let nominal = self.table.nominal_duration(self.store.kind(), from, &path);
        tracing::info!(
            device_id = %device_id,
            %from,
            %target,
            %source,
            steps = path.len(),
            nominal_ms = nominal.as_millis(),
            "transition accepted"
        );
        self.publish(
            EventType::TransitionAccepted,
            serde_json::json!({
                "from": from.to_string(),
                "target": target.to_string(),
                "source": source.to_string(),
                "path": path.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "nominal_ms": u64::try_from(nominal.as_millis()).unwrap_or(u64::MAX),
            }),
        );

        let this = Arc::clone(self);
        let task = tokio::spawn(async move { this.run(from, path, request).await });
        if let Some(previous) = lock(&self.chain).replace(task.abort_handle()) {
            previous.abort();
        }
        Ok(())
    }

    /// Abort the running chain and any armed revert timer.
    ///
    /// Returns whether a chain was still running.
    pub fn cancel(&self) -> bool {
        let chain = lock(&self.chain).take();
        let was_running = chain.is_some_and(|handle| {
            let running = !handle.is_finished();
            handle.abort();
            running
        });
        self.cancel_revert();
        if let Some(media) = &self.media {
            media.release();
        }
        was_running
    }

    fn cancel_revert(&self) {
        if let Some(handle) = lock(&self.revert).take() {
            tracing::debug!(device_id = %self.store.id(), "auto-revert timer cancelled");
            handle.abort();
        }
    }

    async fn run(self: Arc<Self>, from: DeviceState, path: Vec<DeviceState>, request: TransitionRequest) {
        let kind = self.store.kind();
        let last = path.len().saturating_sub(1);
        let mut current = from;

        for (index, &next) in path.iter().enumerate() {
            let step = self.table.step(kind, current, next);
            if !step.delay.is_zero() {
                tokio::time::sleep(step.delay).await;
            }

            let finishing = index == last && step.clip.is_none();
            let committed = if finishing {
                self.store.complete(next)
            } else {
                self.store.commit(next)
            };
            if !committed {
                tracing::debug!(device_id = %self.store.id(), state = %next, "store torn down, chain stopped");
                return;
            }
            tracing::debug!(device_id = %self.store.id(), state = %next, "state committed");
            self.publish(
                EventType::StateCommitted,
                serde_json::json!({ "state": next.to_string(), "final": finishing }),
            );

            if let Some(clip) = step.clip {
                self.portray(kind, next, request.target, clip).await;
                if index == last {
                    if !self.store.complete(next) {
                        return;
                    }
                    self.publish(
                        EventType::StateCommitted,
                        serde_json::json!({ "state": next.to_string(), "final": true }),
                    );
                }
            }
            current = next;
        }

        tracing::info!(device_id = %self.store.id(), state = %request.target, source = %request.source, "transition completed");
        self.publish(
            EventType::TransitionCompleted,
            serde_json::json!({
                "state": request.target.to_string(),
                "source": request.source.to_string(),
            }),
        );

        self.schedule_revert(request.target);
    }

    /// Play the clip for the motion state `state`, keeping nominal time on failure.
    async fn portray(
        &self,
        kind: DeviceKind,
        state: DeviceState,
        target: DeviceState,
        nominal: Duration,
    ) {
        let start = Instant::now();
        let (Some(media), Some(clip)) = (&self.media, self.resolver.clip(kind, state)) else {
            tokio::time::sleep(nominal).await;
            return;
        };
        let still = self.resolver.still(kind, target);

        let deadline = self.table.media_deadline(nominal);
        let outcome = match tokio::time::timeout(deadline, media.present(&clip, still.as_ref())).await {
            Ok(outcome) => outcome,
            Err(_) => {
                media.fall_back(still.as_ref());
                Err(MediaError::Stalled)
            }
        };

        if let Err(err) = outcome {
            let fault = Fault::from(&err);
            tracing::warn!(device_id = %self.store.id(), clip = %clip, error = %err, "media fault, showing still");
            self.publish(
                EventType::for_fault(fault),
                serde_json::json!({
                    "clip": clip.url,
                    "fault": fault,
                    "error": err.to_string(),
                }),
            );
            tokio::time::sleep_until(start + nominal).await;
        }
    }

    fn schedule_revert(self: &Arc<Self>, state: DeviceState) {
        let kind = self.store.kind();
        let (Some(target), Some(delay)) = (kind.auto_revert(state), self.table.revert_delay(kind, state))
        else {
            return;
        };
        if self.store.is_transitioning() {
            return;
        }

        tracing::debug!(device_id = %self.store.id(), %target, delay_ms = delay.as_millis(), "auto-revert armed");
        let this = Arc::clone(self);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Disarm first so the request below does not abort this task.
            lock(&this.revert).take();
            let _ = this.request(target, TriggerSource::Auto);
        });
        if let Some(previous) = lock(&self.revert).replace(task.abort_handle()) {
            previous.abort();
        }
    }

    fn publish(&self, event_type: EventType, data: serde_json::Value) {
        self.publisher
            .publish(DeviceEvent::new(event_type, self.store.id(), data));
    }
}
