//! # homifi-app
//!
//! Application layer: the simulated device engine and its **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that hosts must implement (driven/outbound ports):
//!   - `MediaElement`: the live media surface a curtain-style device plays clips on
//!   - `AssetResolver`: maps device kinds and states to stills and clips
//!   - `EventPublisher`: receives the diagnostics journal
//! - Provide the engine components:
//!   - `DeviceStore`: canonical state, subscriptions, single-flight guard
//!   - `TransitionScheduler`: timed step chains and auto-revert timers
//!   - `MediaSynchronizer`: gapless clip switching
//!   - `VisibilityTrigger`: one-shot "entered viewport" events
//!   - `SurfaceBinding`: mount/unmount contract for rendering surfaces
//!   - `Device` / `Engine`: the handle-based facade the page talks to
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Concurrency
//! Built for a single-threaded cooperative runtime (tokio `current_thread`).
//! Every timer is a spawned task whose abort handle is owned by the component
//! that started it and aborted on teardown.
//!
//! ## Dependency rule
//! Depends on `homifi-domain` only (plus `tokio` for timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod binding;
pub mod device;
pub mod engine;
pub mod event_bus;
pub mod media_sync;
pub mod ports;
pub mod scheduler;
pub mod store;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
