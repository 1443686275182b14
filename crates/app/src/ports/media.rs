//! Media element port: the live surface playable transitions run on.
//!
//! Modelled on a browser video element with a hidden preload buffer and an
//! overlay that can show a captured still on top of the live element.

use std::future::Future;

use homifi_domain::error::MediaError;
use homifi_domain::media::{FrameProxy, MediaAsset};

/// A host media element a device's clips are played on.
///
/// All methods are called from the engine's single thread. Futures returned
/// here may be dropped before completion when the owning device is torn
/// down; implementations must treat that as cancellation.
pub trait MediaElement: Send + Sync {
    /// Source currently attached to the live element, if any.
    fn current_source(&self) -> Option<String>;

    /// Capture the frame currently on screen into a still.
    ///
    /// Returns `None` when nothing is displayed yet.
    fn capture_frame(&self) -> Option<FrameProxy>;

    /// Show `proxy` on top of the live element.
    fn show_proxy(&self, proxy: &FrameProxy);

    /// Remove `proxy` from the overlay.
    fn hide_proxy(&self, proxy: &FrameProxy);

    /// Free the decoded-frame memory behind `proxy`.
    fn release_proxy(&self, proxy: FrameProxy);

    /// Buffer `clip` in the background until it can play through without
    /// further buffering. The live element is not touched.
    fn preload(&self, clip: &MediaAsset) -> impl Future<Output = Result<(), MediaError>> + Send;

    /// Attach a preloaded clip to the live element, positioned at its start.
    fn swap_to(&self, clip: &MediaAsset);

    /// Seek the live element back to its first frame.
    fn rewind(&self);

    /// Start playback of the live element.
    ///
    /// Fails with [`MediaError::PlaybackRejected`] when the runtime's
    /// autoplay policy refuses.
    fn play(&self) -> impl Future<Output = Result<(), MediaError>> + Send;

    /// Resolve once the live element reaches its natural end of playback.
    fn ended(&self) -> impl Future<Output = ()> + Send;

    /// Pause the live element where it is (its last frame after `ended`).
    fn pause(&self);

    /// Replace the live picture with a still image.
    fn show_still(&self, still: &MediaAsset);

    /// Remove any still shown by [`show_still`](Self::show_still), revealing
    /// the live element again.
    fn hide_still(&self);
}
