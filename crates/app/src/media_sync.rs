//! Media synchronizer: switches a media element from clip A to clip B
//! without ever showing an empty frame.
//!
//! The sequence for a new source:
//!
//! 1. capture the frame currently on screen and show it as a still proxy;
//! 2. preload the new clip in the background until it can play through;
//! 3. swap the live element to the new clip, start it, drop the proxy;
//! 4. wait for the natural end of playback and pause on the last frame.
//!
//! Replaying the clip that is already attached skips straight to a
//! rewind-and-play. Any failure shows the target state's still instead and
//! hands the error back to the scheduler, which records it and keeps time.

use std::sync::{Arc, Mutex};

use homifi_domain::error::MediaError;
use homifi_domain::media::{FrameProxy, MediaAsset};

use crate::lock;
use crate::ports::MediaElement;

/// Drives one [`MediaElement`] through gapless clip changes.
pub struct MediaSynchronizer<M> {
    element: Arc<M>,
    proxy: Mutex<Option<FrameProxy>>,
}

impl<M: MediaElement> MediaSynchronizer<M> {
    #[must_use]
    pub fn new(element: Arc<M>) -> Self {
        Self {
            element,
            proxy: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn element(&self) -> &Arc<M> {
        &self.element
    }

    /// Whether a captured-frame proxy is currently held.
    #[must_use]
    pub fn holds_proxy(&self) -> bool {
        lock(&self.proxy).is_some()
    }

    /// Play `clip` to its end, falling back to `still` if it cannot be shown.
    ///
    /// Resolves once playback has ended and the element is paused on its
    /// final frame. Dropping the future cancels any pending preload and
    /// releases the captured proxy.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError::LoadFailed`] or [`MediaError::PlaybackRejected`]
    /// after `still` has been put on screen.
    pub async fn present(
        &self,
        clip: &MediaAsset,
        still: Option<&MediaAsset>,
    ) -> Result<(), MediaError> {
        if self.element.current_source().as_deref() == Some(clip.url.as_str()) {
            tracing::debug!(clip = %clip, "clip already attached, replaying");
            self.element.rewind();
            return self.play_through(None, still).await;
        }

        let guard = self.capture();

        if let Err(err) = self.element.preload(clip).await {
            self.fall_back(still);
            return Err(err);
        }
        tracing::debug!(clip = %clip, "clip buffered, swapping");
        self.element.swap_to(clip);

        self.play_through(Some(guard), still).await
    }

    /// Put the still for the target state on screen.
    pub fn fall_back(&self, still: Option<&MediaAsset>) {
        match still {
            Some(still) => self.element.show_still(still),
            None => tracing::debug!("no still available, keeping current picture"),
        }
    }

    /// Hide and free the captured proxy, if one is held.
    pub fn release(&self) {
        let proxy = lock(&self.proxy).take();
        if let Some(proxy) = proxy {
            tracing::trace!(handle = proxy.handle, "releasing frame proxy");
            self.element.hide_proxy(&proxy);
            self.element.release_proxy(proxy);
        }
    }

    async fn play_through(
        &self,
        guard: Option<ProxyGuard<'_, M>>,
        still: Option<&MediaAsset>,
    ) -> Result<(), MediaError> {
        if let Err(err) = self.element.play().await {
            self.fall_back(still);
            return Err(err);
        }
        // Live frames are flowing; whatever covered them can go.
        self.element.hide_still();
        drop(guard);

        self.element.ended().await;
        self.element.pause();
        Ok(())
    }

    fn capture(&self) -> ProxyGuard<'_, M> {
        self.release();
        if let Some(proxy) = self.element.capture_frame() {
            self.element.show_proxy(&proxy);
            *lock(&self.proxy) = Some(proxy);
        }
        ProxyGuard { sync: self }
    }
}

/// Releases the captured proxy when the swap finishes, fails, or is cancelled.
struct ProxyGuard<'a, M: MediaElement> {
    sync: &'a MediaSynchronizer<M>,
}

impl<M: MediaElement> Drop for ProxyGuard<'_, M> {
    fn drop(&mut self) {
        self.sync.release();
    }
}
