//! Simulated media element: a video element with a hidden preload buffer.
//!
//! Timing and faults are scripted with [`MediaScript`]. Every change of the
//! picture a viewer would see is appended to a frame log, so a run can be
//! checked for blank frames after the fact.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use homifi_app::ports::MediaElement;
use homifi_domain::error::MediaError;
use homifi_domain::media::{FrameProxy, LoadStatus, MediaAsset};

/// How the simulated element behaves.
#[derive(Debug, Clone)]
pub struct MediaScript {
    /// Time a preload takes to become playable through.
    pub load_latency: Duration,
    /// Length of every clip.
    pub clip_length: Duration,
    /// Sources whose preload fails.
    pub failing: HashSet<String>,
    /// Refuse every `play` as an autoplay policy would.
    pub reject_playback: bool,
    /// Clip attached (and paused on its last frame) at start.
    pub initial: Option<MediaAsset>,
}

impl Default for MediaScript {
    fn default() -> Self {
        Self {
            load_latency: Duration::from_millis(250),
            clip_length: Duration::from_secs(4),
            failing: HashSet::new(),
            reject_playback: false,
            initial: None,
        }
    }
}

/// What a viewer sees at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Empty decoder output.
    Blank,
    /// The live element playing or paused on `url`.
    Live(String),
    /// A captured still of `url` covering the live element.
    Proxy(String),
    /// A static image.
    Still(String),
}

#[derive(Default)]
struct Element {
    attached: Option<MediaAsset>,
    still: Option<String>,
    proxy: Option<FrameProxy>,
    buffered: HashSet<String>,
    playing: bool,
    frames: Vec<Frame>,
    next_handle: u64,
    live_proxies: usize,
    loads_in_flight: usize,
}

impl Element {
    fn visible(&self) -> Frame {
        if let Some(proxy) = &self.proxy {
            return Frame::Proxy(proxy.captured_from.clone());
        }
        if let Some(still) = &self.still {
            return Frame::Still(still.clone());
        }
        match &self.attached {
            Some(clip) if clip.status == LoadStatus::Loaded => Frame::Live(clip.url.clone()),
            _ => Frame::Blank,
        }
    }

    fn repaint(&mut self) {
        let frame = self.visible();
        if self.frames.last() != Some(&frame) {
            self.frames.push(frame);
        }
    }
}

/// Host media element driven by a [`MediaScript`].
pub struct SimulatedMediaElement {
    script: MediaScript,
    element: Mutex<Element>,
}

impl SimulatedMediaElement {
    #[must_use]
    pub fn new(script: MediaScript) -> Self {
        let mut element = Element::default();
        if let Some(initial) = &script.initial {
            element.buffered.insert(initial.url.clone());
            element.attached = Some(initial.clone().with_status(LoadStatus::Loaded));
        }
        element.repaint();
        Self {
            script,
            element: Mutex::new(element),
        }
    }

    /// Every picture shown so far, in order.
    #[must_use]
    pub fn frames(&self) -> Vec<Frame> {
        self.lock().frames.clone()
    }

    /// How often the viewer saw an empty frame after something was shown.
    #[must_use]
    pub fn blank_frames(&self) -> usize {
        self.lock()
            .frames
            .iter()
            .skip_while(|frame| **frame == Frame::Blank)
            .filter(|frame| **frame == Frame::Blank)
            .count()
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    /// Captured proxies not yet released.
    #[must_use]
    pub fn live_proxies(&self) -> usize {
        self.lock().live_proxies
    }

    #[must_use]
    pub fn loads_in_flight(&self) -> usize {
        self.lock().loads_in_flight
    }

    /// Load status of the attached clip.
    #[must_use]
    pub fn attached_status(&self) -> Option<LoadStatus> {
        self.lock().attached.as_ref().map(|clip| clip.status)
    }

    fn lock(&self) -> MutexGuard<'_, Element> {
        self.element.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts a preload as in flight until it finishes or is dropped.
struct Loading<'a>(&'a SimulatedMediaElement);

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        let mut element = self.0.lock();
        element.loads_in_flight = element.loads_in_flight.saturating_sub(1);
    }
}

impl MediaElement for SimulatedMediaElement {
    fn current_source(&self) -> Option<String> {
        self.lock().attached.as_ref().map(|clip| clip.url.clone())
    }

    fn capture_frame(&self) -> Option<FrameProxy> {
        let mut element = self.lock();
        let captured_from = match element.visible() {
            Frame::Blank => return None,
            Frame::Live(url) | Frame::Proxy(url) | Frame::Still(url) => url,
        };
        element.next_handle += 1;
        element.live_proxies += 1;
        Some(FrameProxy {
            handle: element.next_handle,
            captured_from,
        })
    }

    fn show_proxy(&self, proxy: &FrameProxy) {
        let mut element = self.lock();
        element.proxy = Some(proxy.clone());
        element.repaint();
    }

    fn hide_proxy(&self, proxy: &FrameProxy) {
        let mut element = self.lock();
        if element.proxy.as_ref().is_some_and(|shown| shown.handle == proxy.handle) {
            element.proxy = None;
            element.repaint();
        }
    }

    fn release_proxy(&self, proxy: FrameProxy) {
        tracing::trace!(handle = proxy.handle, "frame proxy released");
        let mut element = self.lock();
        element.live_proxies = element.live_proxies.saturating_sub(1);
    }

    fn preload(&self, clip: &MediaAsset) -> impl Future<Output = Result<(), MediaError>> + Send {
        let url = clip.url.clone();
        async move {
            self.lock().loads_in_flight += 1;
            let _loading = Loading(self);

            tokio::time::sleep(self.script.load_latency).await;
            if self.script.failing.contains(&url) {
                tracing::debug!(%url, "simulated load failure");
                return Err(MediaError::LoadFailed { url });
            }
            self.lock().buffered.insert(url);
            Ok(())
        }
    }

    fn swap_to(&self, clip: &MediaAsset) {
        let mut element = self.lock();
        let status = if element.buffered.contains(&clip.url) {
            LoadStatus::Loaded
        } else {
            LoadStatus::Loading
        };
        element.attached = Some(clip.clone().with_status(status));
        element.still = None;
        element.playing = false;
        element.repaint();
    }

    fn rewind(&self) {
        self.lock().playing = false;
    }

    fn play(&self) -> impl Future<Output = Result<(), MediaError>> + Send {
        async move {
            if self.script.reject_playback {
                return Err(MediaError::PlaybackRejected);
            }
            self.lock().playing = true;
            Ok(())
        }
    }

    fn ended(&self) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(self.script.clip_length)
    }

    fn pause(&self) {
        self.lock().playing = false;
    }

    fn show_still(&self, still: &MediaAsset) {
        let mut element = self.lock();
        element.still = Some(still.url.clone());
        element.repaint();
    }

    fn hide_still(&self) {
        let mut element = self.lock();
        if element.still.take().is_some() {
            element.repaint();
        }
    }
}
