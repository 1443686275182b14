//! Test doubles shared by the engine's unit tests.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use homifi_domain::device::{DeviceKind, DeviceState};
use homifi_domain::error::MediaError;
use homifi_domain::media::{FrameProxy, MediaAsset};

use crate::lock;
use crate::ports::{AssetResolver, MediaElement};
use crate::store::{DeviceSnapshot, DeviceStore, Subscription};

/// Let every ready task run without advancing the clock.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Resolver with one clip per curtain motion and a still per curtain state.
pub struct FakeResolver;

impl FakeResolver {
    pub const OPENING: &'static str = "/video/curtains-opening.mp4";
    pub const CLOSING: &'static str = "/video/curtains-closing.mp4";
    pub const OPEN_STILL: &'static str = "/still/open.png";
    pub const CLOSED_STILL: &'static str = "/still/closed.png";
}

impl AssetResolver for FakeResolver {
    fn clip(&self, kind: DeviceKind, state: DeviceState) -> Option<MediaAsset> {
        match (kind, state) {
            (DeviceKind::Curtain, DeviceState::Opening) => Some(MediaAsset::clip(Self::OPENING)),
            (DeviceKind::Curtain, DeviceState::Closing) => Some(MediaAsset::clip(Self::CLOSING)),
            _ => None,
        }
    }

    fn still(&self, kind: DeviceKind, state: DeviceState) -> Option<MediaAsset> {
        match (kind, state) {
            (DeviceKind::Curtain, DeviceState::Open) => Some(MediaAsset::still(Self::OPEN_STILL)),
            (DeviceKind::Curtain, DeviceState::Closed) => {
                Some(MediaAsset::still(Self::CLOSED_STILL))
            }
            _ => None,
        }
    }
}

/// Collects every snapshot delivered to one subscription.
pub struct Recorder {
    initial: DeviceState,
    seen: Arc<Mutex<Vec<DeviceSnapshot>>>,
    _subscription: Subscription,
}

impl Recorder {
    pub fn attach(store: &Arc<DeviceStore>) -> Self {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = store.subscribe(move |snapshot| lock(&sink).push(*snapshot));
        Self {
            initial: store.state(),
            seen,
            _subscription: subscription,
        }
    }

    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        lock(&self.seen).clone()
    }

    pub fn states(&self) -> Vec<DeviceState> {
        self.snapshots().iter().map(|s| s.state).collect()
    }

    /// States in commit order, without the repeats carried by
    /// acceptance notifications.
    pub fn committed_states(&self) -> Vec<DeviceState> {
        let mut previous = self.initial;
        let mut committed = Vec::new();
        for state in self.states() {
            if state != previous {
                committed.push(state);
                previous = state;
            }
        }
        committed
    }

    pub fn last(&self) -> Option<DeviceSnapshot> {
        lock(&self.seen).last().copied()
    }

    pub fn count(&self) -> usize {
        lock(&self.seen).len()
    }
}

/// What the viewer sees on a [`FakeMedia`] element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shown {
    Blank,
    Live(String),
    Proxy(String),
    Still(String),
}

#[derive(Default)]
struct FakeState {
    source: Option<String>,
    still: Option<String>,
    proxy: Option<String>,
    buffered: HashSet<String>,
    shown: Vec<Shown>,
    paused: bool,
    next_handle: u64,
    captures: usize,
    outstanding_proxies: usize,
    preloads: usize,
    loads_in_flight: usize,
    rewinds: usize,
}

impl FakeState {
    fn visible(&self) -> Shown {
        if let Some(proxy) = &self.proxy {
            return Shown::Proxy(proxy.clone());
        }
        if let Some(still) = &self.still {
            return Shown::Still(still.clone());
        }
        match &self.source {
            Some(source) if self.buffered.contains(source) => Shown::Live(source.clone()),
            _ => Shown::Blank,
        }
    }

    fn record(&mut self) {
        let now = self.visible();
        let changed = match self.shown.last() {
            Some(last) => *last != now,
            None => now != Shown::Blank,
        };
        if changed {
            self.shown.push(now);
        }
    }
}

/// Scriptable media element.
pub struct FakeMedia {
    state: Mutex<FakeState>,
    load_latency: Duration,
    clip_length: Duration,
    failing: HashSet<String>,
    reject_playback: bool,
    stall: bool,
}

impl FakeMedia {
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            load_latency: Duration::from_millis(300),
            clip_length: Duration::from_secs(4),
            failing: HashSet::new(),
            reject_playback: false,
            stall: false,
        }
    }

    /// Element already showing the last frame of `clip`.
    pub fn playing(clip: &MediaAsset) -> Self {
        let media = Self::empty();
        {
            let mut state = lock(&media.state);
            state.source = Some(clip.url.clone());
            state.buffered.insert(clip.url.clone());
            state.paused = true;
            state.record();
        }
        media
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn rejecting_playback(mut self) -> Self {
        self.reject_playback = true;
        self
    }

    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn with_load_latency(mut self, latency: Duration) -> Self {
        self.load_latency = latency;
        self
    }

    pub fn with_clip_length(mut self, length: Duration) -> Self {
        self.clip_length = length;
        self
    }

    pub fn shown(&self) -> Vec<Shown> {
        lock(&self.state).shown.clone()
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.state).paused
    }

    pub fn captures(&self) -> usize {
        lock(&self.state).captures
    }

    pub fn outstanding_proxies(&self) -> usize {
        lock(&self.state).outstanding_proxies
    }

    pub fn preload_count(&self) -> usize {
        lock(&self.state).preloads
    }

    pub fn loads_in_flight(&self) -> usize {
        lock(&self.state).loads_in_flight
    }

    pub fn rewind_count(&self) -> usize {
        lock(&self.state).rewinds
    }
}

struct InFlight<'a>(&'a Mutex<FakeState>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.0).loads_in_flight -= 1;
    }
}

impl MediaElement for FakeMedia {
    fn current_source(&self) -> Option<String> {
        lock(&self.state).source.clone()
    }

    fn capture_frame(&self) -> Option<FrameProxy> {
        let mut state = lock(&self.state);
        let captured_from = match state.visible() {
            Shown::Blank => return None,
            Shown::Live(url) | Shown::Proxy(url) | Shown::Still(url) => url,
        };
        state.captures += 1;
        state.outstanding_proxies += 1;
        state.next_handle += 1;
        Some(FrameProxy {
            handle: state.next_handle,
            captured_from,
        })
    }

    fn show_proxy(&self, proxy: &FrameProxy) {
        let mut state = lock(&self.state);
        state.proxy = Some(proxy.captured_from.clone());
        state.record();
    }

    fn hide_proxy(&self, _proxy: &FrameProxy) {
        let mut state = lock(&self.state);
        state.proxy = None;
        state.record();
    }

    fn release_proxy(&self, _proxy: FrameProxy) {
        lock(&self.state).outstanding_proxies -= 1;
    }

    fn preload(&self, clip: &MediaAsset) -> impl Future<Output = Result<(), MediaError>> + Send {
        let url = clip.url.clone();
        async move {
            {
                let mut state = lock(&self.state);
                state.preloads += 1;
                state.loads_in_flight += 1;
            }
            let _flight = InFlight(&self.state);
            tokio::time::sleep(self.load_latency).await;
            if self.failing.contains(&url) {
                return Err(MediaError::LoadFailed { url });
            }
            lock(&self.state).buffered.insert(url);
            Ok(())
        }
    }

    fn swap_to(&self, clip: &MediaAsset) {
        let mut state = lock(&self.state);
        state.source = Some(clip.url.clone());
        state.still = None;
        state.record();
    }

    fn rewind(&self) {
        lock(&self.state).rewinds += 1;
    }

    fn play(&self) -> impl Future<Output = Result<(), MediaError>> + Send {
        async move {
            if self.reject_playback {
                return Err(MediaError::PlaybackRejected);
            }
            lock(&self.state).paused = false;
            Ok(())
        }
    }

    fn ended(&self) -> impl Future<Output = ()> + Send {
        async move {
            if self.stall {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(self.clip_length).await;
        }
    }

    fn pause(&self) {
        lock(&self.state).paused = true;
    }

    fn show_still(&self, still: &MediaAsset) {
        let mut state = lock(&self.state);
        state.still = Some(still.url.clone());
        state.record();
    }

    fn hide_still(&self) {
        let mut state = lock(&self.state);
        if state.still.take().is_some() {
            state.record();
        }
    }
}
