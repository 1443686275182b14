//! Media assets: the stills and clips that portray device states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Whether an asset is shown as-is or played back over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Static,
    Playable,
}

/// Buffering status of a playable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    NotLoaded,
    Loading,
    /// Buffered enough to play through without stalling.
    Loaded,
    Failed,
}

/// An image or clip bound to a device state or state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Reference the host understands (a URL for web hosts).
    pub url: String,
    pub kind: MediaKind,
    /// Only meaningful for [`MediaKind::Playable`] assets.
    #[serde(default)]
    pub status: LoadStatus,
}

impl MediaAsset {
    /// A still image.
    pub fn still(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: MediaKind::Static,
            status: LoadStatus::Loaded,
        }
    }

    /// A playable clip, not yet loaded.
    pub fn clip(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: MediaKind::Playable,
            status: LoadStatus::NotLoaded,
        }
    }

    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.kind == MediaKind::Playable
    }

    /// Whether both assets point at the same source.
    #[must_use]
    pub fn same_source(&self, other: &Self) -> bool {
        self.url == other.url
    }

    /// Copy of this asset with an updated load status.
    #[must_use]
    pub fn with_status(mut self, status: LoadStatus) -> Self {
        self.status = status;
        self
    }
}

impl fmt::Display for MediaAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// A still captured from the frame a media element is currently showing.
///
/// Holds decoded-frame memory on the host until released.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameProxy {
    /// Host handle used to show and release the capture.
    pub handle: u64,
    /// Source the frame was captured from.
    pub captured_from: String,
}
