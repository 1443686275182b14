//! Static asset resolver: the product's photo and video files.

use homifi_app::ports::AssetResolver;
use homifi_domain::device::{DeviceKind, DeviceState};
use homifi_domain::media::MediaAsset;

const CURTAINS_OPENING: &str = "/video/curtains-opening.mp4";
const CURTAINS_CLOSING: &str = "/video/curtains-closing.mp4";
const OPEN_LIGHTS_ON: &str = "/Curtains-Open-Lights-On.png";
const CLOSED_LIGHTS_OFF: &str = "/Curtains-Closed-Lights-Off.png";
const CLOSED_LIGHTS_ON: &str = "/Curtains-Closed-Lights-On.png";
const HOMEPOD_ROOM: &str = "/Curtains-Open-Lights-On-Homepod.png";
const DOORBELL_VISITOR: &str = "/doorbell-visitor.png";
const TV_HOME: &str = "/apple-tv-ui.png";

/// Resolves assets to paths under an optional base URL.
#[derive(Debug, Clone, Default)]
pub struct StaticAssetResolver {
    base: String,
}

impl StaticAssetResolver {
    /// Serve every asset below `base` (e.g. a CDN origin).
    #[must_use]
    pub fn with_base(base: impl Into<String>) -> Self {
        let mut base = base.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self { base }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }
}

impl AssetResolver for StaticAssetResolver {
    fn clip(&self, kind: DeviceKind, state: DeviceState) -> Option<MediaAsset> {
        let path = match (kind, state) {
            (DeviceKind::Curtain, DeviceState::Opening) => CURTAINS_OPENING,
            (DeviceKind::Curtain, DeviceState::Closing) => CURTAINS_CLOSING,
            _ => return None,
        };
        Some(MediaAsset::clip(self.url(path)))
    }

    fn still(&self, kind: DeviceKind, state: DeviceState) -> Option<MediaAsset> {
        use DeviceState as S;
        let path = match (kind, state) {
            (DeviceKind::Light, S::On) | (DeviceKind::Curtain, S::Open) => OPEN_LIGHTS_ON,
            (DeviceKind::Light, S::Off) => CLOSED_LIGHTS_OFF,
            (DeviceKind::Curtain, S::Closed) => CLOSED_LIGHTS_ON,
            (DeviceKind::Climate, S::Temperature(_)) => HOMEPOD_ROOM,
            (DeviceKind::Security, S::Notification) => DOORBELL_VISITOR,
            (DeviceKind::Security, S::Clear) => TV_HOME,
            _ => return None,
        };
        Some(MediaAsset::still(self.url(path)))
    }
}
