//! Asset resolution port: which still or clip portrays a device state.
//!
//! The engine never assumes assets are files; it only hands the returned
//! [`MediaAsset`]s to a [`MediaElement`](super::MediaElement).

use homifi_domain::device::{DeviceKind, DeviceState};
use homifi_domain::media::MediaAsset;

/// Resolves device kinds and states to media assets.
pub trait AssetResolver: Send + Sync {
    /// Clip played while a device of `kind` is in the motion state `state`
    /// (e.g. a curtain `opening`). `None` when the host has no clip for it.
    fn clip(&self, kind: DeviceKind, state: DeviceState) -> Option<MediaAsset>;

    /// Still image of a device of `kind` resting in `state`.
    fn still(&self, kind: DeviceKind, state: DeviceState) -> Option<MediaAsset>;
}
