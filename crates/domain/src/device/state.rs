//! Device state: the canonical value a device store commits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest setpoint a climate device accepts, in °C.
pub const CLIMATE_MIN_CELSIUS: u8 = 18;
/// Highest setpoint a climate device accepts, in °C.
pub const CLIMATE_MAX_CELSIUS: u8 = 26;

/// Discrete state of a simulated device.
///
/// Each [`DeviceKind`](super::DeviceKind) draws from its own subset of these
/// values; the kind decides which ones are legal and which are intermediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    Off,
    On,
    Closed,
    Opening,
    Open,
    Closing,
    Locked,
    Unlocking,
    Unlocked,
    Clear,
    Alert,
    Notification,
    /// Climate setpoint in whole degrees Celsius.
    Temperature(u8),
}

impl DeviceState {
    /// Setpoint of a climate state, if this is one.
    #[must_use]
    pub fn celsius(self) -> Option<u8> {
        match self {
            Self::Temperature(t) => Some(t),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("off"),
            Self::On => f.write_str("on"),
            Self::Closed => f.write_str("closed"),
            Self::Opening => f.write_str("opening"),
            Self::Open => f.write_str("open"),
            Self::Closing => f.write_str("closing"),
            Self::Locked => f.write_str("locked"),
            Self::Unlocking => f.write_str("unlocking"),
            Self::Unlocked => f.write_str("unlocked"),
            Self::Clear => f.write_str("clear"),
            Self::Alert => f.write_str("alert"),
            Self::Notification => f.write_str("notification"),
            Self::Temperature(t) => write!(f, "{t}\u{b0}C"),
        }
    }
}

/// Comfort band derived from a climate setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClimateMode {
    Cool,
    Comfort,
    Warm,
}

impl ClimateMode {
    /// Classify a setpoint: `cool` at or below 20 °C, `warm` at or above 24 °C.
    #[must_use]
    pub fn from_celsius(celsius: u8) -> Self {
        if celsius <= 20 {
            Self::Cool
        } else if celsius >= 24 {
            Self::Warm
        } else {
            Self::Comfort
        }
    }

    /// The setpoint a mode button jumps to.
    #[must_use]
    pub fn preset(self) -> u8 {
        match self {
            Self::Cool => 18,
            Self::Comfort => 22,
            Self::Warm => 26,
        }
    }

    /// Next mode in the cool → comfort → warm → cool cycle.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Cool => Self::Comfort,
            Self::Comfort => Self::Warm,
            Self::Warm => Self::Cool,
        }
    }
}
