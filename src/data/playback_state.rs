/// Playback status as exposed to the host
use serde::{Serialize, Deserialize};
use strum_macros::EnumString;

/// The device does not distinguish paused from stopped, so both map to `Idle`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlaybackState {
    /// Player is actively playing media
    Playing,
    /// Playback is paused or stopped
    Idle,
    /// No progress information received yet
    Unknown,
}

impl Default for PlaybackState {
    fn default() -> Self {
        PlaybackState::Unknown
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Unknown => write!(f, "unknown"),
        }
    }
}

/// Power state reported by the standby endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PowerState {
    On,
    Standby,
    Unknown,
}

impl Default for PowerState {
    fn default() -> Self {
        PowerState::Unknown
    }
}

impl PowerState {
    /// Value used in the `powerState` field of the standby endpoint
    pub fn as_device_str(&self) -> &'static str {
        match self {
            PowerState::On => "on",
            PowerState::Standby | PowerState::Unknown => "standby",
        }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerState::On => write!(f, "on"),
            PowerState::Standby => write!(f, "standby"),
            PowerState::Unknown => write!(f, "unknown"),
        }
    }
}
