/// Normalized view of the device consumed by the host
use std::fmt;
use serde::{Serialize, Deserialize};

use super::media::MediaInfo;
use super::playback_state::{PlaybackState, PowerState};

/// Snapshot of what the device is doing.
///
/// Only ever changed by merging a `NotificationEvent`; fields an event does not
/// carry keep their previous value.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PlayerState {
    #[serde(default)]
    pub playback: PlaybackState,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// 0-100, `None` until the device reports a level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,

    #[serde(default)]
    pub media: MediaInfo,

    #[serde(default)]
    pub power: PowerState,
}

impl PlayerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_muted(&self) -> bool {
        self.muted.unwrap_or(false)
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [power: {}", self.playback, self.power)?;
        if let Some(source) = &self.source {
            write!(f, ", source: {}", source)?;
        }
        match self.volume {
            Some(volume) => write!(f, ", volume: {}", volume)?,
            None => write!(f, ", volume: unknown")?,
        }
        if self.is_muted() {
            write!(f, " (muted)")?;
        }
        write!(f, "] {}", self.media)
    }
}
