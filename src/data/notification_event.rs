/// Typed events decoded from the device's notification stream and standby poll
use serde::{Serialize, Deserialize};
use strum_macros::{Display, EnumString};

/// Transport state carried by `PROGRESS_INFORMATION` frames
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransportState {
    Play,
    Pause,
    Stop,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// `VOLUME`: speaker level and mute flag
    Volume {
        level: i32,
        muted: bool,
    },

    /// `SOURCE`: active source of the primary experience
    Source {
        friendly_name: String,
    },

    /// `PROGRESS_INFORMATION`; `state` is `None` for values other than play/pause/stop
    Progress {
        state: Option<TransportState>,
        position_sec: u32,
        duration_sec: u32,
    },

    /// `NOW_PLAYING_STORED_MUSIC`
    NowPlayingStoredMusic {
        artist: String,
        track: String,
        album: String,
        image_url: Option<String>,
    },

    /// `NOW_PLAYING_NET_RADIO`
    NowPlayingNetRadio {
        name: String,
        live_description: String,
        image_url: Option<String>,
    },

    /// Result of the standby poll
    PowerState {
        on: bool,
    },

    /// Anything else; dropped by the translator
    Unknown,
}

impl NotificationEvent {
    pub fn is_unknown(&self) -> bool {
        matches!(self, NotificationEvent::Unknown)
    }

    /// Short name used in log output
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::Volume { .. } => "volume",
            NotificationEvent::Source { .. } => "source",
            NotificationEvent::Progress { .. } => "progress",
            NotificationEvent::NowPlayingStoredMusic { .. } => "now_playing_stored_music",
            NotificationEvent::NowPlayingNetRadio { .. } => "now_playing_net_radio",
            NotificationEvent::PowerState { .. } => "power_state",
            NotificationEvent::Unknown => "unknown",
        }
    }
}
