//! Merges decoded notification events into the normalized player state

use crate::data::{MediaType, NotificationEvent, PlaybackState, PlayerState, PowerState, TransportState};

/// Highest speaker level the normalized state accepts
pub const MAX_VOLUME: i32 = 100;

/// Apply `event` to `state` and return the merged state
///
/// Only the fields carried by the event variant are written; everything else
/// is copied unchanged. Capability gating is up to the caller.
pub fn apply(state: &PlayerState, event: &NotificationEvent) -> PlayerState {
    let mut next = state.clone();

    match event {
        NotificationEvent::Volume { level, muted } => {
            next.volume = Some((*level).clamp(0, MAX_VOLUME) as u8);
            next.muted = Some(*muted);
        }
        NotificationEvent::Source { friendly_name } => {
            if !friendly_name.is_empty() {
                next.source = Some(friendly_name.clone());
            }
        }
        NotificationEvent::Progress { state: transport, position_sec, duration_sec } => {
            if let Some(transport) = transport {
                next.playback = playback_state(*transport);
            }
            next.media.position = Some(*position_sec);
            next.media.duration = Some(*duration_sec);
        }
        NotificationEvent::NowPlayingStoredMusic { artist, track, album, image_url } => {
            next.media.media_type = Some(MediaType::Music);
            next.media.title = Some(track.clone());
            next.media.artist = Some(artist.clone());
            next.media.album = Some(album.clone());
            if let Some(url) = image_url {
                next.media.image_url = Some(url.clone());
            }
        }
        NotificationEvent::NowPlayingNetRadio { name, live_description, image_url } => {
            // Stations have no album; the station name takes the artist slot
            next.media.media_type = Some(MediaType::Radio);
            next.media.title = Some(live_description.clone());
            next.media.artist = Some(name.clone());
            next.media.album = None;
            if let Some(url) = image_url {
                next.media.image_url = Some(url.clone());
            }
        }
        NotificationEvent::PowerState { on } => {
            next.power = if *on { PowerState::On } else { PowerState::Standby };
        }
        NotificationEvent::Unknown => {}
    }

    next
}

/// Map the device transport state to the host playback state
///
/// Paused and stopped are both reported as idle.
pub fn playback_state(transport: TransportState) -> PlaybackState {
    match transport {
        TransportState::Play => PlaybackState::Playing,
        TransportState::Pause | TransportState::Stop => PlaybackState::Idle,
    }
}
