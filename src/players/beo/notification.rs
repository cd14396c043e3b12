//! Decoder for the BeoNotify streaming protocol
//!
//! The device writes JSON documents separated by a blank line and flushes
//! them independently of message boundaries, so a single read can hold zero,
//! one or several frames.

use log::{debug, trace, warn};
use serde_json::Value;

use crate::data::{NotificationEvent, TransportState};
use super::error::{BeoError, ProtocolError};

/// Separator between two notification frames
pub const FRAME_DELIMITER: &str = "\r\n\r\n";

pub const TYPE_VOLUME: &str = "VOLUME";
pub const TYPE_SOURCE: &str = "SOURCE";
pub const TYPE_PROGRESS: &str = "PROGRESS_INFORMATION";
pub const TYPE_STORED_MUSIC: &str = "NOW_PLAYING_STORED_MUSIC";
pub const TYPE_NET_RADIO: &str = "NOW_PLAYING_NET_RADIO";

/// Result of decoding one read from the stream
#[derive(Debug, Default, PartialEq)]
pub struct DecodedBuffer {
    /// Events in stream order, including `Unknown` ones
    pub events: Vec<NotificationEvent>,

    /// Set when a malformed segment stopped decoding; events before it are kept
    pub error: Option<ProtocolError>,
}

/// Decode every frame in `buffer`
///
/// A segment that is not valid JSON aborts the rest of the buffer.
pub fn decode_buffer(buffer: &[u8]) -> DecodedBuffer {
    let text = String::from_utf8_lossy(buffer);
    let mut decoded = DecodedBuffer::default();

    for segment in text.split(FRAME_DELIMITER) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        trace!("Notification frame: {}", segment);

        let document: Value = match serde_json::from_str(segment) {
            Ok(document) => document,
            Err(e) => {
                warn!("JSON error in notification frame: {}", e);
                decoded.error = Some(ProtocolError::Json(e.to_string()));
                break;
            }
        };

        decoded.events.push(decode_document(&document));
    }

    decoded
}

/// Classify a parsed `{"notification": {...}}` document
pub fn decode_document(document: &Value) -> NotificationEvent {
    match document.get("notification") {
        Some(notification) if notification.is_object() => decode_notification(notification),
        _ => {
            debug!("Document without notification object, ignoring");
            NotificationEvent::Unknown
        }
    }
}

/// Classify the inner notification object by its `type` field
///
/// Ignored types and frames missing required fields decode to `Unknown`.
pub fn decode_notification(notification: &Value) -> NotificationEvent {
    match classify_notification(notification) {
        Ok(event) => event,
        Err(BeoError::UnsupportedEvent(kind)) => {
            trace!("Ignoring notification type {}", kind);
            NotificationEvent::Unknown
        }
        Err(e) => {
            debug!("Ignoring notification: {}", e);
            NotificationEvent::Unknown
        }
    }
}

/// Like [`decode_notification`], but reports why a frame was not usable
pub fn classify_notification(notification: &Value) -> Result<NotificationEvent, BeoError> {
    let kind = notification.get("type").and_then(Value::as_str).unwrap_or_default();
    let data = notification
        .get("data")
        .ok_or_else(|| ProtocolError::UnexpectedShape(format!("{} has no data", kind)))?;

    let event = match kind {
        TYPE_VOLUME => decode_volume(data),
        TYPE_SOURCE => decode_source(data),
        TYPE_PROGRESS => Some(decode_progress(data)),
        TYPE_STORED_MUSIC => Some(decode_stored_music(data)),
        TYPE_NET_RADIO => Some(decode_net_radio(data)),
        _ => return Err(BeoError::UnsupportedEvent(kind.to_string())),
    };

    let event = event
        .ok_or_else(|| ProtocolError::UnexpectedShape(format!("{} is missing required fields", kind)))?;
    Ok(event)
}

/// Map a `GET /BeoDevice/powerManagement/standby` response to a power event
///
/// Anything other than `"on"` counts as standby.
pub fn decode_standby(response: &Value) -> NotificationEvent {
    let on = response
        .pointer("/standby/powerState")
        .and_then(Value::as_str)
        .map(|state| state == "on")
        .unwrap_or(false);
    NotificationEvent::PowerState { on }
}

fn decode_volume(data: &Value) -> Option<NotificationEvent> {
    let speaker = data.get("speaker")?;
    // The level sometimes arrives as a float
    let level = speaker.get("level").and_then(Value::as_f64)?.trunc() as i32;
    let muted = speaker.get("muted").and_then(Value::as_bool).unwrap_or(false);
    Some(NotificationEvent::Volume { level, muted })
}

fn decode_source(data: &Value) -> Option<NotificationEvent> {
    let friendly_name = data
        .pointer("/primaryExperience/source/friendlyName")
        .and_then(Value::as_str)?;
    Some(NotificationEvent::Source { friendly_name: friendly_name.to_string() })
}

fn decode_progress(data: &Value) -> NotificationEvent {
    let state = data
        .get("state")
        .and_then(Value::as_str)
        .and_then(|state| state.parse::<TransportState>().ok());
    NotificationEvent::Progress {
        state,
        position_sec: seconds(data.get("position")),
        duration_sec: seconds(data.get("totalDuration")),
    }
}

fn decode_stored_music(data: &Value) -> NotificationEvent {
    NotificationEvent::NowPlayingStoredMusic {
        artist: string_field(data, "artist"),
        track: string_field(data, "name"),
        album: string_field(data, "album"),
        image_url: first_image_url(data.get("trackImage")),
    }
}

fn decode_net_radio(data: &Value) -> NotificationEvent {
    NotificationEvent::NowPlayingNetRadio {
        name: string_field(data, "name"),
        live_description: string_field(data, "liveDescription"),
        image_url: first_image_url(data.get("image")),
    }
}

fn string_field(data: &Value, key: &str) -> String {
    data.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn seconds(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_f64)
        .filter(|secs| *secs > 0.0)
        .map(|secs| secs as u32)
        .unwrap_or(0)
}

fn first_image_url(images: Option<&Value>) -> Option<String> {
    images?
        .as_array()?
        .first()?
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(notification: Value) -> String {
        json!({ "notification": notification }).to_string()
    }

    #[test]
    fn test_volume_frame() {
        let buffer = frame(json!({"type": "VOLUME", "data": {"speaker": {"level": 37, "muted": false}}}));
        let decoded = decode_buffer(buffer.as_bytes());
        assert_eq!(decoded.error, None);
        assert_eq!(decoded.events, vec![NotificationEvent::Volume { level: 37, muted: false }]);
    }

    #[test]
    fn test_volume_level_as_float() {
        let event = decode_notification(&json!({"type": "VOLUME", "data": {"speaker": {"level": 41.6, "muted": true}}}));
        assert_eq!(event, NotificationEvent::Volume { level: 41, muted: true });
    }

    #[test]
    fn test_volume_without_level_is_unknown() {
        let event = decode_notification(&json!({"type": "VOLUME", "data": {"speaker": {"muted": true}}}));
        assert!(event.is_unknown());
    }

    #[test]
    fn test_source_frame() {
        let event = decode_notification(&json!({
            "type": "SOURCE",
            "data": {"primaryExperience": {"source": {"friendlyName": "TuneIn", "id": "radio:1111"}}}
        }));
        assert_eq!(event, NotificationEvent::Source { friendly_name: "TuneIn".to_string() });
    }

    #[test]
    fn test_progress_frame() {
        let event = decode_notification(&json!({
            "type": "PROGRESS_INFORMATION",
            "data": {"state": "pause", "position": 42, "totalDuration": 300}
        }));
        assert_eq!(event, NotificationEvent::Progress {
            state: Some(TransportState::Pause),
            position_sec: 42,
            duration_sec: 300,
        });
    }

    #[test]
    fn test_progress_with_unrecognized_state() {
        let event = decode_notification(&json!({
            "type": "PROGRESS_INFORMATION",
            "data": {"state": "preparing", "position": 0}
        }));
        assert_eq!(event, NotificationEvent::Progress { state: None, position_sec: 0, duration_sec: 0 });
    }

    #[test]
    fn test_stored_music_frame() {
        let event = decode_notification(&json!({
            "type": "NOW_PLAYING_STORED_MUSIC",
            "data": {
                "name": "Teardrop",
                "artist": "Massive Attack",
                "album": "Mezzanine",
                "trackImage": [{"url": "http://img/1.jpg", "size": "large"}, {"url": "http://img/2.jpg"}]
            }
        }));
        assert_eq!(event, NotificationEvent::NowPlayingStoredMusic {
            artist: "Massive Attack".to_string(),
            track: "Teardrop".to_string(),
            album: "Mezzanine".to_string(),
            image_url: Some("http://img/1.jpg".to_string()),
        });
    }

    #[test]
    fn test_net_radio_frame_without_image() {
        let event = decode_notification(&json!({
            "type": "NOW_PLAYING_NET_RADIO",
            "data": {"name": "Radio Paradise", "liveDescription": "Now: Air - La femme d'argent", "image": []}
        }));
        assert_eq!(event, NotificationEvent::NowPlayingNetRadio {
            name: "Radio Paradise".to_string(),
            live_description: "Now: Air - La femme d'argent".to_string(),
            image_url: None,
        });
    }

    #[test]
    fn test_unknown_type_is_dropped_silently() {
        let decoded = decode_buffer(frame(json!({"type": "SHUTDOWN_REQUEST", "data": {}})).as_bytes());
        assert_eq!(decoded.events, vec![NotificationEvent::Unknown]);
        assert_eq!(decoded.error, None);
    }

    #[test]
    fn test_two_frames_in_one_buffer() {
        let buffer = format!(
            "{}\r\n\r\n{}\r\n\r\n",
            frame(json!({"type": "VOLUME", "data": {"speaker": {"level": 20, "muted": false}}})),
            frame(json!({"type": "PROGRESS_INFORMATION", "data": {"state": "play", "position": 5, "totalDuration": 200}})),
        );
        let decoded = decode_buffer(buffer.as_bytes());
        assert_eq!(decoded.events.len(), 2);
        assert_eq!(decoded.events[0].kind(), "volume");
        assert_eq!(decoded.events[1].kind(), "progress");
    }

    #[test]
    fn test_whitespace_and_empty_segments_are_skipped() {
        let buffer = format!("\r\n\r\n  \r\n\r\n{}\n\r\n\r\n", frame(json!({"type": "VOLUME", "data": {"speaker": {"level": 3}}})));
        let decoded = decode_buffer(buffer.as_bytes());
        assert_eq!(decoded.events, vec![NotificationEvent::Volume { level: 3, muted: false }]);
    }

    #[test]
    fn test_malformed_segment_aborts_rest_of_buffer() {
        let buffer = format!(
            "{}\r\n\r\n{{\"notification\": {{\"type\": \r\n\r\n{}",
            frame(json!({"type": "VOLUME", "data": {"speaker": {"level": 10, "muted": false}}})),
            frame(json!({"type": "SOURCE", "data": {"primaryExperience": {"source": {"friendlyName": "Spotify"}}}})),
        );
        let decoded = decode_buffer(buffer.as_bytes());
        assert_eq!(decoded.events, vec![NotificationEvent::Volume { level: 10, muted: false }]);
        assert!(matches!(decoded.error, Some(ProtocolError::Json(_))));
    }

    #[test]
    fn test_empty_buffer() {
        assert_eq!(decode_buffer(b""), DecodedBuffer::default());
    }

    #[test]
    fn test_standby_response() {
        assert_eq!(decode_standby(&json!({"standby": {"powerState": "on"}})), NotificationEvent::PowerState { on: true });
        assert_eq!(decode_standby(&json!({"standby": {"powerState": "standby"}})), NotificationEvent::PowerState { on: false });
        assert_eq!(decode_standby(&json!({})), NotificationEvent::PowerState { on: false });
    }

    #[test]
    fn test_classify_reports_why_frames_are_dropped() {
        assert_eq!(
            classify_notification(&json!({"type": "SHUFFLE", "data": {}})),
            Err(BeoError::UnsupportedEvent("SHUFFLE".to_string()))
        );
        assert!(matches!(
            classify_notification(&json!({"type": "VOLUME"})),
            Err(BeoError::Protocol(ProtocolError::UnexpectedShape(_)))
        ));
        assert!(matches!(
            classify_notification(&json!({"type": "SOURCE", "data": {}})),
            Err(BeoError::Protocol(ProtocolError::UnexpectedShape(_)))
        ));
        assert_eq!(
            classify_notification(&json!({"type": "VOLUME", "data": {"speaker": {"level": 12}}})),
            Ok(NotificationEvent::Volume { level: 12, muted: false })
        );
    }
}
