//! REST endpoints of the device and the mapping from player commands to requests

use serde_json::{json, Value};
use strum_macros::Display;

use crate::data::{PlayerCommand, PlayerState, PowerState};

/// Default HTTP port of the BeoNotify/BeoZone API
pub const DEFAULT_PORT: u16 = 8080;

pub const NOTIFICATIONS_PATH: &str = "/BeoNotify/Notifications";
pub const STANDBY_PATH: &str = "/BeoDevice/powerManagement/standby";
pub const VOLUME_LEVEL_PATH: &str = "/BeoZone/Zone/Sound/Volume/Speaker/Level";
pub const VOLUME_MUTED_PATH: &str = "/BeoZone/Zone/Sound/Volume/Speaker/Muted";
pub const STREAM_PATH: &str = "/BeoZone/Zone/Stream";

/// Suffix of the endpoint that ends a button press
pub const RELEASE_SUFFIX: &str = "/Release";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Put,
    Post,
}

/// Transport actions on the stream endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StreamAction {
    Play,
    Pause,
    Stop,
    Forward,
    Backward,
}

impl StreamAction {
    pub fn path(&self) -> String {
        format!("{}/{}", STREAM_PATH, self)
    }

    pub fn release_path(&self) -> String {
        format!("{}{}", self.path(), RELEASE_SUFFIX)
    }
}

/// One outbound REST call
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl DeviceRequest {
    pub fn get(path: &str) -> Self {
        Self { method: Method::Get, path: path.to_string(), body: None }
    }

    pub fn put(path: &str, body: Value) -> Self {
        Self { method: Method::Put, path: path.to_string(), body: Some(body) }
    }

    pub fn post(path: &str) -> Self {
        Self { method: Method::Post, path: path.to_string(), body: None }
    }

    /// The power poll is identified by method and path
    pub fn is_standby_poll(&self) -> bool {
        self.method == Method::Get && self.path == STANDBY_PATH
    }
}

/// Body of the standby endpoint, for both GET responses and PUT requests
pub fn standby_body(power: PowerState) -> Value {
    json!({ "standby": { "powerState": power.as_device_str() } })
}

/// The device models each control as a press followed by a release
pub fn press_and_release(action: StreamAction) -> Vec<DeviceRequest> {
    vec![
        DeviceRequest::post(&action.path()),
        DeviceRequest::post(&action.release_path()),
    ]
}

/// Requests needed to carry out `command`, in the order they must be sent
///
/// `current` is only read by commands that depend on live state (mute toggle).
pub fn command_requests(command: PlayerCommand, current: &PlayerState) -> Vec<DeviceRequest> {
    match command {
        PlayerCommand::SetVolume(level) => {
            vec![DeviceRequest::put(VOLUME_LEVEL_PATH, json!({ "level": level.min(100) }))]
        }
        PlayerCommand::ToggleMute => {
            vec![DeviceRequest::put(VOLUME_MUTED_PATH, json!({ "muted": !current.is_muted() }))]
        }
        PlayerCommand::SetMute(muted) => {
            vec![DeviceRequest::put(VOLUME_MUTED_PATH, json!({ "muted": muted }))]
        }
        PlayerCommand::Play => press_and_release(StreamAction::Play),
        PlayerCommand::Pause => press_and_release(StreamAction::Pause),
        PlayerCommand::Stop => press_and_release(StreamAction::Stop),
        PlayerCommand::Next => press_and_release(StreamAction::Forward),
        PlayerCommand::Previous => press_and_release(StreamAction::Backward),
        PlayerCommand::PowerOn => vec![DeviceRequest::put(STANDBY_PATH, standby_body(PowerState::On))],
        PlayerCommand::PowerOff => vec![DeviceRequest::put(STANDBY_PATH, standby_body(PowerState::Standby))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_volume() {
        let requests = command_requests(PlayerCommand::SetVolume(37), &PlayerState::new());
        assert_eq!(requests, vec![DeviceRequest::put(VOLUME_LEVEL_PATH, json!({"level": 37}))]);
    }

    #[test]
    fn test_mute_toggle_reads_current_state() {
        let mut state = PlayerState::new();
        let requests = command_requests(PlayerCommand::ToggleMute, &state);
        assert_eq!(requests[0].body, Some(json!({"muted": true})));

        state.muted = Some(true);
        let requests = command_requests(PlayerCommand::ToggleMute, &state);
        assert_eq!(requests[0].path, VOLUME_MUTED_PATH);
        assert_eq!(requests[0].body, Some(json!({"muted": false})));
    }

    #[test]
    fn test_transport_commands_press_and_release() {
        let state = PlayerState::new();
        let cases = [
            (PlayerCommand::Play, "Play"),
            (PlayerCommand::Pause, "Pause"),
            (PlayerCommand::Stop, "Stop"),
            (PlayerCommand::Next, "Forward"),
            (PlayerCommand::Previous, "Backward"),
        ];
        for (command, action) in cases {
            let requests = command_requests(command, &state);
            assert_eq!(requests.len(), 2, "{}", command);
            assert_eq!(requests[0].method, Method::Post);
            assert_eq!(requests[0].path, format!("/BeoZone/Zone/Stream/{}", action));
            assert_eq!(requests[1].path, format!("/BeoZone/Zone/Stream/{}/Release", action));
            assert_eq!(requests[1].body, None);
        }
    }

    #[test]
    fn test_power_commands() {
        let state = PlayerState::new();
        let on = command_requests(PlayerCommand::PowerOn, &state);
        assert_eq!(on, vec![DeviceRequest::put(STANDBY_PATH, json!({"standby": {"powerState": "on"}}))]);

        let off = command_requests(PlayerCommand::PowerOff, &state);
        assert_eq!(off[0].method, Method::Put);
        assert_eq!(off[0].body, Some(json!({"standby": {"powerState": "standby"}})));
        assert!(!off[0].is_standby_poll());
        assert!(DeviceRequest::get(STANDBY_PATH).is_standby_poll());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Post.to_string(), "POST");
    }
}
