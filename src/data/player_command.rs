/// Commands that can be sent to the device
use serde::{Serialize, Deserialize};

use super::capabilities::PlayerCapability;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerCommand {
    Play,
    Pause,
    Stop,
    Next,
    Previous,

    /// Absolute speaker level, 0-100
    SetVolume(u8),

    /// Invert the mute flag of the current player state
    ToggleMute,

    SetMute(bool),
    PowerOn,

    /// Put the device into standby
    PowerOff,
}

impl PlayerCommand {
    /// Capability the player must declare to accept this command
    pub fn required_capability(&self) -> PlayerCapability {
        match self {
            PlayerCommand::Play => PlayerCapability::Play,
            PlayerCommand::Pause => PlayerCapability::Pause,
            PlayerCommand::Stop => PlayerCapability::Stop,
            PlayerCommand::Next => PlayerCapability::Next,
            PlayerCommand::Previous => PlayerCapability::Previous,
            PlayerCommand::SetVolume(_) => PlayerCapability::VolumeSet,
            PlayerCommand::ToggleMute | PlayerCommand::SetMute(_) => PlayerCapability::Mute,
            PlayerCommand::PowerOn => PlayerCapability::TurnOn,
            PlayerCommand::PowerOff => PlayerCapability::TurnOff,
        }
    }
}

impl std::fmt::Display for PlayerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerCommand::Play => write!(f, "play"),
            PlayerCommand::Pause => write!(f, "pause"),
            PlayerCommand::Stop => write!(f, "stop"),
            PlayerCommand::Next => write!(f, "next"),
            PlayerCommand::Previous => write!(f, "previous"),
            PlayerCommand::SetVolume(level) => write!(f, "set_volume:{}", level),
            PlayerCommand::ToggleMute => write!(f, "toggle_mute"),
            PlayerCommand::SetMute(muted) => write!(f, "set_mute:{}", if *muted { "on" } else { "off" }),
            PlayerCommand::PowerOn => write!(f, "power_on"),
            PlayerCommand::PowerOff => write!(f, "power_off"),
        }
    }
}
