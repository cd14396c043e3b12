/// Plain data types shared by all players
pub mod data;

/// Player controllers, including the Bang & Olufsen integration
pub mod players;

/// Transport and retry helpers
pub mod helpers;

/// Device configuration
pub mod config;

/// Logger setup
pub mod logging;

pub use config::BeoConfig;
pub use data::{ConnectionState, PlaybackState, PlayerCommand, PlayerState, PowerState};
pub use players::{BeoPlayerController, PlayerController, PlayerStateListener};
