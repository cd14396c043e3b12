// Data structures for the Bang & Olufsen controller

pub mod capabilities;
pub mod connection_state;
pub mod media;
pub mod notification_event;
pub mod playback_state;
pub mod player_command;
pub mod player_event;
pub mod player_state;

// Re-export types from child modules
pub use capabilities::*;
pub use connection_state::*;
pub use media::*;
pub use notification_event::*;
pub use playback_state::*;
pub use player_command::*;
pub use player_event::*;
pub use player_state::*;
