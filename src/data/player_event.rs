use crate::data::{ConnectionState, PlayerState, PowerState};
use serde::{Serialize, Deserialize};

/// Identifies the source of a player event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSource {
    /// String identifier for the player type (e.g., "beo")
    pub player_name: String,

    /// Entity id of the player instance
    pub player_id: String,
}

impl PlayerSource {
    pub fn new(player_name: String, player_id: String) -> Self {
        Self { player_name, player_id }
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }
}

/// Events delivered to registered state listeners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Notification subscription changed state
    ConnectionChanged {
        source: PlayerSource,
        state: ConnectionState,
    },

    /// The normalized player state changed after merging an event
    StateChanged {
        source: PlayerSource,
        state: PlayerState,
    },

    /// Power state changed (poll or standby command)
    PowerChanged {
        source: PlayerSource,
        power: PowerState,
    },
}

impl PlayerEvent {
    /// Get the player source associated with this event
    pub fn source(&self) -> &PlayerSource {
        match self {
            PlayerEvent::ConnectionChanged { source, .. } => source,
            PlayerEvent::StateChanged { source, .. } => source,
            PlayerEvent::PowerChanged { source, .. } => source,
        }
    }

    pub fn player_name(&self) -> &str {
        self.source().player_name()
    }

    pub fn player_id(&self) -> &str {
        self.source().player_id()
    }
}
