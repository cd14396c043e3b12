use crate::data::{ConnectionState, PlayerCapabilitySet, PlayerCommand, PlayerEvent, PlayerState};
use std::sync::{Arc, Weak};
use std::any::Any;
use std::time::SystemTime;

/// Trait for objects that listen to PlayerController state changes
pub trait PlayerStateListener: Send + Sync {
    /// Called when any player event occurs
    ///
    /// Invoked from the task that owns the player state, so implementations
    /// should return quickly.
    fn on_event(&self, event: PlayerEvent);

    /// Convert to Any for dynamic casting
    fn as_any(&self) -> &dyn Any;
}

/// PlayerController trait - abstract interface for networked players
///
/// A controller keeps a local model of a remote device, updated from the
/// device's notifications, and forwards commands to it.
pub trait PlayerController: Send + Sync {
    /// Get the capabilities of the player
    ///
    /// Fields of the player state and commands outside this set are never
    /// updated or sent.
    fn get_capabilities(&self) -> PlayerCapabilitySet;

    /// Snapshot of the normalized player state
    fn get_player_state(&self) -> PlayerState;

    /// Current state of the notification subscription
    fn get_connection_state(&self) -> ConnectionState;

    /// Get the name of this player controller (e.g., "beo")
    fn get_player_name(&self) -> String;

    /// Get a unique identifier for this player instance
    fn get_player_id(&self) -> String;

    /// Get the last time the device sent a notification or answered a poll
    fn get_last_seen(&self) -> Option<SystemTime>;

    /// Send a command to the player
    ///
    /// Returns `true` if the command was accepted for sending. Delivery
    /// failures are logged, not reported here.
    fn send_command(&self, command: PlayerCommand) -> bool;

    /// Register a state listener to be notified of state changes
    ///
    /// `true` if the listener was successfully registered, `false` otherwise
    fn register_state_listener(&mut self, listener: Weak<dyn PlayerStateListener>) -> bool;

    /// Unregister a previously registered state listener
    ///
    /// `true` if the listener was successfully unregistered, `false` if it wasn't registered
    fn unregister_state_listener(&mut self, listener: &Arc<dyn PlayerStateListener>) -> bool;

    /// Downcasts the player controller to a concrete type via Any
    fn as_any(&self) -> &dyn Any;

    /// Starts the player controller
    ///
    /// Spawns the background work the player needs and subscribes to notifications.
    /// Returns true if the player was successfully started, false otherwise.
    fn start(&self) -> bool;

    /// Stops the player controller and releases its connections
    fn stop(&self) -> bool;

    /// Open the notification subscription. No-op unless disconnected.
    fn connect(&self) -> bool;

    /// Close the notification subscription
    fn disconnect(&self) -> bool;

    /// Tear down the subscription while the device sleeps
    fn enter_standby(&self) -> bool {
        self.disconnect()
    }

    /// Resubscribe after the device wakes up
    fn leave_standby(&self) -> bool {
        self.connect()
    }
}
