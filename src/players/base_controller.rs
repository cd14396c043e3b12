use crate::data::{PlayerCapabilitySet, PlayerEvent, PlayerSource};
use crate::players::player_controller::PlayerStateListener;
use std::sync::{Arc, Weak, RwLock};
use std::time::SystemTime;
use log::{debug, trace, warn};

/// Shared bookkeeping for player controllers
///
/// Holds the identity of the player, its declared capabilities and the
/// registered state listeners. Clones share the same listener list, so a clone
/// handed to a background task notifies listeners registered later.
#[derive(Clone)]
pub struct BasePlayerController {
    /// List of state listeners registered with this controller
    listeners: Arc<RwLock<Vec<Weak<dyn PlayerStateListener>>>>,

    /// Declared capabilities of the player
    capabilities: PlayerCapabilitySet,

    player_name: String,
    player_id: String,

    last_seen: Arc<RwLock<Option<SystemTime>>>,
}

impl BasePlayerController {
    /// Create a new BasePlayerController with no listeners
    pub fn new(player_name: &str, player_id: &str, capabilities: PlayerCapabilitySet) -> Self {
        debug!("Creating new BasePlayerController for {} ({})", player_id, player_name);
        Self {
            listeners: Arc::new(RwLock::new(Vec::new())),
            capabilities,
            player_name: player_name.to_string(),
            player_id: player_id.to_string(),
            last_seen: Arc::new(RwLock::new(None)),
        }
    }

    pub fn get_player_name(&self) -> String {
        self.player_name.clone()
    }

    pub fn get_player_id(&self) -> String {
        self.player_id.clone()
    }

    pub fn source(&self) -> PlayerSource {
        PlayerSource::new(self.player_name.clone(), self.player_id.clone())
    }

    /// Get the current capabilities
    pub fn get_capabilities(&self) -> PlayerCapabilitySet {
        self.capabilities
    }

    pub fn get_last_seen(&self) -> Option<SystemTime> {
        match self.last_seen.read() {
            Ok(seen) => *seen,
            Err(_) => {
                warn!("Failed to acquire read lock for last seen");
                None
            }
        }
    }

    /// Record that the device just sent something
    pub fn alive(&self) {
        if let Ok(mut seen) = self.last_seen.write() {
            *seen = Some(SystemTime::now());
        } else {
            warn!("Failed to acquire write lock for last seen");
        }
    }

    /// Deliver an event to every live listener
    pub fn notify_event(&self, event: PlayerEvent) {
        self.prune_dead_listeners();
        if let Ok(listeners) = self.listeners.read() {
            trace!("Notifying {} listeners of {:?}", listeners.len(), event);
            for listener_weak in listeners.iter() {
                if let Some(listener) = listener_weak.upgrade() {
                    listener.on_event(event.clone());
                }
            }
        } else {
            warn!("Failed to acquire read lock for listeners when notifying event");
        }
    }

    /// Register a state listener to be notified of state changes
    pub fn register_state_listener(&mut self, listener: Weak<dyn PlayerStateListener>) -> bool {
        debug!("Attempting to register a new listener");
        if let Ok(mut listeners) = self.listeners.write() {
            for existing in listeners.iter() {
                if let (Some(new), Some(old)) = (listener.upgrade(), existing.upgrade()) {
                    if Arc::ptr_eq(&new, &old) {
                        debug!("Listener already registered, skipping");
                        return false;
                    }
                }
            }
            listeners.push(listener);
            debug!("Listener successfully registered, total listeners: {}", listeners.len());
            return true;
        }
        warn!("Failed to acquire write lock when registering listener");
        false
    }

    /// Unregister a previously registered state listener
    pub fn unregister_state_listener(&mut self, listener: &Arc<dyn PlayerStateListener>) -> bool {
        if let Ok(mut listeners) = self.listeners.write() {
            let original_len = listeners.len();
            listeners.retain(|weak_ref| match weak_ref.upgrade() {
                Some(target) => !Arc::ptr_eq(&target, listener),
                None => false,
            });
            let removed = listeners.len() < original_len;
            if removed {
                debug!("Listener unregistered, remaining listeners: {}", listeners.len());
            } else {
                debug!("Listener not found for unregistration");
            }
            return removed;
        }
        warn!("Failed to acquire write lock when unregistering listener");
        false
    }

    fn prune_dead_listeners(&self) {
        if let Ok(mut listeners) = self.listeners.write() {
            let original_len = listeners.len();
            listeners.retain(|weak_ref| weak_ref.upgrade().is_some());
            let removed = original_len - listeners.len();
            if removed > 0 {
                debug!("Pruned {} dead listeners, remaining: {}", removed, listeners.len());
            }
        } else {
            warn!("Failed to acquire write lock when pruning dead listeners");
        }
    }
}
