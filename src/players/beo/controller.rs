use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::SystemTime;

use delegate::delegate;
use log::{debug, info, warn};
use tokio::sync::{mpsc, watch};

use crate::config::BeoConfig;
use crate::data::{ConnectionState, PlayerCapabilitySet, PlayerCommand, PlayerState};
use crate::helpers::http_client::{new_transport, Transport};
use crate::players::base_controller::BasePlayerController;
use crate::players::player_controller::{PlayerController, PlayerStateListener};
use super::engine::{ControlMessage, Engine, EngineHandles};
use super::error::BeoError;

/// Name reported by [`PlayerController::get_player_name`]
pub const PLAYER_NAME: &str = "beo";

/// Controller for a Bang & Olufsen speaker on the local network
///
/// Construction only wires things up; nothing touches the network until
/// [`start`](PlayerController::start) runs the engine on the current tokio
/// runtime. The engine can be started once; after `stop` a new controller
/// is needed.
pub struct BeoPlayerController {
    base: BasePlayerController,
    config: BeoConfig,
    control_tx: mpsc::UnboundedSender<ControlMessage>,
    engine: Mutex<Option<Engine>>,
    handles: EngineHandles,
    running: AtomicBool,
}

impl BeoPlayerController {
    /// Create a controller talking to the device over HTTP
    pub fn new(config: BeoConfig) -> Self {
        let transport = new_transport(&config.base_url(), config.request_timeout_secs, config.connect_timeout_secs);
        Self::with_transport(config, transport)
    }

    /// Create a controller on top of an arbitrary transport
    pub fn with_transport(config: BeoConfig, transport: Arc<dyn Transport>) -> Self {
        debug!("Creating BeoPlayerController for {} at {}", config.entity_id, transport.base_url());
        let base = BasePlayerController::new(PLAYER_NAME, &config.entity_id, config.capability_set());
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (engine, handles) = Engine::new(base.clone(), transport, config.engine_settings(), control_rx);

        Self {
            base,
            config,
            control_tx,
            engine: Mutex::new(Some(engine)),
            handles,
            running: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &BeoConfig {
        &self.config
    }

    pub fn friendly_name(&self) -> &str {
        &self.config.friendly_name
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Number of REST calls still waiting for an answer
    pub fn pending_requests(&self) -> usize {
        self.handles.pending.load(Ordering::Relaxed)
    }

    /// Receiver that sees every published player state
    pub fn subscribe_state(&self) -> watch::Receiver<PlayerState> {
        self.handles.state.clone()
    }

    /// Receiver that sees every connection state change
    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionState> {
        self.handles.connection.clone()
    }

    /// Ask the device for its power state outside the regular poll
    pub fn refresh_power(&self) -> bool {
        self.post(ControlMessage::RefreshPower)
    }

    fn post(&self, message: ControlMessage) -> bool {
        match self.try_post(message) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}: {}", self.config.entity_id, e);
                false
            }
        }
    }

    /// Hand a message to the engine task
    fn try_post(&self, message: ControlMessage) -> Result<(), BeoError> {
        if !self.is_running() {
            debug!("Dropping {:?}", message);
            return Err(BeoError::NotRunning);
        }
        self.control_tx.send(message).map_err(|e| {
            debug!("Engine is gone, dropping {:?}", e.0);
            BeoError::NotRunning
        })
    }
}

impl PlayerController for BeoPlayerController {
    delegate! {
        to self.base {
            fn register_state_listener(&mut self, listener: Weak<dyn PlayerStateListener>) -> bool;
            fn unregister_state_listener(&mut self, listener: &Arc<dyn PlayerStateListener>) -> bool;
            fn get_capabilities(&self) -> PlayerCapabilitySet;
            fn get_player_name(&self) -> String;
            fn get_player_id(&self) -> String;
            fn get_last_seen(&self) -> Option<SystemTime>;
        }
    }

    fn get_player_state(&self) -> PlayerState {
        self.handles.state.borrow().clone()
    }

    fn get_connection_state(&self) -> ConnectionState {
        *self.handles.connection.borrow()
    }

    fn send_command(&self, command: PlayerCommand) -> bool {
        let required = command.required_capability();
        if !self.base.get_capabilities().has_capability(required) {
            warn!("Rejecting {}: {} does not support {}", command, self.config.entity_id, required);
            return false;
        }
        info!("Sending command {} to {}", command, self.config.entity_id);
        self.post(ControlMessage::Command(command))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn start(&self) -> bool {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Cannot start {} outside a tokio runtime: {}", self.config.entity_id, e);
                return false;
            }
        };

        let engine = match self.engine.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => {
                warn!("Failed to acquire engine lock");
                return false;
            }
        };
        let Some(engine) = engine else {
            warn!("{} was already started", self.config.entity_id);
            return false;
        };

        info!("Starting {} ({})", self.config.friendly_name, self.config.base_url());
        runtime.spawn(engine.run());
        self.running.store(true, Ordering::SeqCst);
        self.post(ControlMessage::Connect)
    }

    fn stop(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        info!("Stopping {}", self.config.entity_id);
        let sent = self.control_tx.send(ControlMessage::Shutdown).is_ok();
        self.running.store(false, Ordering::SeqCst);
        sent
    }

    fn connect(&self) -> bool {
        self.post(ControlMessage::Connect)
    }

    fn disconnect(&self) -> bool {
        self.post(ControlMessage::Disconnect)
    }

    /// Drops the subscription and stops the power poll, like `disconnect`
    fn enter_standby(&self) -> bool {
        self.post(ControlMessage::EnterStandby)
    }

    fn leave_standby(&self) -> bool {
        self.post(ControlMessage::LeaveStandby)
    }
}

impl Drop for BeoPlayerController {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.control_tx.send(ControlMessage::Shutdown);
        }
    }
}
