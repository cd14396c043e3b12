//! The task that owns the player state
//!
//! Every mutation of connection state and player state happens inside
//! [`Engine::run`]: control messages from the controller, chunks from the
//! notification stream, poll ticks and request completions are all drained
//! from channels by one loop, so no locks guard the state itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio::sync::{mpsc, watch};

use crate::data::{
    ConnectionState, NotificationEvent, PlayerCapability, PlayerCapabilitySet, PlayerCommand,
    PlayerEvent, PlayerState,
};
use crate::helpers::http_client::{Transport, DEFAULT_TIMEOUT_SECS};
use crate::helpers::retry::RetryHandler;
use crate::players::base_controller::BasePlayerController;
use super::api::{DeviceRequest, STANDBY_PATH};
use super::connection::{ConnectionEvent, ConnectionManager, DEFAULT_POLL_INTERVAL};
use super::dispatcher::{CommandDispatcher, Completion, PendingRequest, RequestOutcome};
use super::error::BeoError;
use super::notification::{decode_buffer, decode_standby};
use super::translator;

/// Requests from the controller to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    Connect,
    Disconnect,
    EnterStandby,
    LeaveStandby,
    Command(PlayerCommand),
    /// Ask the device for its power state now
    RefreshPower,
    Shutdown,
}

/// Timing and recovery knobs of an engine
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Backoff for reconnecting after stream failures, `None` to stay disconnected
    pub reconnect: Option<RetryHandler>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            reconnect: None,
        }
    }
}

/// Channels the controller reads the engine's output from
pub struct EngineHandles {
    pub state: watch::Receiver<PlayerState>,
    pub connection: watch::Receiver<ConnectionState>,
    pub pending: Arc<AtomicUsize>,
}

pub struct Engine {
    base: BasePlayerController,
    connection: ConnectionManager,
    dispatcher: CommandDispatcher,
    state: PlayerState,
    state_tx: watch::Sender<PlayerState>,
    connection_tx: watch::Sender<ConnectionState>,
    pending: HashMap<u64, PendingRequest>,
    pending_count: Arc<AtomicUsize>,
    control_rx: mpsc::UnboundedReceiver<ControlMessage>,
    connection_rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Engine {
    /// Wire up an engine talking to `transport`
    pub fn new(
        base: BasePlayerController,
        transport: Arc<dyn Transport>,
        settings: EngineSettings,
        control_rx: mpsc::UnboundedReceiver<ControlMessage>,
    ) -> (Self, EngineHandles) {
        let (connection_events_tx, connection_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PlayerState::new());
        let (connection_tx, connection_state_rx) = watch::channel(ConnectionState::Disconnected);
        let pending_count = Arc::new(AtomicUsize::new(0));

        let mut connection = ConnectionManager::new(transport.clone(), connection_events_tx)
            .with_poll_interval(settings.poll_interval);
        if let Some(retry) = settings.reconnect {
            connection = connection.with_auto_reconnect(retry);
        }

        let engine = Self {
            base,
            connection,
            dispatcher: CommandDispatcher::new(transport, completion_tx, settings.request_timeout),
            state: PlayerState::new(),
            state_tx,
            connection_tx,
            pending: HashMap::new(),
            pending_count: pending_count.clone(),
            control_rx,
            connection_rx,
            completion_rx,
        };

        let handles = EngineHandles {
            state: state_rx,
            connection: connection_state_rx,
            pending: pending_count,
        };

        (engine, handles)
    }

    /// Process messages until shut down or the controller goes away
    pub async fn run(mut self) {
        info!("Starting engine for {}", self.base.get_player_id());

        // Learn the power state before the first poll tick
        self.issue(DeviceRequest::get(STANDBY_PATH));

        loop {
            tokio::select! {
                message = self.control_rx.recv() => match message {
                    Some(message) => {
                        if !self.handle_control(message) {
                            break;
                        }
                    }
                    None => {
                        debug!("Controller dropped, stopping engine");
                        break;
                    }
                },
                Some(event) = self.connection_rx.recv() => self.handle_connection_event(event),
                Some(completion) = self.completion_rx.recv() => self.handle_completion(completion),
            }
        }

        self.connection.disconnect();
        self.publish_connection_state();
        info!("Engine for {} stopped", self.base.get_player_id());
    }

    fn handle_control(&mut self, message: ControlMessage) -> bool {
        debug!("Control message {:?}", message);
        match message {
            ControlMessage::Connect | ControlMessage::LeaveStandby => {
                self.connection.connect();
            }
            ControlMessage::Disconnect => self.connection.disconnect(),
            ControlMessage::EnterStandby => self.connection.enter_standby(),
            ControlMessage::Command(command) => {
                let issued = self.dispatcher.dispatch(command, &self.state);
                self.track(issued);
            }
            ControlMessage::RefreshPower => self.issue(DeviceRequest::get(STANDBY_PATH)),
            ControlMessage::Shutdown => return false,
        }
        self.publish_connection_state();
        true
    }

    fn handle_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Chunk { generation, chunk } => {
                let Some(chunk) = self.connection.on_stream_chunk(generation, chunk) else {
                    return;
                };
                self.publish_connection_state();
                self.base.alive();

                let decoded = decode_buffer(&chunk);
                for event in decoded.events {
                    self.apply_event(event);
                }
                if let Some(error) = decoded.error {
                    debug!("Rest of the chunk dropped: {}", error);
                }
            }
            ConnectionEvent::Closed { generation, error } => {
                if self.connection.on_stream_closed(generation, error) {
                    self.publish_connection_state();
                }
            }
            ConnectionEvent::PollTick => {
                trace!("Polling standby state");
                self.issue(DeviceRequest::get(STANDBY_PATH));
            }
            ConnectionEvent::ReconnectDue { generation } => {
                if self.connection.on_reconnect_due(generation) {
                    self.publish_connection_state();
                }
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        let Completion { pending, outcome } = completion;
        if self.pending.remove(&pending.id).is_none() {
            debug!("Completion for unknown request {}", pending.id);
        }
        self.pending_count.store(self.pending.len(), Ordering::Relaxed);

        let request = &pending.request;
        match outcome {
            Err(error) => {
                let error = BeoError::from(error);
                warn!("{} {} failed after {:?}: {}", request.method, request.path, pending.issued_at.elapsed(), error);
            }
            Ok(RequestOutcome::Json(body)) if request.is_standby_poll() => {
                self.base.alive();
                self.apply_event(decode_standby(&body));
            }
            Ok(RequestOutcome::Json(_)) => {
                debug!("{} {} returned a body nobody asked for", request.method, request.path);
            }
            Ok(RequestOutcome::Status(status)) => {
                debug!("{} {} returned {}", request.method, request.path, status);
            }
        }
    }

    fn issue(&mut self, request: DeviceRequest) {
        let pending = self.dispatcher.issue(request);
        self.track(vec![pending]);
    }

    fn track(&mut self, issued: Vec<PendingRequest>) {
        for pending in issued {
            self.pending.insert(pending.id, pending);
        }
        self.pending_count.store(self.pending.len(), Ordering::Relaxed);
    }

    /// Merge one event into the state and tell everyone what changed
    fn apply_event(&mut self, event: NotificationEvent) {
        if event.is_unknown() {
            return;
        }
        trace!("Applying {} event", event.kind());

        let candidate = translator::apply(&self.state, &event);
        let next = gate(&self.state, candidate, &self.base.get_capabilities());
        if next == self.state {
            return;
        }

        let power_changed = next.power != self.state.power;
        self.state = next;
        self.state_tx.send_replace(self.state.clone());

        let source = self.base.source();
        if power_changed {
            info!("Power state is now {}", self.state.power);
            self.base.notify_event(PlayerEvent::PowerChanged { source: source.clone(), power: self.state.power });
        }
        self.base.notify_event(PlayerEvent::StateChanged { source, state: self.state.clone() });
    }

    fn publish_connection_state(&mut self) {
        let state = self.connection.state();
        if *self.connection_tx.borrow() == state {
            return;
        }
        self.connection_tx.send_replace(state);
        self.base.notify_event(PlayerEvent::ConnectionChanged { source: self.base.source(), state });
    }
}

/// Keep the current value of every field whose capability the player lacks
pub fn gate(current: &PlayerState, candidate: PlayerState, capabilities: &PlayerCapabilitySet) -> PlayerState {
    use PlayerCapability as Cap;

    let mut gated = candidate;
    let media = &current.media;

    if !capabilities.has_capability(Cap::Source) {
        gated.source = current.source.clone();
    }
    if !capabilities.has_capability(Cap::VolumeSet) {
        gated.volume = current.volume;
    }
    if !capabilities.has_all(&[Cap::Mute, Cap::MuteSet]) {
        gated.muted = current.muted;
    }
    if !capabilities.has_capability(Cap::MediaType) {
        gated.media.media_type = media.media_type;
    }
    if !capabilities.has_capability(Cap::MediaTitle) {
        gated.media.title = media.title.clone();
    }
    if !capabilities.has_capability(Cap::MediaArtist) {
        gated.media.artist = media.artist.clone();
    }
    if !capabilities.has_capability(Cap::MediaAlbum) {
        gated.media.album = media.album.clone();
    }
    if !capabilities.has_capability(Cap::MediaDuration) {
        gated.media.duration = media.duration;
    }
    if !capabilities.has_capability(Cap::MediaPosition) {
        gated.media.position = media.position;
    }
    if !capabilities.has_capability(Cap::MediaImage) {
        gated.media.image_url = media.image_url.clone();
    }
    if !capabilities.has_all(&[Cap::TurnOn, Cap::TurnOff]) {
        gated.power = current.power;
    }

    gated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{MediaType, PlaybackState, PowerState};

    fn playing_state() -> PlayerState {
        let mut state = PlayerState::new();
        state.volume = Some(20);
        state.media.title = Some("Old".to_string());
        state
    }

    #[test]
    fn test_gate_with_all_capabilities_is_identity() {
        let current = playing_state();
        let mut candidate = current.clone();
        candidate.volume = Some(50);
        candidate.power = PowerState::On;
        let gated = gate(&current, candidate.clone(), &PlayerCapabilitySet::all());
        assert_eq!(gated, candidate);
    }

    #[test]
    fn test_gate_keeps_fields_without_capability() {
        let current = playing_state();
        let mut candidate = current.clone();
        candidate.volume = Some(50);
        candidate.muted = Some(true);
        candidate.media.title = Some("New".to_string());
        candidate.media.media_type = Some(MediaType::Radio);
        candidate.playback = PlaybackState::Playing;
        candidate.power = PowerState::Standby;

        let mut caps = PlayerCapabilitySet::all();
        caps.remove_capability(PlayerCapability::VolumeSet);
        caps.remove_capability(PlayerCapability::MuteSet);
        caps.remove_capability(PlayerCapability::TurnOff);

        let gated = gate(&current, candidate, &caps);
        assert_eq!(gated.volume, Some(20));
        assert_eq!(gated.muted, None);
        assert_eq!(gated.power, PowerState::Unknown);
        assert_eq!(gated.media.title.as_deref(), Some("New"));
        assert_eq!(gated.media.media_type, Some(MediaType::Radio));
        // Playback status is not tied to a capability
        assert_eq!(gated.playback, PlaybackState::Playing);
    }

    #[test]
    fn test_gate_with_empty_set_keeps_everything() {
        let current = playing_state();
        let event = NotificationEvent::NowPlayingNetRadio {
            name: "Station".to_string(),
            live_description: "Live".to_string(),
            image_url: Some("http://img".to_string()),
        };
        let candidate = translator::apply(&current, &event);
        let gated = gate(&current, candidate, &PlayerCapabilitySet::empty());
        assert_eq!(gated, current);
    }
}
