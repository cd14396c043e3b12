//! Lifecycle of the notification subscription and the standby poll
//!
//! All methods run on the engine task. Background tasks never touch the
//! manager directly; they post a [`ConnectionEvent`] tagged with the
//! generation that spawned them, and the manager discards events from
//! generations it has already left behind.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::data::ConnectionState;
use crate::helpers::http_client::{Transport, TransportError};
use crate::helpers::retry::RetryHandler;
use super::api::NOTIFICATIONS_PATH;

/// Interval of the standby poll
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Messages from the stream, poll and reconnect tasks
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A chunk read from the notification stream
    Chunk { generation: u64, chunk: Bytes },
    /// The notification stream ended or failed
    Closed { generation: u64, error: TransportError },
    /// The standby poll is due
    PollTick,
    /// A scheduled reconnect attempt is due
    ReconnectDue { generation: u64 },
}

pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    state: ConnectionState,
    generation: u64,
    /// Set when the client itself tore the subscription down
    local_disconnect: bool,
    poll_interval: Duration,
    retry: Option<RetryHandler>,
    stream_task: Option<JoinHandle<()>>,
    poll_task: Option<JoinHandle<()>>,
    reconnect_task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn Transport>, events: mpsc::UnboundedSender<ConnectionEvent>) -> Self {
        Self {
            transport,
            events,
            state: ConnectionState::Disconnected,
            generation: 0,
            local_disconnect: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry: None,
            stream_task: None,
            poll_task: None,
            reconnect_task: None,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Reconnect automatically after unexpected stream failures
    pub fn with_auto_reconnect(mut self, retry: RetryHandler) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_polling(&self) -> bool {
        self.poll_task.as_ref().map(|task| !task.is_finished()).unwrap_or(false)
    }

    /// Open the notification subscription and start the standby poll
    ///
    /// Only acts while DISCONNECTED. Returns true if a new subscription was opened.
    pub fn connect(&mut self) -> bool {
        self.start_polling();

        if self.state != ConnectionState::Disconnected {
            debug!("Subscription already {}, not opening another", self.state);
            return false;
        }

        self.cancel_reconnect();
        self.local_disconnect = false;
        self.generation += 1;
        self.transition(ConnectionState::Connecting);

        let transport = self.transport.clone();
        let events = self.events.clone();
        let generation = self.generation;
        self.stream_task = Some(tokio::spawn(async move {
            run_stream(transport, generation, events).await;
        }));
        true
    }

    /// Cancel the subscription and stop the standby poll
    ///
    /// Events still in flight from the old subscription are discarded afterwards.
    pub fn disconnect(&mut self) {
        self.stop_polling();
        self.cancel_reconnect();

        if let Some(task) = self.stream_task.take() {
            task.abort();
        }

        if self.state == ConnectionState::Disconnected {
            debug!("Already disconnected");
            return;
        }

        self.local_disconnect = true;
        self.generation += 1;
        self.transition(ConnectionState::Disconnected);
    }

    /// Same as [`disconnect`](Self::disconnect)
    pub fn enter_standby(&mut self) {
        self.disconnect();
    }

    pub fn leave_standby(&mut self) -> bool {
        self.connect()
    }

    /// Accept a chunk from the stream, returning it if it belongs to the live subscription
    pub fn on_stream_chunk(&mut self, generation: u64, chunk: Bytes) -> Option<Bytes> {
        if generation != self.generation || self.state == ConnectionState::Disconnected {
            debug!("Discarding {} bytes from stale subscription {}", chunk.len(), generation);
            return None;
        }
        if chunk.is_empty() {
            return None;
        }

        if self.state == ConnectionState::Connecting {
            self.transition(ConnectionState::Connected);
            if let Some(retry) = self.retry.as_mut() {
                retry.reset();
            }
        }
        Some(chunk)
    }

    /// Handle the end of the stream. Returns true if the state changed.
    pub fn on_stream_closed(&mut self, generation: u64, error: TransportError) -> bool {
        if generation != self.generation || self.local_disconnect {
            debug!("Ignoring close of stale subscription {}: {}", generation, error);
            return false;
        }
        if self.state == ConnectionState::Disconnected {
            return false;
        }

        warn!("Notification stream failed: {}", error);
        self.stream_task = None;
        self.transition(ConnectionState::Disconnected);
        self.schedule_reconnect();
        true
    }

    /// Handle a due reconnect. Returns true if a new subscription was opened.
    pub fn on_reconnect_due(&mut self, generation: u64) -> bool {
        self.reconnect_task = None;
        if generation != self.generation || self.local_disconnect {
            debug!("Dropping stale reconnect for subscription {}", generation);
            return false;
        }
        info!("Reconnecting notification stream");
        self.connect()
    }

    fn transition(&mut self, next: ConnectionState) -> bool {
        if !self.state.can_transition_to(next) {
            warn!("Ignoring illegal connection transition {} -> {}", self.state, next);
            return false;
        }
        info!("Connection state {} -> {}", self.state, next);
        self.state = next;
        true
    }

    fn start_polling(&mut self) {
        if self.is_polling() {
            return;
        }

        let events = self.events.clone();
        let period = self.poll_interval;
        debug!("Starting standby poll every {:?}", period);
        self.poll_task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(ConnectionEvent::PollTick).is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_polling(&mut self) {
        if let Some(task) = self.poll_task.take() {
            debug!("Stopping standby poll");
            task.abort();
        }
    }

    fn schedule_reconnect(&mut self) {
        let Some(retry) = self.retry.as_mut() else {
            return;
        };
        let Some(delay) = retry.next_delay() else {
            warn!("Giving up reconnecting after {} attempts", retry.attempt());
            return;
        };

        info!("Reconnecting in {:?}", delay);
        let events = self.events.clone();
        let generation = self.generation;
        self.reconnect_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(ConnectionEvent::ReconnectDue { generation });
        }));
    }

    fn cancel_reconnect(&mut self) {
        if let Some(task) = self.reconnect_task.take() {
            task.abort();
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        for task in [self.stream_task.take(), self.poll_task.take(), self.reconnect_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

async fn run_stream(
    transport: Arc<dyn Transport>,
    generation: u64,
    events: mpsc::UnboundedSender<ConnectionEvent>,
) {
    let mut stream = match transport.open_stream(NOTIFICATIONS_PATH).await {
        Ok(stream) => stream,
        Err(error) => {
            let _ = events.send(ConnectionEvent::Closed { generation, error });
            return;
        }
    };

    while let Some(item) = stream.next().await {
        match item {
            Ok(chunk) => {
                if events.send(ConnectionEvent::Chunk { generation, chunk }).is_err() {
                    return;
                }
            }
            Err(error) => {
                let _ = events.send(ConnectionEvent::Closed { generation, error });
                return;
            }
        }
    }

    let _ = events.send(ConnectionEvent::Closed { generation, error: TransportError::StreamClosed });
}
