// Common helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use beocontrol::data::PlayerEvent;
use beocontrol::helpers::http_client::{ByteStream, Transport, TransportError};
use beocontrol::players::PlayerStateListener;
use bytes::Bytes;
use futures::channel::mpsc;
use futures::StreamExt;
use serde_json::{json, Value};
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub use serial_test::serial;

/// A request as seen by the scripted transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// In-memory device: the test pushes stream data and inspects requests
#[derive(Debug)]
pub struct ScriptedTransport {
    requests: Mutex<Vec<RecordedRequest>>,
    feeds: Mutex<Vec<mpsc::UnboundedSender<Result<Bytes, TransportError>>>>,
    power_state: Mutex<String>,
    fail_commands: AtomicBool,
    opened: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            feeds: Mutex::new(Vec::new()),
            power_state: Mutex::new("on".to_string()),
            fail_commands: AtomicBool::new(false),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn streams_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn set_power_state(&self, state: &str) {
        *self.power_state.lock().unwrap() = state.to_string();
    }

    pub fn fail_commands(&self, fail: bool) {
        self.fail_commands.store(fail, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests other than the standby poll
    pub fn command_requests(&self) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.method != "GET").collect()
    }

    pub fn standby_polls(&self) -> usize {
        self.requests().iter().filter(|r| r.method == "GET").count()
    }

    /// Write raw bytes to the stream opened `index`-th (0-based)
    pub fn send_raw_to(&self, index: usize, data: &str) {
        let feeds = self.feeds.lock().unwrap();
        let _ = feeds[index].unbounded_send(Ok(Bytes::from(data.to_string())));
    }

    /// Write raw bytes to the newest stream
    pub fn send_raw(&self, data: &str) {
        let index = self.feeds.lock().unwrap().len() - 1;
        self.send_raw_to(index, data);
    }

    /// Write one framed notification to the newest stream
    pub fn send_notification(&self, notification: Value) {
        self.send_raw(&frame(notification));
    }

    pub fn fail_stream_at(&self, index: usize, error: TransportError) {
        let feeds = self.feeds.lock().unwrap();
        let _ = feeds[index].unbounded_send(Err(error));
    }

    pub fn fail_stream(&self, error: TransportError) {
        let index = self.feeds.lock().unwrap().len() - 1;
        self.fail_stream_at(index, error);
    }

    fn record(&self, method: &'static str, path: &str, body: Option<Value>) {
        self.requests.lock().unwrap().push(RecordedRequest { method, path: path.to_string(), body });
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn base_url(&self) -> &str {
        "http://scripted:8080"
    }

    async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        self.record("GET", path, None);
        let state = self.power_state.lock().unwrap().clone();
        Ok(json!({ "standby": { "powerState": state } }))
    }

    async fn put_json(&self, path: &str, body: Value) -> Result<u16, TransportError> {
        self.record("PUT", path, Some(body));
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(TransportError::Status(500));
        }
        Ok(200)
    }

    async fn post(&self, path: &str) -> Result<u16, TransportError> {
        self.record("POST", path, None);
        if self.fail_commands.load(Ordering::SeqCst) {
            return Err(TransportError::Connect("refused".to_string()));
        }
        Ok(200)
    }

    async fn open_stream(&self, _path: &str) -> Result<ByteStream, TransportError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded();
        self.feeds.lock().unwrap().push(tx);
        Ok(rx.boxed())
    }
}

/// Wrap a notification object the way the device frames it
pub fn frame(notification: Value) -> String {
    format!("{}\r\n\r\n", json!({ "notification": notification }))
}

pub fn volume(level: i64, muted: bool) -> Value {
    json!({ "type": "VOLUME", "data": { "speaker": { "level": level, "muted": muted } } })
}

pub fn progress(state: &str, position: u32, duration: u32) -> Value {
    json!({
        "type": "PROGRESS_INFORMATION",
        "data": { "state": state, "position": position, "totalDuration": duration }
    })
}

/// Listener that keeps every event it sees
pub struct EventCollector {
    events: Mutex<Vec<PlayerEvent>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self { events: Mutex::new(Vec::new()) }
    }

    pub fn events(&self) -> Vec<PlayerEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PlayerStateListener for EventCollector {
    fn on_event(&self, event: PlayerEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Let the engine drain its queues
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
