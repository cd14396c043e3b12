//! Issues outbound REST calls, one task per command, and reports each result
//! on the completion channel of the engine

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::data::{PlayerCommand, PlayerState};
use crate::helpers::http_client::{Transport, TransportError};
use super::api::{command_requests, DeviceRequest, Method};

/// An outstanding REST call, identified by the path that gives it meaning
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub id: u64,
    pub request: DeviceRequest,
    pub issued_at: Instant,
}

/// What a finished request produced
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// Parsed body of a GET
    Json(Value),
    /// Status code of a PUT or POST
    Status(u16),
}

/// A finished request, delivered back to the engine
#[derive(Debug)]
pub struct Completion {
    pub pending: PendingRequest,
    pub outcome: Result<RequestOutcome, TransportError>,
}

pub struct CommandDispatcher {
    transport: Arc<dyn Transport>,
    completions: mpsc::UnboundedSender<Completion>,
    request_timeout: Duration,
    next_id: u64,
}

impl CommandDispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        completions: mpsc::UnboundedSender<Completion>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            completions,
            request_timeout,
            next_id: 1,
        }
    }

    /// Send the requests for `command`; results arrive on the completion channel
    pub fn dispatch(&mut self, command: PlayerCommand, current: &PlayerState) -> Vec<PendingRequest> {
        debug!("Dispatching command {}", command);
        self.issue_all(command_requests(command, current))
    }

    /// Send a single request
    pub fn issue(&mut self, request: DeviceRequest) -> PendingRequest {
        let pending = self.track(request);
        self.spawn_batch(vec![pending.clone()]);
        pending
    }

    /// Send `requests` sequentially in one task, so a press always precedes its release
    pub fn issue_all(&mut self, requests: Vec<DeviceRequest>) -> Vec<PendingRequest> {
        let batch: Vec<PendingRequest> = requests.into_iter().map(|request| self.track(request)).collect();
        self.spawn_batch(batch.clone());
        batch
    }

    fn track(&mut self, request: DeviceRequest) -> PendingRequest {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        PendingRequest { id, request, issued_at: Instant::now() }
    }

    fn spawn_batch(&self, batch: Vec<PendingRequest>) {
        let transport = self.transport.clone();
        let completions = self.completions.clone();
        let timeout = self.request_timeout;

        tokio::spawn(async move {
            for pending in batch {
                let outcome = execute(transport.as_ref(), &pending.request, timeout).await;
                if completions.send(Completion { pending, outcome }).is_err() {
                    debug!("Engine gone, dropping remaining requests");
                    break;
                }
            }
        });
    }
}

/// Run one request against the transport, bounded by `timeout`
pub async fn execute(
    transport: &dyn Transport,
    request: &DeviceRequest,
    timeout: Duration,
) -> Result<RequestOutcome, TransportError> {
    let call = async {
        match request.method {
            Method::Get => transport.get_json(&request.path).await.map(RequestOutcome::Json),
            Method::Put => {
                let body = request.body.clone().unwrap_or(Value::Null);
                transport.put_json(&request.path, body).await.map(RequestOutcome::Status)
            }
            Method::Post => transport.post(&request.path).await.map(RequestOutcome::Status),
        }
    };

    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout),
    }
}
