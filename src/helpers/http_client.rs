use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use log::{debug, error, trace};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

/// Default timeout for one-shot HTTP requests in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Error types that can occur when talking to the device over HTTP
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP error {0}")]
    Status(u16),

    #[error("Stream closed by device")]
    StreamClosed,

    #[error("HTTP request error: {0}")]
    Request(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Empty response from server")]
    EmptyResponse,
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Live body of a streaming GET
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// HTTP access to a single device, relative to its base URL
///
/// Implementations carry no protocol knowledge; paths are passed through as-is.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Base URL requests are issued against (e.g. "http://192.168.1.20:8080")
    fn base_url(&self) -> &str;

    /// GET a path and parse the body as a single JSON document
    async fn get_json(&self, path: &str) -> Result<Value, TransportError>;

    /// PUT a JSON body, returning the HTTP status code
    async fn put_json(&self, path: &str, body: Value) -> Result<u16, TransportError>;

    /// POST with an empty body, returning the HTTP status code
    async fn post(&self, path: &str) -> Result<u16, TransportError>;

    /// Open a long-lived GET and hand back the body as a byte stream
    async fn open_stream(&self, path: &str) -> Result<ByteStream, TransportError>;
}

/// A transport implementation using reqwest
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    /// Base URL of the device (e.g., "http://192.168.1.20:8080")
    base_url: String,

    /// Shared HTTP client, no overall timeout so streams can stay open
    client: Client,

    /// Timeout applied to each one-shot request
    request_timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new transport
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the device, without trailing slash
    /// * `request_timeout_secs` - Timeout for GET/PUT/POST requests
    /// * `connect_timeout_secs` - TCP connect timeout, also applied to the stream
    pub fn new(base_url: &str, request_timeout_secs: u64, connect_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            request_timeout: Duration::from_secs(request_timeout_secs),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str) -> Result<Value, TransportError> {
        let url = self.url(path);
        debug!("GET request to {}", url);

        let response = self.client
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        let response_text = response.text().await?;
        if response_text.trim().is_empty() {
            return Err(TransportError::EmptyResponse);
        }

        match serde_json::from_str::<Value>(&response_text) {
            Ok(json_value) => Ok(json_value),
            Err(e) => {
                error!("Failed to parse JSON response: {}", e);
                debug!("Response text: {}", response_text);
                Err(TransportError::ParseError(e.to_string()))
            }
        }
    }

    async fn put_json(&self, path: &str, body: Value) -> Result<u16, TransportError> {
        let url = self.url(path);
        debug!("PUT request to {}: {}", url, body);

        let response = self.client
            .put(&url)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        trace!("PUT {} returned {}", url, status);
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(status.as_u16())
    }

    async fn post(&self, path: &str) -> Result<u16, TransportError> {
        let url = self.url(path);
        debug!("POST request to {}", url);

        let response = self.client
            .post(&url)
            .timeout(self.request_timeout)
            .body("")
            .send()
            .await?;

        let status = response.status();
        trace!("POST {} returned {}", url, status);
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(status.as_u16())
    }

    async fn open_stream(&self, path: &str) -> Result<ByteStream, TransportError> {
        let url = self.url(path);
        debug!("Opening notification stream {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TransportError::from))
            .boxed())
    }
}

/// Create a new transport using the default implementation
pub fn new_transport(base_url: &str, request_timeout_secs: u64, connect_timeout_secs: u64) -> Arc<dyn Transport> {
    Arc::new(ReqwestTransport::new(base_url, request_timeout_secs, connect_timeout_secs))
}
