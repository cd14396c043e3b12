// Configuration for the Bang & Olufsen controller
//
// A device can be configured from a flat JSON object or from the integration
// shape a host hands over, where connection details live under "data".

use std::path::Path;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::data::{PlayerCapability, PlayerCapabilitySet};
use crate::helpers::retry::RetryHandler;
use crate::players::beo::api::DEFAULT_PORT;
use crate::players::beo::engine::EngineSettings;
use crate::players::beo::error::BeoError;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_friendly_name() -> String {
    "Bang & Olufsen".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    5
}

/// Connection settings for one device
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BeoConfig {
    pub ip: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Identifier of this player towards the host; derived from the address when empty
    #[serde(default)]
    pub entity_id: String,

    #[serde(default = "default_friendly_name")]
    pub friendly_name: String,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Reconnect with backoff after the notification stream fails
    #[serde(default)]
    pub auto_reconnect: bool,

    /// Restricts the advertised features; all of them when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Vec<PlayerCapability>>,
}

impl BeoConfig {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: ip.to_string(),
            port: default_port(),
            entity_id: String::new(),
            friendly_name: default_friendly_name(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            auto_reconnect: false,
            capabilities: None,
        }
    }

    /// Parse either a flat object or `{"id":..,"friendly_name":..,"data":{"ip":..,"entity_id":..}}`
    pub fn from_value(value: &Value) -> Result<Self, BeoError> {
        let object = value
            .as_object()
            .ok_or_else(|| BeoError::Config("configuration must be an object".to_string()))?;

        let merged = match object.get("data").and_then(Value::as_object) {
            Some(data) => {
                debug!("Reading device settings from integration data");
                let mut merged: Map<String, Value> = object
                    .iter()
                    .filter(|(key, _)| key.as_str() != "data")
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                for (key, value) in data {
                    merged.insert(key.clone(), value.clone());
                }
                merged
            }
            None => object.clone(),
        };

        let mut config: BeoConfig = serde_json::from_value(Value::Object(merged))
            .map_err(|e| BeoError::Config(e.to_string()))?;
        config.validate()?;
        if config.entity_id.is_empty() {
            config.entity_id = format!("media_player.beo_{}", config.ip.replace(['.', ':'], "_"));
        }
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, BeoError> {
        let value: Value = serde_json::from_str(json).map_err(|e| BeoError::Config(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Load from a file holding either a device object or a host configuration
    pub fn from_file(path: &Path) -> Result<Self, BeoError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BeoError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| BeoError::Config(format!("invalid JSON in {}: {}", path.display(), e)))?;

        match get_integration_config(&value, "beo") {
            Some(section) => Self::from_value(section),
            None => Self::from_value(&value),
        }
    }

    fn validate(&self) -> Result<(), BeoError> {
        if self.ip.trim().is_empty() {
            return Err(BeoError::Config("ip must not be empty".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(BeoError::Config("poll_interval_secs must be positive".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(BeoError::Config("request_timeout_secs must be positive".to_string()));
        }
        let url = Url::parse(&self.base_url())
            .map_err(|e| BeoError::Config(format!("invalid device address {}: {}", self.ip, e)))?;
        if url.host_str().is_none() || url.path() != "/" {
            return Err(BeoError::Config(format!("invalid device address {}", self.ip)));
        }
        Ok(())
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }

    pub fn capability_set(&self) -> PlayerCapabilitySet {
        match &self.capabilities {
            Some(capabilities) => PlayerCapabilitySet::from_slice(capabilities),
            None => PlayerCapabilitySet::all(),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            reconnect: self.auto_reconnect.then(RetryHandler::connection_retry),
        }
    }
}

/// Look up an integration section, first under "integrations", then at the top level
///
/// ```rust
/// use serde_json::json;
/// use beocontrol::config::get_integration_config;
///
/// let config = json!({ "integrations": { "beo": { "ip": "10.0.0.5" } } });
/// assert_eq!(get_integration_config(&config, "beo").unwrap()["ip"], "10.0.0.5");
///
/// let flat = json!({ "beo": { "ip": "10.0.0.6" } });
/// assert_eq!(get_integration_config(&flat, "beo").unwrap()["ip"], "10.0.0.6");
/// ```
pub fn get_integration_config<'a>(config: &'a Value, name: &str) -> Option<&'a Value> {
    if let Some(section) = config.get("integrations").and_then(|i| i.get(name)) {
        debug!("Found {} configuration in integrations section", name);
        return Some(section);
    }

    if let Some(section) = config.get(name) {
        debug!("Found {} configuration at top level", name);
        return Some(section);
    }

    debug!("No {} configuration found", name);
    None
}
