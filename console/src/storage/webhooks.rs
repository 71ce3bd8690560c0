//! Webhook configuration store

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::errors::FluxError;
use crate::models::endpoint::{EndpointConfig, EndpointName};
use crate::storage::kv::KeyValueStore;

/// Fixed key holding the whole endpoint map
pub const STORAGE_KEY: &str = "flux_action_webhooks";

/// Persists one [`EndpointConfig`] per endpoint name.
///
/// Reads never fail: missing or undecodable data falls back to the
/// built-in defaults. Writes are best effort and only logged on failure.
pub struct WebhookStore<S> {
    backend: S,
}

impl<S: KeyValueStore> WebhookStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Underlying key-value backend
    pub fn backend(&self) -> &S {
        &self.backend
    }

    async fn load_map(&self) -> Result<Map<String, Value>, FluxError> {
        let Some(raw) = self.backend.get(STORAGE_KEY).await? else {
            return Ok(Map::new());
        };

        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            other => Err(FluxError::Storage(format!(
                "Expected an object under {}, found {}",
                STORAGE_KEY,
                json_kind(&other)
            ))),
        }
    }

    fn entry_from(map: &Map<String, Value>, name: EndpointName) -> Option<EndpointConfig> {
        let value = map.get(name.as_str()).filter(|v| !v.is_null())?;
        match serde_json::from_value::<StoredEndpoint>(value.clone()) {
            Ok(stored) => Some(stored.merge_over(EndpointConfig::default_for(name))),
            Err(e) => {
                warn!("Ignoring unreadable {} webhook config: {}", name, e);
                None
            }
        }
    }

    /// Config for a known endpoint
    pub async fn config(&self, name: EndpointName) -> EndpointConfig {
        match self.load_map().await {
            Ok(map) => Self::entry_from(&map, name)
                .unwrap_or_else(|| EndpointConfig::default_for(name)),
            Err(e) => {
                error!("Error reading webhook configs: {}", e);
                EndpointConfig::default_for(name)
            }
        }
    }

    /// Config by name; `None` only for names outside the closed set
    pub async fn get_config(&self, name: &str) -> Option<EndpointConfig> {
        match name.parse::<EndpointName>() {
            Ok(name) => Some(self.config(name).await),
            Err(e) => {
                debug!("{}", e);
                None
            }
        }
    }

    /// Every endpoint config in declaration order
    pub async fn get_all_configs(&self) -> Vec<EndpointConfig> {
        let map = match self.load_map().await {
            Ok(map) => map,
            Err(e) => {
                error!("Error reading webhook configs: {}", e);
                Map::new()
            }
        };

        EndpointName::ALL
            .iter()
            .map(|&name| {
                Self::entry_from(&map, name).unwrap_or_else(|| EndpointConfig::default_for(name))
            })
            .collect()
    }

    /// Merge `config` into the persisted map
    pub async fn update_config(&self, config: &EndpointConfig) {
        if let Err(e) = self.try_update_config(config).await {
            error!("Error writing {} webhook config: {}", config.name, e);
        }
    }

    async fn try_update_config(&self, config: &EndpointConfig) -> Result<(), FluxError> {
        let mut map = self.load_map().await.unwrap_or_else(|e| {
            warn!("Replacing unreadable webhook configs: {}", e);
            Map::new()
        });

        map.insert(config.name.as_str().to_string(), serde_json::to_value(config)?);
        let raw = serde_json::to_string(&Value::Object(map))?;
        self.backend.set(STORAGE_KEY, &raw).await?;
        debug!("Saved {} webhook config", config.name);
        Ok(())
    }

    /// Replace only the url of `name`, keeping method and body template
    pub async fn update_url(&self, name: EndpointName, url: &str) {
        let mut config = self.config(name).await;
        config.url = url.trim().to_string();
        self.update_config(&config).await;
    }

    /// Erase all persisted configs; later reads return defaults
    pub async fn reset_all(&self) {
        if let Err(e) = self.backend.remove(STORAGE_KEY).await {
            error!("Error clearing webhook configs: {}", e);
        }
    }
}

/// Persisted entry; any missing field comes from the endpoint default.
/// The embedded name is ignored since the map key decides.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredEndpoint {
    #[serde(default)]
    url: Option<String>,

    #[serde(default)]
    method: Option<String>,

    /// Absent keeps the default template, `null` clears it
    #[serde(default)]
    body_template: Option<Value>,
}

impl StoredEndpoint {
    fn merge_over(self, mut config: EndpointConfig) -> EndpointConfig {
        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(method) = self.method.filter(|m| !m.trim().is_empty()) {
            config.method = method;
        }
        match self.body_template {
            None => {}
            Some(Value::String(template)) => config.body_template = Some(template),
            Some(Value::Null) => config.body_template = None,
            Some(other) => warn!(
                "Ignoring {} body template stored as {}",
                config.name,
                json_kind(&other)
            ),
        }
        config
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
