// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted monitor configuration and its storage port.

use std::path::PathBuf;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::poll_loop::DEFAULT_CAMERA_LABEL;
use crate::scheduler::DEFAULT_INTERVAL_MS;

/// Key under which the monitor stores its configuration.
pub const CONFIG_KEY: &str = "viewport-monitor";

/// Default consumer endpoint.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8080";

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes config values as JSON and delegates storage to a `ConfigStore`.
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Load and deserialize a config value for `key`. Returns `Ok(None)` if missing.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serialize and persist a config value for `key`.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Load the monitor config, falling back to defaults when absent.
    pub fn load_monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        Ok(self.load(CONFIG_KEY)?.unwrap_or_default())
    }
}

/// On-disk monitor configuration. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// WebSocket URL of the consumer.
    pub endpoint: String,
    /// Label copied into every camera's `name`.
    pub camera_label: String,
    /// Poll period in milliseconds.
    pub interval_ms: f64,
    /// JSON file the host writes the live camera into.
    pub camera_file: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            camera_label: DEFAULT_CAMERA_LABEL.to_string(),
            interval_ms: DEFAULT_INTERVAL_MS,
            camera_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemStore {
        blobs: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl ConfigStore for MemStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.blobs
                .borrow()
                .get(key)
                .cloned()
                .ok_or(ConfigError::NotFound)
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.blobs.borrow_mut().insert(key.to_string(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn missing_config_yields_defaults() {
        let svc = ConfigService::new(MemStore::default());
        let cfg = svc.load_monitor_config().unwrap();
        assert_eq!(cfg, MonitorConfig::default());
        assert_eq!(cfg.camera_label, "RhinoCamera");
        assert_eq!(cfg.interval_ms, 1000.0);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let store = MemStore::default();
        store
            .save_raw(CONFIG_KEY, br#"{"interval_ms": 250.0}"#)
            .unwrap();
        let cfg = ConfigService::new(store).load_monitor_config().unwrap();
        assert_eq!(cfg.interval_ms, 250.0);
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn saved_config_loads_back() {
        let svc = ConfigService::new(MemStore::default());
        let cfg = MonitorConfig {
            endpoint: "ws://render-box:9001".into(),
            camera_label: "Shot01".into(),
            interval_ms: 33.0,
            camera_file: Some(PathBuf::from("/tmp/cam.json")),
        };
        svc.save(CONFIG_KEY, &cfg).unwrap();
        assert_eq!(svc.load_monitor_config().unwrap(), cfg);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let store = MemStore::default();
        store.save_raw(CONFIG_KEY, b"{not json").unwrap();
        let err = ConfigService::new(store).load_monitor_config().unwrap_err();
        assert!(matches!(err, ConfigError::Serde(_)));
    }
}
