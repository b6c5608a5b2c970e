/// Client configuration
use crate::backends::BackendKind;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default fixed polling cadence in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Configuration for talking to a remix backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Which API flavor the backend speaks.
    pub backend: BackendKind,

    /// Base API URL, e.g. `http://localhost:8000`.
    pub api_url: String,

    /// Fixed status polling cadence in milliseconds.
    pub poll_interval_ms: u64,

    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Config for the given base URL with defaults.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Tasks,
            api_url: api_url.into(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_secs: Some(60),
        }
    }

    /// With backend flavor.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// With polling cadence.
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// With per-request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Polling cadence as a `Duration`.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Save configuration to JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| crate::error::RemixError::InvalidInput(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)
            .map_err(|e| crate::error::RemixError::InvalidInput(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = ClientConfig::new("http://localhost:8000")
            .with_backend(BackendKind::Process)
            .with_poll_interval_ms(300)
            .with_timeout(30);

        assert_eq!(config.backend, BackendKind::Process);
        assert_eq!(config.poll_interval(), Duration::from_millis(300));
        assert_eq!(config.timeout_secs, Some(30));
    }

    #[test]
    fn test_config_save_load() {
        let path = std::env::temp_dir().join("remix_client_config_test.json");
        let config = ClientConfig::new("http://localhost:8000").with_poll_interval_ms(500);
        config.save(&path).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded.api_url, "http://localhost:8000");
        assert_eq!(loaded.poll_interval_ms, 500);

        std::fs::remove_file(&path).ok();
    }
}
