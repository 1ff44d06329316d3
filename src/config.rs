//! Core configuration

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Settings required to reach the traffic-routing platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Base URL of the platform's API
    pub api_base_url: String,

    /// API key sent as the `Api-Key` header
    pub api_key: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub http_timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl CoreConfig {
    pub fn new(api_base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_key: api_key.into(),
            http_timeout_secs: default_timeout(),
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from(path: &Path) -> Result<Self> {
        info!("Loading config from {:?}", path);
        let json = fs::read_to_string(path)?;
        let config: CoreConfig = serde_json::from_str(&json)?;
        Ok(config)
    }

    /// Build configuration from `OFFERFLOW_API_HOST` / `OFFERFLOW_API_KEY`
    pub fn from_env() -> Result<Self> {
        let api_base_url = std::env::var("OFFERFLOW_API_HOST")
            .map_err(|_| anyhow!("OFFERFLOW_API_HOST is not set"))?;
        let api_key = std::env::var("OFFERFLOW_API_KEY")
            .map_err(|_| anyhow!("OFFERFLOW_API_KEY is not set"))?;
        Ok(Self::new(api_base_url, api_key))
    }

    /// Fatal-initialization checks: the feature does not activate without a
    /// reachable remote authority.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(anyhow!("api_base_url must not be empty"));
        }
        if self.api_key.trim().is_empty() {
            return Err(anyhow!("api_key must not be empty"));
        }
        if self.http_timeout_secs == 0 {
            return Err(anyhow!("http_timeout_secs must be positive"));
        }
        Ok(())
    }
}
