//! Application configuration management.
//!
//! This module handles loading and saving the client configuration,
//! which covers the identity-provider settings (AWS region and Cognito
//! app client id) and the base URL of the Phantom backend API.
//!
//! Configuration is stored at `~/.config/phantom/config.json`. Individual
//! fields can be overridden through `PHANTOM_*` environment variables,
//! optionally loaded from a `.env` file.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config directory paths
const APP_NAME: &str = "phantom";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default AWS region hosting the user pool
const DEFAULT_REGION: &str = "us-east-1";

/// Default base URL for the Phantom backend API
const DEFAULT_API_BASE_URL: &str = "https://14afbieyig.execute-api.us-east-1.amazonaws.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub region: String,
    pub client_id: String,
    pub api_base_url: String,
    /// Full identity-provider URL; when unset it is derived from `region`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_endpoint_override: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            client_id: String::new(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            provider_endpoint_override: None,
        }
    }
}

impl Config {
    /// Load configuration from disk, then apply environment overrides.
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if not found)
        let _ = dotenvy::dotenv();

        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    fn apply_env(&mut self) {
        if let Ok(region) = std::env::var("PHANTOM_REGION") {
            self.region = region;
        }
        if let Ok(client_id) = std::env::var("PHANTOM_CLIENT_ID") {
            self.client_id = client_id;
        }
        if let Ok(base_url) = std::env::var("PHANTOM_API_BASE_URL") {
            self.api_base_url = base_url;
        }
        if let Ok(endpoint) = std::env::var("PHANTOM_PROVIDER_ENDPOINT") {
            self.provider_endpoint_override = Some(endpoint);
        }
    }

    /// The identity-provider endpoint all auth operations POST to.
    pub fn provider_endpoint(&self) -> String {
        match &self.provider_endpoint_override {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://cognito-idp.{}.amazonaws.com/", self.region),
        }
    }
}
