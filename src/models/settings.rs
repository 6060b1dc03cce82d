//! Settings Models
//!
//! Application configuration and settings data structures.

use serde::{Deserialize, Serialize};

use aegis_command_core::{Coordinates, ProxyConfig};
use aegis_command_llm::{RetryPolicy, DEFAULT_LIVE_MODEL, DEFAULT_MODEL};

/// Default voice for spoken briefings
pub const DEFAULT_VOICE: &str = "Charon";

/// Environment variable the API key is read from by default
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable the proxy password is read from
pub const PROXY_PASSWORD_ENV: &str = "AEGIS_PROXY_PASSWORD";

/// Default cap on the alert working set
pub const DEFAULT_ALERT_CAPACITY: usize = 15;

/// Upper bound on configurable retries
const MAX_CONFIGURABLE_RETRIES: u32 = 10;

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Model for structured and search-grounded generation
    pub model: String,
    /// Model for live audio briefings
    pub live_model: String,
    /// Prebuilt voice for briefings
    pub voice: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    /// REST endpoint override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Rate-limit retry policy applied to every outbound call
    pub retry: RetryPolicy,
    /// Maximum number of alerts kept in the working set
    pub alert_capacity: usize,
    /// Replace predictions with a deduplicated set instead of appending
    pub dedupe_predictions: bool,
    /// Caller coordinate used to bias the live incident search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_location: Option<Coordinates>,
    /// Outbound HTTP proxy
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            live_model: DEFAULT_LIVE_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: None,
            retry: RetryPolicy::default(),
            alert_capacity: DEFAULT_ALERT_CAPACITY,
            dedupe_predictions: false,
            default_location: None,
            proxy: None,
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub model: Option<String>,
    pub live_model: Option<String>,
    pub voice: Option<String>,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
    pub retry: Option<RetryPolicy>,
    pub alert_capacity: Option<usize>,
    pub dedupe_predictions: Option<bool>,
    pub default_location: Option<Coordinates>,
    pub proxy: Option<ProxyConfig>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(model) = update.model {
            self.model = model;
        }
        if let Some(live_model) = update.live_model {
            self.live_model = live_model;
        }
        if let Some(voice) = update.voice {
            self.voice = voice;
        }
        if let Some(env) = update.api_key_env {
            self.api_key_env = env;
        }
        if let Some(base_url) = update.base_url {
            self.base_url = Some(base_url);
        }
        if let Some(retry) = update.retry {
            self.retry = retry;
        }
        if let Some(capacity) = update.alert_capacity {
            self.alert_capacity = capacity;
        }
        if let Some(dedupe) = update.dedupe_predictions {
            self.dedupe_predictions = dedupe;
        }
        if let Some(location) = update.default_location {
            self.default_location = Some(location);
        }
        if let Some(proxy) = update.proxy {
            self.proxy = Some(proxy);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }

        if self.live_model.trim().is_empty() {
            return Err("live_model must not be empty".to_string());
        }

        if self.alert_capacity == 0 {
            return Err("alert_capacity must be at least 1".to_string());
        }

        if self.retry.max_retries > MAX_CONFIGURABLE_RETRIES {
            return Err(format!(
                "retry.max_retries cannot exceed {}",
                MAX_CONFIGURABLE_RETRIES
            ));
        }

        if let Some(location) = &self.default_location {
            if !location.is_valid() {
                return Err(format!(
                    "Invalid default_location: {}, {}",
                    location.lat, location.lng
                ));
            }
        }

        if let Some(proxy) = &self.proxy {
            proxy.validate().map_err(String::from)?;
        }

        Ok(())
    }

    /// Read the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Proxy settings with the password taken from [`PROXY_PASSWORD_ENV`].
    pub fn resolve_proxy(&self) -> Option<ProxyConfig> {
        self.proxy_with_password(std::env::var(PROXY_PASSWORD_ENV).ok())
    }

    fn proxy_with_password(&self, password: Option<String>) -> Option<ProxyConfig> {
        let mut proxy = self.proxy.clone()?;
        if proxy.password.is_none() && proxy.username.is_some() {
            proxy.password = password.filter(|p| !p.is_empty());
        }
        Some(proxy)
    }
}
