//! Proxy Configuration
//!
//! Outbound proxy settings for calls to the remote model. The HTTP client
//! factory that consumes them lives in `aegis-command-llm`.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

/// Proxy endpoint used for every model request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Filled from `AEGIS_PROXY_PASSWORD` at startup when the config file
    /// leaves it out. Never written back to disk.
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Proxy URL without credentials.
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.host.trim().is_empty() {
            return Err(CoreError::validation("proxy host must not be empty"));
        }
        if self.port == 0 {
            return Err(CoreError::validation("proxy port must be non-zero"));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(CoreError::validation("proxy password set without a username"));
        }
        Ok(())
    }
}
