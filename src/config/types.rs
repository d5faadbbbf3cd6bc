//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/ringdesk/) and project (.ringdesk/) level configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{chat, gateway, upstream};
use crate::types::{DeskError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Gateway server settings
    pub gateway: GatewayConfig,

    /// Upstream backend settings
    pub upstream: UpstreamConfig,

    /// Chat client settings
    pub chat: ChatConfig,

    /// Knowledge-base settings
    pub kb: KbConfig,

    /// Local cache settings
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            gateway: GatewayConfig::default(),
            upstream: UpstreamConfig::default(),
            chat: ChatConfig::default(),
            kb: KbConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `DeskError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        self.gateway.bind_addr()?;

        for (name, value) in [
            ("upstream.api_base", &self.upstream.api_base),
            ("upstream.context_base", &self.upstream.context_base),
            ("chat.gateway_url", &self.chat.gateway_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                DeskError::Config(format!("{} is not a valid URL ({}): {}", name, value, e))
            })?;
        }

        if self.upstream.timeout_secs == 0 {
            return Err(DeskError::Config(
                "upstream.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.chat.poll_interval_ms == 0 {
            return Err(DeskError::Config(
                "chat.poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.chat.max_poll_attempts == 0 {
            return Err(DeskError::Config(
                "chat.max_poll_attempts must be greater than 0".to_string(),
            ));
        }

        if self.chat.history_refresh_ms == 0 {
            return Err(DeskError::Config(
                "chat.history_refresh_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Gateway Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listen address for `ringdesk serve`
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: gateway::DEFAULT_BIND.to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind.parse().map_err(|e| {
            DeskError::Config(format!("gateway.bind is not a socket address ({}): {}", self.bind, e))
        })
    }
}

// =============================================================================
// Upstream Configuration
// =============================================================================

/// The backend is split across two bases: chat/sessions/overrides on one,
/// context and ring status on the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL for chat, sessions, overrides and timezone
    pub api_base: String,
    /// Base URL for context and ring status
    pub context_base: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: upstream::DEFAULT_API_BASE.to_string(),
            context_base: upstream::DEFAULT_CONTEXT_BASE.to_string(),
            timeout_secs: upstream::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Chat Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Gateway the chat client talks to
    pub gateway_url: String,
    /// Delay before each poll attempt
    pub poll_interval_ms: u64,
    /// Poll attempts before giving up on a reply
    pub max_poll_attempts: u32,
    /// Background history refresh interval
    pub history_refresh_ms: u64,
    /// Keep polling after a failed submit
    pub poll_after_failed_submit: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            gateway_url: gateway::DEFAULT_URL.to_string(),
            poll_interval_ms: chat::POLL_INTERVAL_MS,
            max_poll_attempts: chat::MAX_POLL_ATTEMPTS,
            history_refresh_ms: chat::HISTORY_REFRESH_MS,
            poll_after_failed_submit: true,
        }
    }
}

// =============================================================================
// Knowledge Base Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KbConfig {
    /// Optional JSON overlay replacing or extending built-in documents
    pub corpus_path: Option<PathBuf>,
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file backing the local cache
    pub cache_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(".ringdesk/cache.db"),
        }
    }
}
