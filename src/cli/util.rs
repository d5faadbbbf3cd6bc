//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::client::{GatewayClient, SupportBackend};
use crate::config::{Config, ConfigLoader};
use crate::storage::LocalCache;
use crate::types::Result;

/// Command execution context
///
/// Holds the resolved configuration, the local cache and a client bound to
/// the cached user identity.
#[derive(Clone)]
pub struct CommandContext {
    pub config: Config,
    pub cache: LocalCache,
    pub client: Arc<GatewayClient>,
}

impl CommandContext {
    /// Resolve configuration, open the cache and build the gateway client
    pub fn load(config_path: Option<&Path>, gateway_url: Option<&str>) -> Result<Self> {
        let mut config = load_config(config_path)?;
        if let Some(url) = gateway_url {
            config.chat.gateway_url = url.to_string();
            config.validate()?;
        }

        let cache = open_cache(&config)?;
        let user_id = cache.user_id();
        debug!("Acting as {}", user_id);

        let client = GatewayClient::new(
            &config.chat.gateway_url,
            user_id,
            config.upstream.timeout(),
        )?;

        Ok(Self {
            config,
            cache,
            client: Arc::new(client),
        })
    }

    /// Client as a trait object for the chat session
    pub fn backend(&self) -> Arc<dyn SupportBackend> {
        self.client.clone()
    }
}

/// Load config from an explicit file, or the full resolution chain
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Open the configured local cache
pub fn open_cache(config: &Config) -> Result<LocalCache> {
    debug!("Opening cache at {}", config.storage.cache_path.display());
    LocalCache::open(&config.storage.cache_path)
}
