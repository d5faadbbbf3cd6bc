//! Gateway
//!
//! Stateless HTTP proxy exposing the `/api/*` routes the support UI calls.
//! Each route forwards to the support backend and maps failures according
//! to its `FailurePolicy`. Two upstream bases are used: the API base for
//! chat, sessions, overrides and timezone, and the context base for context
//! and ring status.

pub mod proxy;
pub mod routes;

pub use proxy::{FailurePolicy, Forward, UpstreamReply};
pub use routes::router;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::types::{DeskError, Result};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub api_base: Arc<str>,
    pub context_base: Arc<str>,
}

impl AppState {
    pub fn new(api_base: &str, context_base: &str, client: reqwest::Client) -> Self {
        Self {
            client,
            api_base: Arc::from(api_base.trim_end_matches('/')),
            context_base: Arc::from(context_base.trim_end_matches('/')),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream.timeout())
            .build()
            .map_err(|e| DeskError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::new(
            &config.upstream.api_base,
            &config.upstream.context_base,
            client,
        ))
    }

    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub fn context_url(&self, path: &str) -> String {
        format!("{}{}", self.context_base, path)
    }
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.gateway.bind_addr()?;
    let state = AppState::from_config(config)?;
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(
        "Gateway listening on http://{} (api: {}, context: {})",
        listener.local_addr()?,
        config.upstream.api_base,
        config.upstream.context_base
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down gateway");
        })
        .await?;

    Ok(())
}
