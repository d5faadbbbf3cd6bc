//! ringdesk - Support Console for Ring Wearables
//!
//! Client-side layer of a customer-support assistant: an HTTP gateway in
//! front of the support backend, a typed client for it, the send-and-poll
//! chat exchange, agent overrides layered over the customer payload, and a
//! searchable knowledge base for support agents.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ringdesk::{ChatSession, ConfigLoader, GatewayClient, PollConfig};
//!
//! let config = ConfigLoader::load()?;
//! let client = GatewayClient::new(&config.chat.gateway_url, user_id, config.upstream.timeout())?;
//! let session = ChatSession::new(Arc::new(client), PollConfig::from(&config.chat));
//! let outcome = session.send("My ring stopped charging").await?.wait().await?;
//! ```
//!
//! ## Modules
//!
//! - [`gateway`]: axum proxy exposing the `/api/*` routes
//! - [`client`]: `SupportBackend` trait and its HTTP implementation
//! - [`chat`]: send-and-poll exchange and chat view state
//! - [`overrides`]: override records, context layering, status panel
//! - [`storage`]: SQLite-backed local cache
//! - [`kb`]: documentation corpus and keyword search
//! - [`config`]: layered configuration

pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod gateway;
pub mod kb;
pub mod overrides;
pub mod storage;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{DeskError, ErrorTier, Result, ResultExt};

// Storage
pub use storage::database::PoolConfig as DatabasePoolConfig;
pub use storage::{Database, LocalCache, SharedDatabase};

// =============================================================================
// Chat Re-exports
// =============================================================================

pub use chat::{ChatSession, ChatView, PendingReply, PollConfig, PollOutcome};
pub use client::{GatewayClient, SupportBackend};
pub use types::{ChatBubble, Role, SessionId, UserId};

// =============================================================================
// Overrides and Knowledge Base Re-exports
// =============================================================================

pub use kb::{Corpus, SearchIndex, SearchOutcome};
pub use overrides::{ContextLayers, CustomerPayload, DisplayStatus, OverrideSection, Overrides};
