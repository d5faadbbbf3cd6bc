//! Support Client
//!
//! The `SupportBackend` trait is the seam between the chat exchange / CLI and
//! the gateway. `GatewayClient` is the HTTP implementation; tests substitute
//! in-memory backends.

mod gateway_client;

pub use gateway_client::GatewayClient;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::overrides::{Overrides, RingStatus};
use crate::types::{
    ChatSubmission, HistorySnapshot, Result, SessionDetail, SessionId, SessionSummary,
};

/// Operations the support UI performs against the gateway
#[async_trait]
pub trait SupportBackend: Send + Sync {
    // Chat

    /// Fetch the current conversation snapshot
    async fn history(&self) -> Result<HistorySnapshot>;

    /// Submit a message. Accepted (2xx, including 202) is success.
    async fn send_message(&self, submission: &ChatSubmission) -> Result<()>;

    async fn clear_history(&self) -> Result<()>;

    // Sessions

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    async fn get_session(&self, id: &SessionId) -> Result<SessionDetail>;

    /// Archive a session; returns the backend's record
    async fn create_session(&self, body: Value) -> Result<Value>;

    async fn delete_session(&self, id: &SessionId) -> Result<()>;

    // Overrides

    async fn load_overrides(&self) -> Result<Overrides>;

    /// Returns whether the backend persisted the overrides
    async fn save_overrides(&self, overrides: &Overrides) -> Result<bool>;

    // Context and status

    async fn set_context(&self, context: &Map<String, Value>) -> Result<Value>;

    async fn get_context(&self) -> Result<Value>;

    async fn clear_context(&self) -> Result<Value>;

    /// Live ring status, `None` when the backend has nothing to report
    async fn ring_status(&self) -> Result<Option<RingStatus>>;

    async fn set_timezone(&self, timezone: &str) -> Result<()>;

    /// Backend name for logs
    fn name(&self) -> &str;
}
