//! HTTP client for the gateway's `/api/*` routes.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::debug;

use super::SupportBackend;
use crate::constants::upstream::USER_ID_HEADER;
use crate::overrides::{Overrides, RingStatus, overrides_from_value};
use crate::types::{
    ChatSubmission, DeskError, HistorySnapshot, Result, SessionDetail, SessionId, SessionSummary,
    UserId,
};

/// Gateway client bound to one user identity
pub struct GatewayClient {
    base_url: String,
    user_id: UserId,
    client: reqwest::Client,
}

impl GatewayClient {
    pub fn new(base_url: &str, user_id: UserId, timeout: Duration) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| DeskError::Config(format!("Invalid gateway URL '{}': {}", base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DeskError::Config(format!(
                "Gateway URL must use http or https scheme, got: {}",
                parsed.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeskError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_id,
            client,
        })
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/api/sessions/<id>` with the id percent-encoded as one segment
    fn session_url(&self, id: &SessionId) -> Result<String> {
        let mut url = url::Url::parse(&self.url("/api/sessions"))
            .map_err(|e| DeskError::Config(format!("Invalid gateway URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| DeskError::Config("Gateway URL cannot be a base".to_string()))?
            .push(id.as_str());
        Ok(url.into())
    }

    /// Attach the caller identity
    fn scoped(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(USER_ID_HEADER, self.user_id.as_str())
    }

    /// Turn a non-2xx reply into `DeskError::Upstream` carrying the body text
    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!("Gateway replied {}: {}", status, body);
        Err(DeskError::upstream(status.as_u16(), body))
    }

    /// Read a JSON body; an empty body reads as `{}`
    async fn read_json(response: Response) -> Result<Value> {
        let text = Self::ensure_success(response).await?.text().await?;
        if text.trim().is_empty() {
            return Ok(json!({}));
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl SupportBackend for GatewayClient {
    async fn history(&self) -> Result<HistorySnapshot> {
        let response = self
            .scoped(self.client.get(self.url("/api/chat/history")))
            .header("cache-control", "no-store")
            .send()
            .await?;
        let body = Self::read_json(response).await?;
        Ok(HistorySnapshot::from_value(&body))
    }

    async fn send_message(&self, submission: &ChatSubmission) -> Result<()> {
        let response = self
            .scoped(self.client.post(self.url("/api/chat")))
            .json(submission)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn clear_history(&self) -> Result<()> {
        let response = self
            .scoped(self.client.delete(self.url("/api/chat/history")))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let response = self
            .scoped(self.client.get(self.url("/api/sessions")))
            .send()
            .await?;
        let body = Self::read_json(response).await?;
        match body.get("sessions") {
            Some(sessions) if sessions.is_array() => Ok(serde_json::from_value(sessions.clone())?),
            _ => Ok(Vec::new()),
        }
    }

    async fn get_session(&self, id: &SessionId) -> Result<SessionDetail> {
        let response = self
            .scoped(self.client.get(self.session_url(id)?))
            .send()
            .await?;
        let body = Self::read_json(response).await?;
        match body.get("session") {
            Some(session) if session.is_object() => Ok(serde_json::from_value(session.clone())?),
            _ => Ok(SessionDetail::default()),
        }
    }

    async fn create_session(&self, body: Value) -> Result<Value> {
        let response = self
            .scoped(self.client.post(self.url("/api/sessions")))
            .json(&body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn delete_session(&self, id: &SessionId) -> Result<()> {
        let response = self
            .scoped(self.client.delete(self.session_url(id)?))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn load_overrides(&self) -> Result<Overrides> {
        let response = self
            .scoped(self.client.get(self.url("/api/overrides")))
            .send()
            .await?;
        let body = Self::read_json(response).await?;

        let ok = body.get("ok").and_then(Value::as_bool).unwrap_or(false);
        match body.get("data") {
            Some(data) if ok && data.is_object() => overrides_from_value(data.clone()),
            _ => Ok(Overrides::default()),
        }
    }

    async fn save_overrides(&self, overrides: &Overrides) -> Result<bool> {
        let response = self
            .scoped(self.client.post(self.url("/api/overrides")))
            .json(overrides)
            .send()
            .await?;
        let body = Self::read_json(response).await?;
        Ok(body
            .get("persisted")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn set_context(&self, context: &Map<String, Value>) -> Result<Value> {
        let response = self
            .client
            .post(self.url("/api/context/set"))
            .json(context)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_context(&self) -> Result<Value> {
        let response = self.client.get(self.url("/api/context/get")).send().await?;
        Self::read_json(response).await
    }

    async fn clear_context(&self) -> Result<Value> {
        let response = self
            .client
            .post(self.url("/api/context/clear"))
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn ring_status(&self) -> Result<Option<RingStatus>> {
        let response = self
            .client
            .get(self.url("/api/ring/status"))
            .header("cache-control", "no-store")
            .send()
            .await?;
        let body = Self::read_json(response).await?;
        Ok(RingStatus::from_envelope(&body))
    }

    async fn set_timezone(&self, timezone: &str) -> Result<()> {
        let response = self
            .scoped(self.client.post(self.url("/api/timezone")))
            .json(&json!({ "timezone": timezone }))
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "gateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> GatewayClient {
        GatewayClient::new(&server.uri(), UserId::from("user-abc"), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = GatewayClient::new("ftp://host", UserId::default(), Duration::from_secs(1));
        assert!(matches!(err, Err(DeskError::Config(_))));
    }

    #[tokio::test]
    async fn test_send_message_accepts_202() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({"messages": [{"role": "user", "content": "hello"}]})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client
            .send_message(&ChatSubmission::user("hello"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_message_failure_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503).set_body_string("backend asleep"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .send_message(&ChatSubmission::user("hello"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.user_message(), "backend asleep");
    }

    #[tokio::test]
    async fn test_history_parses_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/chat/history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .mount(&server)
            .await;

        let snapshot = client_for(&server).await.history().await.unwrap();
        assert_eq!(snapshot.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_send_user_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions"))
            .and(header("x-user-id", "user-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "sessions": [{"id": "s1", "created_at": "2026-01-01T00:00:00Z", "message_count": 3}]
            })))
            .mount(&server)
            .await;

        let sessions = client_for(&server).await.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].message_count, 3);
    }

    #[tokio::test]
    async fn test_missing_session_is_upstream_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/sessions/nope"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"ok": false, "error": "Session not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .get_session(&SessionId::from("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_load_overrides_uses_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/overrides"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "data": {
                    "ringDebugOverrides": {"soft_reset_done": true},
                    "overridesEnabled": false
                }
            })))
            .mount(&server)
            .await;

        let overrides = client_for(&server).await.load_overrides().await.unwrap();
        assert_eq!(overrides.count(), 1);
        assert!(!overrides.overrides_enabled);
    }

    #[tokio::test]
    async fn test_save_overrides_reports_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/overrides"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"ok": true, "persisted": false})),
            )
            .mount(&server)
            .await;

        let persisted = client_for(&server)
            .await
            .save_overrides(&Overrides::default())
            .await
            .unwrap();
        assert!(!persisted);
    }

    #[tokio::test]
    async fn test_ring_status_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ring/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "data": {"currentBatteryLevel": "64%", "connected": true}
            })))
            .mount(&server)
            .await;

        let status = client_for(&server).await.ring_status().await.unwrap().unwrap();
        assert_eq!(status.current_battery_level.as_deref(), Some("64%"));
    }

    #[tokio::test]
    async fn test_empty_context_body_reads_as_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/context/clear"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let body = client_for(&server).await.clear_context().await.unwrap();
        assert_eq!(body, json!({}));
    }
}
