//! Upstream forwarding and failure policies.

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::AppState;
use crate::constants::upstream::USER_ID_HEADER;
use crate::types::{DeskError, Result, UserId};

const JSON_UTF8: &str = "application/json; charset=utf-8";

/// Raw upstream reply
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    pub text: String,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as JSON; an empty body reads as `{}`
    pub fn json(&self) -> Result<Value> {
        if self.text.trim().is_empty() {
            return Ok(json!({}));
        }
        Ok(serde_json::from_str(&self.text)?)
    }
}

/// One outbound call
pub struct Forward<'a> {
    pub method: Method,
    pub url: String,
    pub query_user: Option<&'a UserId>,
    pub header_user: Option<&'a UserId>,
    pub body: Option<Value>,
}

impl<'a> Forward<'a> {
    pub fn new(method: Method, url: String) -> Self {
        Self {
            method,
            url,
            query_user: None,
            header_user: None,
            body: None,
        }
    }

    /// Send `user_id` as a query parameter
    pub fn for_user(mut self, user: &'a UserId) -> Self {
        self.query_user = Some(user);
        self
    }

    /// Send the identity in the `x-user-id` header
    pub fn identified(mut self, user: &'a UserId) -> Self {
        self.header_user = Some(user);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub async fn send(self, state: &AppState) -> Result<UpstreamReply> {
        debug!("{} {}", self.method, self.url);

        let mut request = state
            .client
            .request(self.method, &self.url)
            .header(header::ACCEPT, "application/json");

        if let Some(user) = self.query_user {
            request = request.query(&[("user_id", user.as_str())]);
        }
        if let Some(user) = self.header_user {
            request = request.header(USER_ID_HEADER, user.as_str());
        }
        if let Some(body) = &self.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let text = response.text().await?;
        Ok(UpstreamReply { status, text })
    }
}

/// How a route answers when the upstream fails
#[derive(Debug, Clone)]
pub enum FailurePolicy {
    /// Answer 200 with a fallback body so the UI keeps working
    Mask(Value),
    /// Relay the upstream status with `{ok:false,error}`; the error is the
    /// fixed message when given, else the upstream body text
    Propagate(Option<&'static str>),
    /// Any upstream status reads as 404 with this message
    NotFound(&'static str),
}

impl FailurePolicy {
    /// Map an upstream outcome through the policy, building the success body
    /// from the upstream JSON with `on_success`.
    pub fn respond<F>(&self, route: &str, outcome: Result<UpstreamReply>, on_success: F) -> Response
    where
        F: FnOnce(Value) -> Value,
    {
        let reply = match outcome {
            Ok(reply) => reply,
            Err(e) => return self.on_transport(route, &e),
        };

        if !reply.is_success() {
            return self.on_status(route, reply);
        }

        match reply.json() {
            Ok(data) => json_response(StatusCode::OK, on_success(data)),
            Err(e) => self.on_transport(route, &e),
        }
    }

    /// Like [`respond`](Self::respond) but answers success with a fixed body
    /// without reading the upstream one.
    pub fn respond_fixed(&self, route: &str, outcome: Result<UpstreamReply>, body: Value) -> Response {
        match outcome {
            Ok(reply) if reply.is_success() => json_response(StatusCode::OK, body),
            Ok(reply) => self.on_status(route, reply),
            Err(e) => self.on_transport(route, &e),
        }
    }

    fn on_status(&self, route: &str, reply: UpstreamReply) -> Response {
        warn!("[{}] Backend error {}: {}", route, reply.status, reply.text);
        match self {
            Self::Mask(fallback) => json_response(StatusCode::OK, fallback.clone()),
            Self::Propagate(message) => {
                let error = message.map(str::to_string).unwrap_or(reply.text);
                json_response(reply.status, json!({ "ok": false, "error": error }))
            }
            Self::NotFound(message) => {
                json_response(StatusCode::NOT_FOUND, json!({ "ok": false, "error": message }))
            }
        }
    }

    fn on_transport(&self, route: &str, err: &DeskError) -> Response {
        warn!("[{}] Error: {}", route, err);
        match self {
            Self::Mask(fallback) => json_response(StatusCode::OK, fallback.clone()),
            Self::Propagate(_) | Self::NotFound(_) => json_response(
                StatusCode::BAD_GATEWAY,
                json!({ "ok": false, "error": err.to_string() }),
            ),
        }
    }
}

/// Relay upstream status and body untouched (`{}` for an empty body).
/// Transport failures become 502 `{error}`.
pub fn passthrough(route: &str, outcome: Result<UpstreamReply>) -> Response {
    match outcome {
        Ok(reply) => {
            let body = if reply.text.is_empty() {
                "{}".to_string()
            } else {
                reply.text
            };
            raw_json_response(reply.status, body)
        }
        Err(e) => {
            warn!("[{}] Upstream unreachable: {}", route, e);
            json_response(StatusCode::BAD_GATEWAY, json!({ "error": e.to_string() }))
        }
    }
}

/// Caller identity from `x-user-id`, `default` when absent
pub fn user_from(headers: &HeaderMap) -> UserId {
    UserId::from_header(headers.get(USER_ID_HEADER).and_then(|v| v.to_str().ok()))
}

/// Parse an inbound JSON object body. Empty bodies read as `{}`.
pub fn object_body(body: &Bytes) -> std::result::Result<serde_json::Map<String, Value>, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(serde_json::Map::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(bad_request("Request body must be a JSON object")),
        Err(e) => Err(bad_request(&format!("Invalid JSON body: {}", e))),
    }
}

fn bad_request(message: &str) -> Response {
    json_response(
        StatusCode::BAD_REQUEST,
        json!({ "ok": false, "error": message }),
    )
}

pub fn json_response(status: StatusCode, body: Value) -> Response {
    raw_json_response(status, body.to_string())
}

fn raw_json_response(status: StatusCode, body: String) -> Response {
    let mut response = (status, body).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(status: u16, text: &str) -> Result<UpstreamReply> {
        Ok(UpstreamReply {
            status: StatusCode::from_u16(status).unwrap(),
            text: text.to_string(),
        })
    }

    #[test]
    fn test_mask_hides_status() {
        let policy = FailurePolicy::Mask(json!({"ok": true, "sessions": []}));
        let response = policy.respond("test", reply(500, "boom"), |d| d);
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_propagate_relays_status() {
        let policy = FailurePolicy::Propagate(None);
        let response = policy.respond("test", reply(409, "conflict"), |d| d);
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_found_policy() {
        let policy = FailurePolicy::NotFound("Session not found");
        let response = policy.respond("test", reply(500, ""), |d| d);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_transport_failure_is_502() {
        let policy = FailurePolicy::Propagate(None);
        let response = policy.respond("test", Err(DeskError::upstream(0, "")), |d| d);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_passthrough_sets_content_type() {
        let response = passthrough("test", reply(201, ""));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON_UTF8);
    }

    #[test]
    fn test_object_body() {
        assert!(object_body(&Bytes::from_static(b"")).unwrap().is_empty());
        assert_eq!(
            object_body(&Bytes::from_static(br#"{"a":1}"#)).unwrap()["a"],
            json!(1)
        );
        assert_eq!(
            object_body(&Bytes::from_static(b"{nope")).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
        assert!(object_body(&Bytes::from_static(b"[1]")).is_err());
    }

    #[test]
    fn test_user_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(user_from(&headers).is_default());
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user-9"));
        assert_eq!(user_from(&headers).as_str(), "user-9");
    }
}
