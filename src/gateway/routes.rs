//! Route table and handlers.

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use reqwest::Method;
use serde_json::{Map, Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::AppState;
use super::proxy::{FailurePolicy, Forward, json_response, object_body, passthrough, user_from};
use crate::overrides::Overrides;
use crate::types::{DeskError, Result};

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        // Chat
        .route("/api/chat", post(chat_send))
        .route("/api/chat/history", get(chat_history).delete(chat_clear))
        .route("/api/timezone", post(set_timezone))
        // Overrides
        .route("/api/overrides", get(load_overrides).post(save_overrides))
        // Sessions
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        // Context and ring status
        .route("/api/context/set", post(context_set))
        .route("/api/context/get", get(context_get))
        .route("/api/context/clear", post(context_clear))
        .route("/api/ring/status", get(ring_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Response {
    json_response(StatusCode::OK, json!({ "status": "ok" }))
}

/// Merge `{user_id}` under the caller's body; body keys win
fn with_user_id(user_id: &str, body: Map<String, Value>) -> Value {
    let mut merged = Map::new();
    merged.insert("user_id".to_string(), Value::String(user_id.to_string()));
    merged.extend(body);
    Value::Object(merged)
}

/// Parse an optional inbound JSON body of any shape
fn any_json_body(body: &Bytes) -> std::result::Result<Option<Value>, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        json_response(
            StatusCode::BAD_REQUEST,
            json!({ "ok": false, "error": format!("Invalid JSON body: {}", e) }),
        )
    })
}

fn session_url(state: &AppState, id: &str) -> Result<String> {
    let mut url = url::Url::parse(&state.api_url("/api/v1/sessions"))
        .map_err(|e| DeskError::Config(format!("Invalid api base: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| DeskError::Config("api base cannot carry a path".to_string()))?
        .push(id);
    Ok(url.to_string())
}

// =============================================================================
// Chat (passthrough)
// =============================================================================

async fn chat_send(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let payload = match any_json_body(&body) {
        Ok(payload) => payload.unwrap_or_else(|| json!({})),
        Err(rejection) => return rejection,
    };
    let user = user_from(&headers);
    let outcome = Forward::new(Method::POST, state.api_url("/api/v1/chat/send"))
        .identified(&user)
        .json(payload)
        .send(&state)
        .await;
    passthrough("chat", outcome)
}

async fn chat_history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = user_from(&headers);
    let outcome = Forward::new(Method::GET, state.api_url("/api/v1/chat/history"))
        .identified(&user)
        .send(&state)
        .await;
    passthrough("chat history", outcome)
}

async fn chat_clear(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = user_from(&headers);
    let outcome = Forward::new(Method::DELETE, state.api_url("/api/v1/chat/history"))
        .identified(&user)
        .send(&state)
        .await;
    passthrough("chat clear", outcome)
}

async fn set_timezone(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let payload = match object_body(&body) {
        Ok(map) => Value::Object(map),
        Err(rejection) => return rejection,
    };
    let user = user_from(&headers);
    let outcome = Forward::new(Method::POST, state.api_url("/api/v1/meta/timezone"))
        .identified(&user)
        .json(payload)
        .send(&state)
        .await;
    passthrough("timezone", outcome)
}

// =============================================================================
// Overrides (masked)
// =============================================================================

async fn load_overrides(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = user_from(&headers);
    let outcome = Forward::new(Method::GET, state.api_url("/api/v1/overrides"))
        .for_user(&user)
        .send(&state)
        .await;

    let policy = FailurePolicy::Mask(json!({ "ok": true, "data": Overrides::default_json() }));
    policy.respond("Overrides GET", outcome, |data| json!({ "ok": true, "data": data }))
}

async fn save_overrides(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let body = match object_body(&body) {
        Ok(map) => map,
        Err(rejection) => return rejection,
    };
    let user = user_from(&headers);
    let outcome = Forward::new(Method::POST, state.api_url("/api/v1/overrides"))
        .identified(&user)
        .json(with_user_id(user.as_str(), body))
        .send(&state)
        .await;

    let policy = FailurePolicy::Mask(json!({ "ok": true, "persisted": false }));
    policy.respond_fixed("Overrides POST", outcome, json!({ "ok": true, "persisted": true }))
}

// =============================================================================
// Sessions
// =============================================================================

async fn list_sessions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = user_from(&headers);
    let outcome = Forward::new(Method::GET, state.api_url("/api/v1/sessions"))
        .for_user(&user)
        .send(&state)
        .await;

    let policy = FailurePolicy::Mask(json!({ "ok": true, "sessions": [] }));
    policy.respond("Sessions GET", outcome, |data| {
        let sessions = data
            .get("sessions")
            .filter(|s| !s.is_null())
            .cloned()
            .unwrap_or_else(|| json!([]));
        json!({ "ok": true, "sessions": sessions })
    })
}

async fn create_session(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let body = match object_body(&body) {
        Ok(map) => map,
        Err(rejection) => return rejection,
    };
    let user = user_from(&headers);
    let outcome = Forward::new(Method::POST, state.api_url("/api/v1/sessions"))
        .identified(&user)
        .json(with_user_id(user.as_str(), body))
        .send(&state)
        .await;

    FailurePolicy::Propagate(None).respond("Sessions POST", outcome, |data| {
        let mut merged = Map::new();
        merged.insert("ok".to_string(), Value::Bool(true));
        if let Value::Object(fields) = data {
            merged.extend(fields);
        }
        Value::Object(merged)
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = user_from(&headers);
    let outcome = match session_url(&state, &id) {
        Ok(url) => Forward::new(Method::GET, url).for_user(&user).send(&state).await,
        Err(e) => Err(e),
    };

    FailurePolicy::NotFound("Session not found").respond("Session GET", outcome, |data| {
        json!({ "ok": true, "session": data })
    })
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let user = user_from(&headers);
    let outcome = match session_url(&state, &id) {
        Ok(url) => Forward::new(Method::DELETE, url).for_user(&user).send(&state).await,
        Err(e) => Err(e),
    };

    FailurePolicy::Propagate(Some("Failed to delete session")).respond_fixed(
        "Session DELETE",
        outcome,
        json!({ "ok": true }),
    )
}

// =============================================================================
// Context and Ring Status (passthrough)
// =============================================================================

async fn context_set(State(state): State<AppState>, body: Bytes) -> Response {
    let payload = match any_json_body(&body) {
        Ok(payload) => payload.unwrap_or(Value::Null),
        Err(rejection) => return rejection,
    };
    let outcome = Forward::new(Method::POST, state.context_url("/api/v1/context/set"))
        .json(payload)
        .send(&state)
        .await;
    passthrough("context set", outcome)
}

async fn context_get(State(state): State<AppState>) -> Response {
    let outcome = Forward::new(Method::GET, state.context_url("/api/v1/context/get"))
        .send(&state)
        .await;
    passthrough("context get", outcome)
}

async fn context_clear(State(state): State<AppState>) -> Response {
    let outcome = Forward::new(Method::POST, state.context_url("/api/v1/context/clear"))
        .send(&state)
        .await;
    passthrough("context clear", outcome)
}

async fn ring_status(State(state): State<AppState>) -> Response {
    let outcome = Forward::new(Method::GET, state.context_url("/api/v1/ring/status"))
        .send(&state)
        .await;
    passthrough("ring status", outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;
    use wiremock::matchers::{body_json, header as header_is, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(api: &MockServer, context: &MockServer) -> Router {
        router(AppState::new(&api.uri(), &context.uri(), reqwest::Client::new()))
    }

    /// Router pointed at a closed port
    fn unreachable_app() -> Router {
        router(AppState::new(
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
            reqwest::Client::new(),
        ))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-user-id", "user-7")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(unreachable_app(), get_req("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_overrides_get_masks_backend_error() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/overrides"))
            .and(query_param("user_id", "default"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&api)
            .await;

        let (status, body) = call(app(&api, &ctx), get_req("/api/overrides")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
        assert_eq!(body["data"], Overrides::default_json());
    }

    #[tokio::test]
    async fn test_overrides_get_masks_transport_error() {
        let (status, body) = call(unreachable_app(), get_req("/api/overrides")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["overridesEnabled"], json!(true));
    }

    #[tokio::test]
    async fn test_overrides_post_merges_user_id() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/overrides"))
            .and(header_is("x-user-id", "user-7"))
            .and(body_json(json!({"user_id": "user-7", "overridesEnabled": false})))
            .respond_with(ResponseTemplate::new(200).set_body_string("saved"))
            .expect(1)
            .mount(&api)
            .await;

        let (status, body) = call(
            app(&api, &ctx),
            json_req("POST", "/api/overrides", json!({"overridesEnabled": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "persisted": true}));
    }

    #[tokio::test]
    async fn test_overrides_post_failure_not_persisted() {
        let (status, body) = call(
            unreachable_app(),
            json_req("POST", "/api/overrides", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "persisted": false}));
    }

    #[tokio::test]
    async fn test_invalid_json_is_400_without_upstream_call() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&api)
            .await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/sessions")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = call(app(&api, &ctx), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["ok"], json!(false));
    }

    #[tokio::test]
    async fn test_sessions_list_masks_failure() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sessions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&api)
            .await;

        let (status, body) = call(app(&api, &ctx), get_req("/api/sessions")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "sessions": []}));
    }

    #[tokio::test]
    async fn test_sessions_list_success() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sessions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"sessions": [{"id": "s1"}]})),
            )
            .mount(&api)
            .await;

        let (_, body) = call(app(&api, &ctx), get_req("/api/sessions")).await;
        assert_eq!(body["sessions"][0]["id"], json!("s1"));
    }

    #[tokio::test]
    async fn test_create_session_propagates_status() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/sessions"))
            .respond_with(ResponseTemplate::new(422).set_body_string("missing summary"))
            .mount(&api)
            .await;

        let (status, body) = call(
            app(&api, &ctx),
            json_req("POST", "/api/sessions", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body, json!({"ok": false, "error": "missing summary"}));
    }

    #[tokio::test]
    async fn test_create_session_spreads_data() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/sessions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "s9"})))
            .mount(&api)
            .await;

        let (status, body) = call(
            app(&api, &ctx),
            json_req("POST", "/api/sessions", json!({"summary": "done"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"ok": true, "id": "s9"}));
    }

    #[tokio::test]
    async fn test_get_session_not_found() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sessions/abc"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&api)
            .await;

        let (status, body) = call(app(&api, &ctx), get_req("/api/sessions/abc")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"ok": false, "error": "Session not found"}));
    }

    #[tokio::test]
    async fn test_get_session_wraps_data() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/sessions/abc"))
            .and(query_param("user_id", "default"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc", "messages": []})))
            .mount(&api)
            .await;

        let (status, body) = call(app(&api, &ctx), get_req("/api/sessions/abc")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["session"]["id"], json!("abc"));
    }

    #[tokio::test]
    async fn test_delete_session_propagates_status() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/sessions/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&api)
            .await;

        let request = Request::builder()
            .method("DELETE")
            .uri("/api/sessions/gone")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app(&api, &ctx), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"ok": false, "error": "Failed to delete session"}));
    }

    #[tokio::test]
    async fn test_delete_session_transport_failure_is_502() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/api/sessions/x")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(unreachable_app(), request).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["ok"], json!(false));
    }

    #[tokio::test]
    async fn test_context_passthrough_relays_status_and_body() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/context/set"))
            .and(body_json(json!({"nameStr": "Asha"})))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"stored":1}"#))
            .mount(&ctx)
            .await;

        let response = app(&api, &ctx)
            .oneshot(json_req("POST", "/api/context/set", json!({"nameStr": "Asha"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json; charset=utf-8"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"stored":1}"#);
    }

    #[tokio::test]
    async fn test_passthrough_empty_body_reads_as_object() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/context/clear"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&ctx)
            .await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/context/clear")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app(&api, &ctx), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[tokio::test]
    async fn test_passthrough_transport_failure() {
        let (status, body) = call(unreachable_app(), get_req("/api/ring/status")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].is_string());
        assert!(body.get("ok").is_none());
    }

    #[tokio::test]
    async fn test_chat_routes_use_api_base() {
        let api = MockServer::start().await;
        let ctx = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/send"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&api)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/chat/history"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"messages": [{"role": "user", "content": "hi"}]})),
            )
            .mount(&api)
            .await;

        let (status, _) = call(
            app(&api, &ctx),
            json_req(
                "POST",
                "/api/chat",
                json!({"messages": [{"role": "user", "content": "hi"}]}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let (status, body) = call(app(&api, &ctx), get_req("/api/chat/history")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"][0]["content"], json!("hi"));
    }
}
