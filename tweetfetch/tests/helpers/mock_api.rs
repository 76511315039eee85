//! In-process mock of the tweet lookup API
//!
//! Serves `GET /2/tweets` and `POST /oauth2/token` on an ephemeral local
//! port and records every lookup request.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

pub const TEST_BEARER_TOKEN: &str = "test-bearer-token";
pub const TEST_APP_KEY: &str = "test-app-key";
pub const TEST_APP_SECRET: &str = "test-app-secret";

/// One recorded lookup request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub ids: Vec<String>,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
}

#[derive(Default)]
struct MockBehavior {
    requests: Vec<RecordedRequest>,
    token_requests: usize,
    /// Remaining lookups answered with 429
    rate_limited: usize,
    /// Send 429 responses without `x-rate-limit-reset`
    omit_reset_header: bool,
    /// Answer token exchanges with 403
    reject_token_exchange: bool,
    /// Ids returned without an `id` field
    malformed: HashSet<String>,
    /// Ids reported as not found
    missing: HashSet<String>,
}

#[derive(Clone, Default)]
struct MockState {
    behavior: Arc<Mutex<MockBehavior>>,
}

/// Deterministic tweet object served for an id
pub fn mock_tweet(id: &str) -> Value {
    json!({
        "id": id,
        "text": format!("tweet number {}", id),
        "author_id": "2244994945",
        "lang": "en",
        "created_at": "2021-11-17T19:00:00.000Z",
        "public_metrics": {
            "retweet_count": 1,
            "reply_count": 0,
            "like_count": 3,
            "quote_count": 0
        }
    })
}

/// Running mock API
pub struct MockApi {
    pub base_url: String,
    state: MockState,
    handle: JoinHandle<()>,
}

impl MockApi {
    pub async fn start() -> Self {
        let state = MockState::default();

        let app = Router::new()
            .route("/2/tweets", get(lookup_handler))
            .route("/oauth2/token", post(token_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            handle,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.behavior.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.behavior.lock().unwrap().requests.len()
    }

    pub fn token_requests(&self) -> usize {
        self.state.behavior.lock().unwrap().token_requests
    }

    /// Answer the next `count` lookups with HTTP 429
    pub fn rate_limit_next(&self, count: usize) {
        self.state.behavior.lock().unwrap().rate_limited = count;
    }

    /// Answer the next `count` lookups with a bare 429 (no reset header)
    pub fn rate_limit_next_without_reset(&self, count: usize) {
        let mut behavior = self.state.behavior.lock().unwrap();
        behavior.rate_limited = count;
        behavior.omit_reset_header = true;
    }

    /// Reject or accept app key/secret token exchanges
    pub fn reject_token_exchange(&self, reject: bool) {
        self.state.behavior.lock().unwrap().reject_token_exchange = reject;
    }

    /// Serve this id without an `id` field
    pub fn make_malformed(&self, id: u64) {
        self.state.behavior.lock().unwrap().malformed.insert(id.to_string());
    }

    /// Report this id as not found
    pub fn make_missing(&self, id: u64) {
        self.state.behavior.lock().unwrap().missing.insert(id.to_string());
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn lookup_handler(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let ids: Vec<String> = query
        .get("ids")
        .map(|ids| ids.split(',').map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let mut behavior = state.behavior.lock().unwrap();
    behavior.requests.push(RecordedRequest {
        ids: ids.clone(),
        query: query.clone(),
        authorization: authorization.clone(),
    });

    let expected = format!("Bearer {}", TEST_BEARER_TOKEN);
    if authorization.as_deref() != Some(expected.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"title": "Unauthorized", "status": 401})),
        )
            .into_response();
    }

    if behavior.rate_limited > 0 {
        behavior.rate_limited -= 1;
        // Reset instant already passed, so a waiting client retries after one second
        let reset = chrono::Utc::now().timestamp() - 5;
        let mut response =
            (StatusCode::TOO_MANY_REQUESTS, Json(json!({"title": "Too Many Requests"})))
                .into_response();
        if !behavior.omit_reset_header {
            response
                .headers_mut()
                .insert("x-rate-limit-reset", reset.to_string().parse().unwrap());
        }
        return response;
    }

    let mut data = Vec::new();
    let mut errors = Vec::new();

    for id in &ids {
        if behavior.missing.contains(id) {
            errors.push(json!({
                "value": id,
                "detail": format!("Could not find tweet with ids: [{}].", id),
                "title": "Not Found Error",
                "resource_type": "tweet",
                "parameter": "ids",
                "resource_id": id,
                "type": "https://api.twitter.com/2/problems/resource-not-found"
            }));
        } else if behavior.malformed.contains(id) {
            data.push(json!({"text": "record without id"}));
        } else {
            data.push(mock_tweet(id));
        }
    }

    let mut body = serde_json::Map::new();
    if !data.is_empty() {
        body.insert("data".to_string(), Value::Array(data));
        body.insert(
            "includes".to_string(),
            json!({"users": [{"id": "2244994945", "username": "TwitterDev"}]}),
        );
    }
    if !errors.is_empty() {
        body.insert("errors".to_string(), Value::Array(errors));
    }

    (StatusCode::OK, Json(Value::Object(body))).into_response()
}

async fn token_handler(State(state): State<MockState>, headers: HeaderMap) -> Response {
    let reject = {
        let mut behavior = state.behavior.lock().unwrap();
        behavior.token_requests += 1;
        behavior.reject_token_exchange
    };

    let is_basic = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("Basic "))
        .unwrap_or(false);

    if reject || !is_basic {
        return (StatusCode::FORBIDDEN, Json(json!({"errors": []}))).into_response();
    }

    (
        StatusCode::OK,
        Json(json!({"token_type": "bearer", "access_token": TEST_BEARER_TOKEN})),
    )
        .into_response()
}
