//! Twitter v2 tweet lookup client
//!
//! Resolves batches of up to 100 tweet ids per request through
//! `GET /2/tweets`, requesting author and referenced-tweet expansions.
//!
//! On HTTP 429 the client either sleeps until the window reported in
//! `x-rate-limit-reset` and reissues the request, or fails with
//! [`TwitterError::RateLimited`], depending on `wait_on_rate_limit`. A 429
//! without a usable reset header always fails.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tweetfetch_common::config::Credentials;
use tweetfetch_common::tweet_id::join_ids;
use tweetfetch_common::TweetId;

/// Largest `ids` list the lookup endpoint accepts
pub const MAX_IDS_PER_REQUEST: usize = 100;

const USER_AGENT: &str = concat!("tweetfetch/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

const EXPANSIONS: &str =
    "author_id,in_reply_to_user_id,referenced_tweets.id,referenced_tweets.id.author_id";
const TWEET_FIELDS: &str = "created_at,public_metrics,lang";
const USER_FIELDS: &str = "created_at,public_metrics,id";

/// Lookup client errors
#[derive(Debug, Error)]
pub enum TwitterError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Unauthorized ({0}): {1}")]
    Unauthorized(u16, String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A tweet object exactly as the API returned it
pub type TweetRecord = Map<String, Value>;

/// Envelope of a `GET /2/tweets` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LookupResponse {
    /// Resolved tweets; absent when none of the ids could be resolved
    #[serde(default)]
    pub data: Option<Vec<TweetRecord>>,
    /// Expanded objects (users, referenced tweets)
    #[serde(default)]
    pub includes: Option<Value>,
    /// Per-id problems, e.g. deleted or protected tweets
    #[serde(default)]
    pub errors: Vec<ApiProblem>,
}

impl LookupResponse {
    pub fn record_count(&self) -> usize {
        self.data.as_ref().map(|d| d.len()).unwrap_or(0)
    }
}

/// Partial error entry reported alongside (or instead of) `data`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiProblem {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(rename = "type", default)]
    pub problem_type: Option<String>,
}

impl ApiProblem {
    /// Tweet id the problem refers to
    pub fn id(&self) -> Option<&str> {
        self.value.as_deref().or(self.resource_id.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
}

/// Batch lookup of tweets by id
///
/// Implemented by [`TwitterClient`]; tests substitute a mock.
#[async_trait]
pub trait TweetLookup: Send + Sync {
    /// Resolve up to [`MAX_IDS_PER_REQUEST`] ids in one request
    async fn get_tweets(&self, ids: &[TweetId]) -> Result<LookupResponse, TwitterError>;
}

/// Twitter v2 API client (app-only bearer auth)
pub struct TwitterClient {
    http_client: reqwest::Client,
    base_url: String,
    bearer_token: String,
    wait_on_rate_limit: bool,
}

impl TwitterClient {
    /// Create client from an existing bearer token
    pub fn new(
        bearer_token: String,
        wait_on_rate_limit: bool,
        base_url: &str,
    ) -> Result<Self, TwitterError> {
        let http_client = build_http_client()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token,
            wait_on_rate_limit,
        })
    }

    /// Create client from the credential file contents
    ///
    /// Uses `oauth_token` as bearer token. When it is blank, exchanges
    /// `app_key` / `app_secret` for a bearer token first.
    pub async fn from_credentials(
        credentials: &Credentials,
        wait_on_rate_limit: bool,
        base_url: &str,
    ) -> Result<Self, TwitterError> {
        if credentials.has_bearer_token() {
            return Self::new(
                credentials.oauth_token.trim().to_string(),
                wait_on_rate_limit,
                base_url,
            );
        }

        if !credentials.has_app_keys() {
            return Err(TwitterError::Config(
                "Credential file has neither oauth_token nor app_key/app_secret".to_string(),
            ));
        }

        let mut client = Self::new(String::new(), wait_on_rate_limit, base_url)?;
        client.bearer_token = client
            .obtain_bearer_token(&credentials.app_key, &credentials.app_secret)
            .await?;
        Ok(client)
    }

    pub fn wait_on_rate_limit(&self) -> bool {
        self.wait_on_rate_limit
    }

    /// OAuth2 client-credentials exchange
    async fn obtain_bearer_token(
        &self,
        app_key: &str,
        app_secret: &str,
    ) -> Result<String, TwitterError> {
        let url = format!("{}/oauth2/token", self.base_url);
        tracing::debug!(url = %url, "Requesting app-only bearer token");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(app_key.trim(), Some(app_secret.trim()))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| TwitterError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TwitterError::Unauthorized(status.as_u16(), error_text));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TwitterError::Api(status.as_u16(), error_text));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| TwitterError::Parse(e.to_string()))?;

        if !token.token_type.eq_ignore_ascii_case("bearer") {
            return Err(TwitterError::Parse(format!(
                "Unexpected token type: {}",
                token.token_type
            )));
        }

        tracing::info!("Obtained app-only bearer token");
        Ok(token.access_token)
    }
}

#[async_trait]
impl TweetLookup for TwitterClient {
    async fn get_tweets(&self, ids: &[TweetId]) -> Result<LookupResponse, TwitterError> {
        if ids.len() > MAX_IDS_PER_REQUEST {
            return Err(TwitterError::Config(format!(
                "{} ids exceed the per-request limit of {}",
                ids.len(),
                MAX_IDS_PER_REQUEST
            )));
        }

        let url = format!("{}/2/tweets", self.base_url);
        let params = lookup_params(ids);

        loop {
            tracing::debug!(url = %url, count = ids.len(), "Querying tweet lookup API");

            let response = self
                .http_client
                .get(&url)
                .bearer_auth(&self.bearer_token)
                .query(&params)
                .send()
                .await
                .map_err(|e| TwitterError::Network(e.to_string()))?;

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if !self.wait_on_rate_limit {
                    return Err(TwitterError::RateLimited);
                }

                let Some(reset) = rate_limit_reset(response.headers()) else {
                    tracing::warn!("Rate limit reached without x-rate-limit-reset header");
                    return Err(TwitterError::RateLimited);
                };
                let wait = rate_limit_wait(reset, Utc::now());
                tracing::warn!("Rate limit reached. Sleeping for {:?}", wait);
                tokio::time::sleep(wait).await;
                continue;
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                let error_text = response.text().await.unwrap_or_default();
                return Err(TwitterError::Unauthorized(status.as_u16(), error_text));
            }

            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                return Err(TwitterError::Api(status.as_u16(), error_text));
            }

            let lookup: LookupResponse = response
                .json()
                .await
                .map_err(|e| TwitterError::Parse(e.to_string()))?;

            tracing::debug!(
                requested = ids.len(),
                returned = lookup.record_count(),
                problems = lookup.errors.len(),
                "Tweet lookup complete"
            );

            return Ok(lookup);
        }
    }
}

fn build_http_client() -> Result<reqwest::Client, TwitterError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| TwitterError::Network(e.to_string()))
}

/// Query parameters of a lookup request
pub fn lookup_params(ids: &[TweetId]) -> Vec<(&'static str, String)> {
    vec![
        ("ids", join_ids(ids)),
        ("expansions", EXPANSIONS.to_string()),
        ("tweet.fields", TWEET_FIELDS.to_string()),
        ("user.fields", USER_FIELDS.to_string()),
    ]
}

/// Reset instant from the `x-rate-limit-reset` header (epoch seconds)
fn rate_limit_reset(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    let epoch = headers
        .get("x-rate-limit-reset")?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()?;
    Utc.timestamp_opt(epoch, 0).single()
}

/// Time to sleep before the rate-limit window reopens, plus one second
///
/// Never shorter than one second, even when the reset instant has passed.
pub fn rate_limit_wait(reset: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    let seconds = (reset - now).num_seconds() + 1;
    Duration::from_secs(seconds.max(1) as u64)
}
