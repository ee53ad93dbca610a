use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::RawPost;

const X_API_URL: &str = "https://api.x.com/2";

// The timeline endpoint only accepts 5..=100 results per request.
const MIN_RESULTS: u32 = 5;
const MAX_RESULTS: u32 = 100;

/// Yields the recent raw posts for one account handle.
///
/// Producers own everything platform-specific: auth, pagination, and
/// rate-limit handling. The ingestion pipeline only ever sees a finite
/// sequence of raw posts, possibly empty.
#[async_trait]
pub trait PostProducer: Send + Sync {
    /// Fetch recent posts for `handle` (without the leading `@`).
    async fn fetch_posts(&self, handle: &str) -> Result<Vec<RawPost>>;
}

/// Retry policy for rate-limited requests: capped attempts with a
/// doubling delay, overridden by the server's `retry-after` when present.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(60),
        }
    }
}

impl Backoff {
    fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.base_delay * 2u32.saturating_pow(attempt))
    }
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Option<UserData>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: DateTime<Utc>,
}

/// Producer backed by the X API v2 user-timeline endpoints.
pub struct XTimelineClient {
    client: Client,
    bearer_token: String,
    base_url: String,
    max_posts: u32,
    backoff: Backoff,
}

impl XTimelineClient {
    pub fn new(bearer_token: String, max_posts: u32) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("stock-pulse/1.0")
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            bearer_token,
            base_url: X_API_URL.to_string(),
            max_posts: max_posts.clamp(MIN_RESULTS, MAX_RESULTS),
            backoff: Backoff::default(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let mut attempt = 0;
        loop {
            let response = self
                .client
                .get(url)
                .bearer_auth(&self.bearer_token)
                .query(query)
                .send()
                .await?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS
                && attempt + 1 < self.backoff.max_attempts
            {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                let delay = self.backoff.delay(attempt, retry_after);
                tracing::warn!("Rate limited by {url}, retrying in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if !response.status().is_success() {
                return Err(anyhow::anyhow!("HTTP {} from {}", response.status(), url).into());
            }

            return Ok(response.json::<T>().await?);
        }
    }

    async fn lookup_user_id(&self, handle: &str) -> Result<String> {
        let url = format!("{}/users/by/username/{handle}", self.base_url);
        let user: UserResponse = self.get_json(&url, &[]).await?;
        user.data
            .map(|u| u.id)
            .ok_or_else(|| AppError::XApi(format!("user not found: {handle}")))
    }
}

#[async_trait]
impl PostProducer for XTimelineClient {
    async fn fetch_posts(&self, handle: &str) -> Result<Vec<RawPost>> {
        let user_id = self.lookup_user_id(handle).await?;

        let url = format!("{}/users/{user_id}/tweets", self.base_url);
        let query = [
            ("max_results", self.max_posts.to_string()),
            ("tweet.fields", "created_at".to_string()),
        ];
        let timeline: TimelineResponse = self.get_json(&url, &query).await?;

        tracing::debug!("Fetched {} posts for @{handle}", timeline.data.len());

        Ok(timeline
            .data
            .into_iter()
            .map(|tweet| RawPost {
                id: tweet.id,
                text: tweet.text,
                created_at: tweet.created_at,
            })
            .collect())
    }
}
