//! HTTP implementation of [`ContentSource`]
//!
//! Speaks the platform's public JSON listing API with app-only OAuth:
//! each client holds one credential, fetches a bearer token with the
//! client-credentials grant, and caches it until shortly before expiry.

use crate::config::{CredentialConfig, SourceConfig};
use crate::credentials::credential_label;
use crate::error::{Error, FetchError};
use crate::source::{ContentSource, FeedPage};
use crate::types::{Post, SortOrder, TimeWindow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Refresh the token this long before it actually expires
const TOKEN_EXPIRY_LEEWAY: Duration = Duration::from_secs(60);

/// How much response body to keep in a status error
const ERROR_BODY_LIMIT: usize = 256;

/// Platform client bound to a single credential
pub struct HttpSource {
    client: reqwest::Client,
    credential: CredentialConfig,
    api_base_url: String,
    auth_base_url: String,
    token: Mutex<Option<CachedToken>>,
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

/// Listing envelope as the platform returns it
#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
    #[serde(default)]
    after: Option<String>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: RawPost,
}

#[derive(Deserialize)]
struct RawPost {
    id: String,
    #[serde(default)]
    name: Option<String>,
    author: String,
    title: String,
    score: i64,
    url: String,
    created_utc: f64,
    permalink: String,
    num_comments: i64,
    #[serde(default)]
    selftext: Option<String>,
    subreddit: String,
}

impl RawPost {
    fn into_post(self) -> Result<Post, FetchError> {
        let secs = self.created_utc as i64;
        let created_at = DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| {
            FetchError::Decode(format!("post {}: bad created_utc {}", self.id, self.created_utc))
        })?;

        // The platform sends an empty string for posts without a body
        let selftext = self.selftext.filter(|s| !s.is_empty());

        Ok(Post {
            id: self.id,
            author: self.author,
            title: self.title,
            score: self.score,
            url: self.url,
            created_at,
            permalink: self.permalink,
            num_comments: self.num_comments,
            selftext,
            community: self.subreddit,
        })
    }
}

impl HttpSource {
    /// Build a client for one credential
    pub fn new(credential: CredentialConfig, source: &SourceConfig) -> crate::error::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(source.request_timeout)
            .user_agent(credential.user_agent.clone())
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to build HTTP client: {e}"),
                key: Some("source".to_string()),
            })?;

        Ok(Self {
            client,
            credential,
            api_base_url: source.api_base_url.trim_end_matches('/').to_string(),
            auth_base_url: source.auth_base_url.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    /// Get a valid bearer token, fetching a fresh one if needed
    async fn bearer_token(&self) -> Result<String, FetchError> {
        let mut guard = self.token.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let url = format!("{}/api/v1/access_token", self.auth_base_url);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.credential.client_id, Some(&self.credential.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = truncated_body(response).await;
            return Err(FetchError::Auth {
                label: credential_label(&self.credential).to_string(),
                reason: format!("token endpoint returned {status}: {body}"),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| FetchError::Auth {
            label: credential_label(&self.credential).to_string(),
            reason: format!("malformed token response: {e}"),
        })?;

        let ttl = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_LEEWAY);
        let access_token = token.access_token.clone();
        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + ttl,
        });

        Ok(access_token)
    }

    /// GET a listing endpoint and decode the envelope
    async fn fetch_listing(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ListingData, FetchError> {
        let token = self.bearer_token().await?;
        let url = format!("{}{}", self.api_base_url, path);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Force a fresh token on the next request
            self.token.lock().await.take();
            let body = truncated_body(response).await;
            return Err(FetchError::Auth {
                label: credential_label(&self.credential).to_string(),
                reason: format!("bearer token rejected: {body}"),
            });
        }
        if !status.is_success() {
            let body = truncated_body(response).await;
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(format!("listing at {path}: {e}")))?;

        Ok(listing.data)
    }
}

async fn truncated_body(response: reqwest::Response) -> String {
    let mut body = response.text().await.unwrap_or_default();
    body.truncate(ERROR_BODY_LIMIT);
    body
}

fn decode_posts(data: ListingData) -> Result<Vec<Post>, FetchError> {
    data.children
        .into_iter()
        .map(|child| child.data.into_post())
        .collect()
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn search(
        &self,
        query: &str,
        sort: SortOrder,
        limit: u32,
        window: TimeWindow,
    ) -> Result<Vec<Post>, FetchError> {
        let data = self
            .fetch_listing(
                "/search",
                &[
                    ("q", query.to_string()),
                    ("sort", sort.as_str().to_string()),
                    ("limit", limit.to_string()),
                    ("t", window.as_str().to_string()),
                    ("raw_json", "1".to_string()),
                ],
            )
            .await?;
        decode_posts(data)
    }

    async fn user_feed(
        &self,
        user: &str,
        after: Option<&str>,
        limit: u32,
    ) -> Result<FeedPage, FetchError> {
        let mut query = vec![
            ("sort", "new".to_string()),
            ("limit", limit.to_string()),
            ("raw_json", "1".to_string()),
        ];
        if let Some(cursor) = after {
            query.push(("after", cursor.to_string()));
        }

        let data = self
            .fetch_listing(&format!("/user/{user}/submitted"), &query)
            .await?;

        // Prefer the envelope cursor; fall back to the last post's fullname
        let after = data.after.clone().or_else(|| {
            data.children
                .last()
                .and_then(|child| child.data.name.clone())
        });
        let posts = decode_posts(data)?;

        Ok(FeedPage {
            after: if posts.is_empty() { None } else { after },
            posts,
        })
    }

    async fn community_feed(
        &self,
        community: &str,
        sort: SortOrder,
        limit: u32,
        window: TimeWindow,
    ) -> Result<Vec<Post>, FetchError> {
        let data = self
            .fetch_listing(
                &format!("/r/{community}/{}", sort.as_str()),
                &[
                    ("limit", limit.to_string()),
                    ("t", window.as_str().to_string()),
                    ("raw_json", "1".to_string()),
                ],
            )
            .await?;
        decode_posts(data)
    }
}
