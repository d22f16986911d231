//! [`RecordFeed`] over the auction data status endpoint.
//!
//! The endpoint answers with
//!
//! ```json
//! {"files": [{"url": "https://.../auctions.json", "lastModified": 1539088496000}]}
//! ```
//!
//! where `lastModified` is in epoch milliseconds.
//!
//! With client credentials configured, each listing first exchanges them
//! for a bearer token (OAuth client-credentials grant), so scheduled runs
//! never depend on a token that may have expired.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::retry::{self, RetryPolicy};
use crate::{FeedConfig, FeedError, FeedRecord, RecordFeed};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    files: Vec<ListingFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingFile {
    url: String,
    last_modified: i64,
}

/// Lists snapshots from the HTTP JSON status endpoint.
pub struct HttpJsonFeed {
    client: reqwest::Client,
    config: FeedConfig,
    retry: RetryPolicy,
}

impl HttpJsonFeed {
    /// Creates a feed with a default HTTP client and retry policy.
    #[must_use]
    pub fn new(config: FeedConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            retry: RetryPolicy::default(),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The configuration this feed lists from.
    #[must_use]
    pub const fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Bearer token for the listing: the configured one, a fresh one from
    /// the client-credentials exchange, or none.
    async fn bearer_token(&self) -> Result<Option<String>, FeedError> {
        if let Some(token) = &self.config.access_token {
            return Ok(Some(token.clone()));
        }
        let Some((client_id, client_secret)) = self.config.client_credentials() else {
            return Ok(None);
        };

        log::debug!("Requesting access token from {}", self.config.token_url);
        let value = retry::send_json(
            || {
                self.client
                    .post(&self.config.token_url)
                    .basic_auth(client_id, Some(client_secret))
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body("grant_type=client_credentials")
            },
            self.retry,
        )
        .await?;

        let token: TokenResponse = serde_json::from_value(value)?;
        Ok(Some(token.access_token))
    }
}

#[async_trait]
impl RecordFeed for HttpJsonFeed {
    async fn records(&self) -> Result<Vec<FeedRecord>, FeedError> {
        let token = self.bearer_token().await?;
        let url = self.config.listing_url();
        log::info!("Listing snapshots from {url}");

        let value = retry::send_json(
            || {
                let request = self
                    .client
                    .get(&url)
                    .query(&[("locale", self.config.locale.as_str())]);
                match &token {
                    Some(token) => request.bearer_auth(token),
                    None => request,
                }
            },
            self.retry,
        )
        .await?;

        let listing: Listing = serde_json::from_value(value)?;
        let records = listing
            .files
            .into_iter()
            .map(|file| {
                let last_modified = DateTime::from_timestamp_millis(file.last_modified)
                    .ok_or_else(|| FeedError::InvalidTimestamp {
                        url: file.url.clone(),
                        millis: file.last_modified,
                    })?;
                Ok(FeedRecord {
                    url: file.url,
                    last_modified,
                })
            })
            .collect::<Result<Vec<_>, FeedError>>()?;

        log::info!("  found {} snapshot(s)", records.len());
        Ok(records)
    }
}
