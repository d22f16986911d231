#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Snapshot listing for the URL mirror.
//!
//! A [`RecordFeed`] produces the current set of downloadable snapshots as
//! `{url, last_modified}` pairs. Each snapshot is mirrored under
//! [`object_key`], `"<realm>/<RFC 3339 timestamp>"`, so every snapshot
//! gets its own destination object.

pub mod config;
pub mod http;
pub mod retry;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

pub use config::FeedConfig;
pub use http::HttpJsonFeed;

/// Errors that can occur while listing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a status that won't improve on retry.
    #[error("Feed API returned HTTP {status}")]
    Status {
        /// Final response status.
        status: reqwest::StatusCode,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A record carried a timestamp outside the representable range.
    #[error("Invalid lastModified value {millis} for {url}")]
    InvalidTimestamp {
        /// Snapshot URL.
        url: String,
        /// Raw epoch-milliseconds value.
        millis: i64,
    },
}

/// One downloadable snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRecord {
    /// Where the snapshot can be fetched.
    pub url: String,
    /// When the snapshot was produced.
    pub last_modified: DateTime<Utc>,
}

/// Source of snapshot records.
#[async_trait]
pub trait RecordFeed: Send + Sync {
    /// Lists the snapshots currently available.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError`] if the listing cannot be fetched or parsed.
    async fn records(&self) -> Result<Vec<FeedRecord>, FeedError>;
}

/// Destination key for a snapshot, e.g.
/// `thrall/2018-10-09T12:34:56+00:00`.
#[must_use]
pub fn object_key(realm: &str, last_modified: &DateTime<Utc>) -> String {
    format!(
        "{realm}/{}",
        last_modified.to_rfc3339_opts(SecondsFormat::Secs, false)
    )
}
