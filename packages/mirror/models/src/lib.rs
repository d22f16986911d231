#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data types shared by the URL mirror.
//!
//! A sync compares the cache-relevant headers of a source response
//! ([`SourceHeaders`]) against what was recorded on the destination object
//! ([`DestinationObjectInfo`]) the last time it was written, and if they
//! differ, writes a new object described by a [`TransferRequest`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata key recording the source `ETag` on the destination object.
pub const SRC_ETAG_KEY: &str = "src-etag";

/// Metadata key recording the source `Last-Modified` on the destination
/// object.
pub const SRC_LAST_MODIFIED_KEY: &str = "src-last-modified";

/// Cache-relevant headers from a source HTTP response.
///
/// `last_modified` is kept as the raw HTTP-date text and is only ever
/// compared as a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceHeaders {
    /// `Content-Encoding` header.
    pub content_encoding: Option<String>,
    /// `Content-Type` header.
    pub content_type: Option<String>,
    /// `ETag` header.
    pub etag: Option<String>,
    /// `Last-Modified` header.
    pub last_modified: Option<String>,
}

/// Snapshot of an existing destination object's attributes.
///
/// Metadata keys are lower-cased on construction so lookups are
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationObjectInfo {
    /// Object-level `Content-Encoding` attribute.
    pub content_encoding: Option<String>,
    /// Object-level `Content-Type` attribute.
    pub content_type: Option<String>,
    metadata: BTreeMap<String, String>,
}

impl DestinationObjectInfo {
    /// Creates a snapshot from object attributes and user metadata.
    #[must_use]
    pub fn new<I, K, V>(
        content_encoding: Option<String>,
        content_type: Option<String>,
        metadata: I,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            content_encoding,
            content_type,
            metadata: metadata
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Looks up a user metadata value, ignoring key case.
    #[must_use]
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(&key.to_lowercase()).map(String::as_str)
    }

    /// All user metadata, keyed by lower-cased name.
    #[must_use]
    pub const fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

/// Canned access-control setting applied when an object is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectAcl {
    /// Owner-only access.
    #[default]
    Private,
}

impl ObjectAcl {
    /// The canned ACL name as understood by S3.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
        }
    }
}

/// Attributes and metadata carried from the source onto the destination.
///
/// Absent headers stay `None` and are never written as empty attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAttributes {
    /// Object-level `Content-Encoding` to set.
    pub content_encoding: Option<String>,
    /// Object-level `Content-Type` to set.
    pub content_type: Option<String>,
    /// User metadata to set (`src-etag`, `src-last-modified`).
    pub metadata: BTreeMap<String, String>,
}

impl UploadAttributes {
    /// Builds the destination attributes for a source response.
    #[must_use]
    pub fn from_headers(headers: &SourceHeaders) -> Self {
        let mut metadata = BTreeMap::new();
        if let Some(etag) = &headers.etag {
            metadata.insert(SRC_ETAG_KEY.to_string(), etag.clone());
        }
        if let Some(last_modified) = &headers.last_modified {
            metadata.insert(SRC_LAST_MODIFIED_KEY.to_string(), last_modified.clone());
        }

        Self {
            content_encoding: headers.content_encoding.clone(),
            content_type: headers.content_type.clone(),
            metadata,
        }
    }
}

/// Everything needed to write one destination object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Destination bucket.
    pub bucket: String,
    /// Destination object key.
    pub key: String,
    /// Access control applied on write.
    pub acl: ObjectAcl,
    /// Attributes and metadata copied from the source.
    pub attributes: UploadAttributes,
}

impl TransferRequest {
    /// Creates a private-object transfer request.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>, headers: &SourceHeaders) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            acl: ObjectAcl::Private,
            attributes: UploadAttributes::from_headers(headers),
        }
    }

    /// `s3://bucket/key` form used in log lines.
    #[must_use]
    pub fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// What a single sync did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The destination already matched the source; nothing was written.
    Skipped,
    /// The source was streamed to the destination.
    Transferred {
        /// Number of body bytes written.
        bytes: u64,
    },
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Skipped => f.write_str("skipped (up-to-date)"),
            Self::Transferred { bytes } => write!(f, "transferred {bytes} bytes"),
        }
    }
}

/// Result of a batch of syncs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    /// Number of objects actually written.
    pub transferred: u64,
    /// Number of objects skipped because they were up to date.
    pub skipped: u64,
    /// Number of records whose sync returned an error.
    pub failed: u64,
}

impl SyncStats {
    /// Counts a completed sync.
    pub const fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Skipped => self.skipped += 1,
            SyncOutcome::Transferred { .. } => self.transferred += 1,
        }
    }

    /// Counts a failed sync.
    pub const fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Total number of records considered.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.transferred + self.skipped + self.failed
    }
}

impl std::fmt::Display for SyncStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} transferred, {} skipped (up-to-date), {} failed",
            self.transferred, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_lookup_ignores_key_case() {
        let info = DestinationObjectInfo::new(None, None, [("SRC-ETag", "\"abc\"")]);
        assert_eq!(info.metadata_value("src-etag"), Some("\"abc\""));
        assert_eq!(info.metadata_value("Src-Etag"), Some("\"abc\""));
        assert!(info.metadata().contains_key("src-etag"));
    }

    #[test]
    fn upload_attributes_omit_absent_headers() {
        let headers = SourceHeaders {
            content_type: Some("application/json".to_string()),
            etag: Some("\"v1\"".to_string()),
            ..SourceHeaders::default()
        };

        let attrs = UploadAttributes::from_headers(&headers);

        assert_eq!(attrs.content_encoding, None);
        assert_eq!(attrs.content_type.as_deref(), Some("application/json"));
        assert_eq!(attrs.metadata.len(), 1);
        assert_eq!(attrs.metadata.get(SRC_ETAG_KEY).map(String::as_str), Some("\"v1\""));
        assert!(!attrs.metadata.contains_key(SRC_LAST_MODIFIED_KEY));
    }

    #[test]
    fn transfer_request_is_private() {
        let request = TransferRequest::new("bucket", "realm/key", &SourceHeaders::default());
        assert_eq!(request.acl, ObjectAcl::Private);
        assert_eq!(request.acl.as_str(), "private");
        assert_eq!(request.location(), "s3://bucket/realm/key");
        assert!(request.attributes.metadata.is_empty());
    }

    #[test]
    fn stats_count_outcomes() {
        let mut stats = SyncStats::default();
        stats.record(SyncOutcome::Skipped);
        stats.record(SyncOutcome::Transferred { bytes: 10 });
        stats.record(SyncOutcome::Transferred { bytes: 0 });
        stats.record_failure();

        assert_eq!(stats.transferred, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total(), 4);
        assert_eq!(
            stats.to_string(),
            "2 transferred, 1 skipped (up-to-date), 1 failed"
        );
    }
}
