#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Conditional mirroring of HTTP resources into S3.
//!
//! [`Mirror::download_url`] copies one source URL to one destination
//! object. Before transferring, it compares the source response headers
//! against the attributes and metadata recorded on the destination the last
//! time it was written (see [`freshness`]), and skips the transfer when they
//! all match.
//!
//! ## Freshness
//!
//! A destination is up to date when `Content-Encoding` and `Content-Type`
//! match the object attributes, and `ETag` / `Last-Modified` match the
//! `src-etag` / `src-last-modified` user metadata. Any doubt (missing
//! object, storage error, differing header) results in a re-transfer.
//!
//! # Environment Variables
//!
//! Read only by [`MirrorConfig::from_env`]:
//!
//! | Variable | Description |
//! |---|---|
//! | `S3_BUCKET` / `AWS_S3_BUCKET` | Default destination bucket |
//! | `AWS_REGION` / `AWS_DEFAULT_REGION` | Destination region (`us-east-1` if nothing else names one) |
//! | `AWS_ENDPOINT_URL` | Endpoint override for S3-compatible services |
//!
//! Credentials are resolved by the AWS SDK default provider chain.

pub mod config;
pub mod freshness;
#[cfg(test)]
mod memory;
pub mod s3;
pub mod source;
pub mod store;
pub mod sync;

pub use config::MirrorConfig;
pub use s3::S3Store;
pub use store::{BodyStream, ObjectStore};
pub use sync::{Destination, Mirror};
pub use url_mirror_models::{
    DestinationObjectInfo, SourceHeaders, SyncOutcome, SyncStats, TransferRequest,
};

/// Errors from the destination object store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `HeadObject` failed with something other than not-found.
    #[error("Failed to head s3://{bucket}/{key}: {source}")]
    HeadObject {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `HeadBucket` failed with something other than not-found.
    #[error("Failed to validate bucket {bucket}: {source}")]
    HeadBucket {
        /// Bucket name.
        bucket: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `CreateBucket` failed.
    #[error("Failed to create bucket {bucket}: {source}")]
    CreateBucket {
        /// Bucket name.
        bucket: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `PutObject` or one of the multipart upload calls failed.
    #[error("Failed to upload s3://{bucket}/{key}: {source}")]
    Upload {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Reading the source body failed mid-upload.
    #[error("Failed to read source body for s3://{bucket}/{key}: {source}")]
    Body {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Underlying read error.
        source: std::io::Error,
    },
}

/// Errors that can occur while mirroring a URL.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// No destination bucket could be resolved.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of what is missing.
        message: String,
    },

    /// Fetching the source failed (connection, DNS, or non-2xx status).
    #[error("Failed to fetch {url}: {source}")]
    Source {
        /// Source URL.
        url: String,
        /// Underlying HTTP error.
        source: reqwest::Error,
    },

    /// The destination store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
