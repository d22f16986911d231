//! The destination storage seam.
//!
//! [`ObjectStore`] is the set of storage operations a sync needs. The S3
//! implementation lives in [`crate::s3`]; tests use an in-memory store.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use url_mirror_models::{DestinationObjectInfo, TransferRequest};

use crate::StoreError;

/// A source body, read chunk by chunk and never buffered whole.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Storage operations used by a sync.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetches an object's attributes and user metadata.
    ///
    /// Returns `None` if the object does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::HeadObject`] on any other failure.
    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<DestinationObjectInfo>, StoreError>;

    /// Probes whether a bucket exists.
    ///
    /// Returns `false` only for a not-found response.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::HeadBucket`] for any other failure (permissions,
    /// connectivity).
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError>;

    /// Creates a bucket. Creating a bucket the caller already owns succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CreateBucket`] on failure.
    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError>;

    /// Streams `body` to the object described by `request` and resolves once
    /// the store has acknowledged the whole object. Returns the number of
    /// bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Upload`] if the store rejects any part of the
    /// upload, or [`StoreError::Body`] if reading `body` fails.
    async fn upload(&self, request: &TransferRequest, body: BodyStream)
    -> Result<u64, StoreError>;
}
