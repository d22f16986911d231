//! [`ObjectStore`] backed by the AWS SDK for S3.
//!
//! Bodies smaller than one part go up in a single `PutObject`. Anything
//! larger is sent as a multipart upload, one part at a time, so memory use
//! stays bounded by [`PART_SIZE`] regardless of the object size. A failed
//! multipart upload is aborted so no orphaned parts are left behind.
//!
//! S3 caps a multipart upload at 10,000 parts, so with a fixed [`PART_SIZE`]
//! the largest object this backend can store is about 78 GiB.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::StalledStreamProtectionConfig;
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CompletedMultipartUpload, CompletedPart, CreateBucketConfiguration,
    ObjectCannedAcl,
};
use futures::StreamExt as _;
use url_mirror_models::{DestinationObjectInfo, ObjectAcl, TransferRequest};

use crate::{BodyStream, MirrorConfig, ObjectStore, StoreError};

/// Multipart part size. S3 requires at least 5 MiB for every part but the
/// last.
pub const PART_SIZE: usize = 8 * 1024 * 1024;

/// Region S3 creates buckets in when no location constraint is sent.
const DEFAULT_BUCKET_REGION: &str = "us-east-1";

/// S3 destination store.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    /// Wraps an existing SDK client.
    #[must_use]
    pub const fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Builds a client from the SDK default chain, applying the configured
    /// region and endpoint override. Falls back to `us-east-1` when neither
    /// the configuration nor the SDK chain names a region.
    pub async fn from_config(config: &MirrorConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared)
            .region(region_or_default(shared.region()))
            .stalled_stream_protection(StalledStreamProtectionConfig::disabled());
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self::new(aws_sdk_s3::Client::from_conf(builder.build()))
    }

    /// Region buckets are created in, if the client has one that needs an
    /// explicit location constraint.
    fn location_constraint(&self) -> Option<BucketLocationConstraint> {
        let region = self.client.config().region()?.to_string();
        (region != DEFAULT_BUCKET_REGION).then(|| BucketLocationConstraint::from(region.as_str()))
    }

    /// Sends a whole body in one `PutObject`.
    async fn put_single(&self, request: &TransferRequest, data: Vec<u8>) -> Result<(), StoreError> {
        let attrs = &request.attributes;

        self.client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .acl(canned_acl(request.acl))
            .set_content_encoding(attrs.content_encoding.clone())
            .set_content_type(attrs.content_type.clone())
            .set_metadata(metadata_map(request))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| upload_error(request, e))?;

        Ok(())
    }

    /// Runs a multipart upload starting with the already-read `first` part.
    async fn put_multipart(
        &self,
        request: &TransferRequest,
        first: Vec<u8>,
        body: &mut BodyStream,
    ) -> Result<u64, StoreError> {
        let attrs = &request.attributes;

        let created = self
            .client
            .create_multipart_upload()
            .bucket(&request.bucket)
            .key(&request.key)
            .acl(canned_acl(request.acl))
            .set_content_encoding(attrs.content_encoding.clone())
            .set_content_type(attrs.content_type.clone())
            .set_metadata(metadata_map(request))
            .send()
            .await
            .map_err(|e| upload_error(request, e))?;

        let upload_id = created
            .upload_id()
            .ok_or_else(|| upload_error(request, "CreateMultipartUpload returned no upload id"))?
            .to_string();

        match self.send_parts(request, &upload_id, first, body).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(&request.bucket)
                    .key(&request.key)
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    log::warn!(
                        "Failed to abort multipart upload {upload_id} for {}: {abort_err}",
                        request.location()
                    );
                }
                Err(e)
            }
        }
    }

    /// Uploads every part and completes the upload.
    async fn send_parts(
        &self,
        request: &TransferRequest,
        upload_id: &str,
        first: Vec<u8>,
        body: &mut BodyStream,
    ) -> Result<u64, StoreError> {
        let mut parts = Vec::new();
        let mut total = 0u64;
        let mut part = first;

        loop {
            let len = part.len();
            let part_number = i32::try_from(parts.len() + 1)
                .map_err(|e| upload_error(request, e))?;

            let output = self
                .client
                .upload_part()
                .bucket(&request.bucket)
                .key(&request.key)
                .upload_id(upload_id)
                .part_number(part_number)
                .body(ByteStream::from(part))
                .send()
                .await
                .map_err(|e| upload_error(request, e))?;

            parts.push(
                CompletedPart::builder()
                    .set_e_tag(output.e_tag().map(String::from))
                    .part_number(part_number)
                    .build(),
            );
            total += len as u64;
            log::debug!("  part {part_number} uploaded ({len} bytes, {total} total)");

            if len < PART_SIZE {
                break;
            }
            part = read_part(body, PART_SIZE)
                .await
                .map_err(|e| body_error(request, e))?;
            if part.is_empty() {
                break;
            }
        }

        self.client
            .complete_multipart_upload()
            .bucket(&request.bucket)
            .key(&request.key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await
            .map_err(|e| upload_error(request, e))?;

        Ok(total)
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<DestinationObjectInfo>, StoreError> {
        let result = self.client.head_object().bucket(bucket).key(key).send().await;

        match result {
            Ok(output) => {
                let metadata = output.metadata().cloned().unwrap_or_default();
                Ok(Some(DestinationObjectInfo::new(
                    output.content_encoding().map(String::from),
                    output.content_type().map(String::from),
                    metadata,
                )))
            }
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(HeadObjectError::is_not_found)
                {
                    return Ok(None);
                }
                Err(StoreError::HeadObject {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(HeadBucketError::is_not_found)
                {
                    return Ok(false);
                }
                Err(StoreError::HeadBucket {
                    bucket: bucket.to_string(),
                    source: Box::new(err),
                })
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let configuration = self.location_constraint().map(|constraint| {
            CreateBucketConfiguration::builder()
                .location_constraint(constraint)
                .build()
        });

        let result = self
            .client
            .create_bucket()
            .bucket(bucket)
            .set_create_bucket_configuration(configuration)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(CreateBucketError::is_bucket_already_owned_by_you) =>
            {
                log::info!("Bucket {bucket} was created concurrently");
                Ok(())
            }
            Err(err) => Err(StoreError::CreateBucket {
                bucket: bucket.to_string(),
                source: Box::new(err),
            }),
        }
    }

    async fn upload(
        &self,
        request: &TransferRequest,
        mut body: BodyStream,
    ) -> Result<u64, StoreError> {
        let first = read_part(&mut body, PART_SIZE)
            .await
            .map_err(|e| body_error(request, e))?;

        if first.len() < PART_SIZE {
            let len = first.len() as u64;
            self.put_single(request, first).await?;
            return Ok(len);
        }

        self.put_multipart(request, first, &mut body).await
    }
}

fn region_or_default(loaded: Option<&Region>) -> Region {
    loaded.cloned().unwrap_or_else(|| {
        log::debug!("No AWS region configured, using {DEFAULT_BUCKET_REGION}");
        Region::from_static(DEFAULT_BUCKET_REGION)
    })
}

/// Reads from `body` until at least `target` bytes are buffered or the
/// stream ends. Returns an empty buffer once the stream is exhausted.
async fn read_part(body: &mut BodyStream, target: usize) -> Result<Vec<u8>, std::io::Error> {
    let mut buf = Vec::with_capacity(target);
    while buf.len() < target {
        match body.next().await {
            Some(chunk) => buf.extend_from_slice(&chunk?),
            None => break,
        }
    }
    Ok(buf)
}

const fn canned_acl(acl: ObjectAcl) -> ObjectCannedAcl {
    match acl {
        ObjectAcl::Private => ObjectCannedAcl::Private,
    }
}

/// User metadata for the SDK, or `None` when there is nothing to set.
fn metadata_map(request: &TransferRequest) -> Option<HashMap<String, String>> {
    let metadata = &request.attributes.metadata;
    if metadata.is_empty() {
        return None;
    }
    Some(
        metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

fn upload_error(
    request: &TransferRequest,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> StoreError {
    StoreError::Upload {
        bucket: request.bucket.clone(),
        key: request.key.clone(),
        source: source.into(),
    }
}

fn body_error(request: &TransferRequest, source: std::io::Error) -> StoreError {
    StoreError::Body {
        bucket: request.bucket.clone(),
        key: request.key.clone(),
        source,
    }
}
