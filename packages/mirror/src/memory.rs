//! In-memory [`ObjectStore`] used by the tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::TryStreamExt as _;
use url_mirror_models::{DestinationObjectInfo, TransferRequest};

use crate::{BodyStream, ObjectStore, StoreError};

/// A stored object: its recorded attributes and body.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub info: DestinationObjectInfo,
    pub data: Vec<u8>,
}

#[derive(Default)]
struct State {
    buckets: BTreeSet<String>,
    objects: BTreeMap<(String, String), StoredObject>,
    uploads: Vec<TransferRequest>,
    upload_calls: usize,
    buckets_created: Vec<String>,
    bucket_probes: usize,
    fail_head_object: bool,
    fail_head_bucket: bool,
}

/// Records every call so tests can assert on what a sync did.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::default();
        store.lock().buckets.insert(bucket.to_string());
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn insert_object(&self, bucket: &str, key: &str, info: DestinationObjectInfo, data: Vec<u8>) {
        self.lock().objects.insert(
            (bucket.to_string(), key.to_string()),
            StoredObject { info, data },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.lock()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn uploads(&self) -> Vec<TransferRequest> {
        self.lock().uploads.clone()
    }

    /// Upload attempts, including ones that failed.
    pub fn upload_calls(&self) -> usize {
        self.lock().upload_calls
    }

    pub fn buckets_created(&self) -> Vec<String> {
        self.lock().buckets_created.clone()
    }

    pub fn bucket_probes(&self) -> usize {
        self.lock().bucket_probes
    }

    pub fn fail_head_object(&self) {
        self.lock().fail_head_object = true;
    }

    pub fn fail_head_bucket(&self) {
        self.lock().fail_head_bucket = true;
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<DestinationObjectInfo>, StoreError> {
        let state = self.lock();
        if state.fail_head_object {
            return Err(StoreError::HeadObject {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source: "access denied".into(),
            });
        }
        Ok(state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.info.clone()))
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        let mut state = self.lock();
        state.bucket_probes += 1;
        if state.fail_head_bucket {
            return Err(StoreError::HeadBucket {
                bucket: bucket.to_string(),
                source: "forbidden".into(),
            });
        }
        Ok(state.buckets.contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.buckets.insert(bucket.to_string());
        state.buckets_created.push(bucket.to_string());
        Ok(())
    }

    async fn upload(
        &self,
        request: &TransferRequest,
        body: BodyStream,
    ) -> Result<u64, StoreError> {
        self.lock().upload_calls += 1;
        let chunks: Vec<bytes::Bytes> =
            body.try_collect().await.map_err(|source| StoreError::Body {
                bucket: request.bucket.clone(),
                key: request.key.clone(),
                source,
            })?;
        let data = chunks.concat();
        let len = data.len() as u64;

        let attrs = &request.attributes;
        let info = DestinationObjectInfo::new(
            attrs.content_encoding.clone(),
            attrs.content_type.clone(),
            attrs.metadata.clone(),
        );

        let mut state = self.lock();
        if !state.buckets.contains(&request.bucket) {
            return Err(StoreError::Upload {
                bucket: request.bucket.clone(),
                key: request.key.clone(),
                source: "no such bucket".into(),
            });
        }
        state.uploads.push(request.clone());
        state.objects.insert(
            (request.bucket.clone(), request.key.clone()),
            StoredObject { info, data },
        );
        Ok(len)
    }
}
