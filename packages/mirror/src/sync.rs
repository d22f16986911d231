//! One URL to one destination object.

use std::time::Instant;

use url_mirror_models::{SyncOutcome, TransferRequest};

use crate::{MirrorConfig, MirrorError, ObjectStore, S3Store, freshness, source};

/// Where a single sync writes to. Unset fields fall back to the
/// [`MirrorConfig`] the [`Mirror`] was built with.
#[derive(Default, Clone, Copy)]
pub struct Destination<'a> {
    /// Destination bucket.
    pub bucket: Option<&'a str>,
    /// Destination region, used only when a store has to be built.
    pub region: Option<&'a str>,
    /// Store to use instead of building an S3 client.
    pub store: Option<&'a dyn ObjectStore>,
}

impl<'a> Destination<'a> {
    /// Targets an existing store.
    #[must_use]
    pub fn store(store: &'a dyn ObjectStore) -> Self {
        Self {
            store: Some(store),
            ..Self::default()
        }
    }

    /// Sets the destination bucket.
    #[must_use]
    pub const fn bucket(mut self, bucket: &'a str) -> Self {
        self.bucket = Some(bucket);
        self
    }
}

/// Conditionally copies source URLs into object storage.
pub struct Mirror {
    http: reqwest::Client,
    config: MirrorConfig,
}

impl Mirror {
    /// Creates a mirror with a default HTTP client.
    #[must_use]
    pub fn new(config: MirrorConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    /// Creates a mirror that fetches sources with `http`.
    #[must_use]
    pub const fn with_http_client(config: MirrorConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    /// The fallback destination configuration.
    #[must_use]
    pub const fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Copies `url` to `key` unless the destination already holds the
    /// current version.
    ///
    /// The bucket is resolved before anything touches the network. A missing
    /// bucket is created. The source body is streamed straight into the
    /// store and this only returns once the store has acknowledged the
    /// whole object.
    ///
    /// # Errors
    ///
    /// * [`MirrorError::Configuration`] if no bucket is given or configured.
    /// * [`MirrorError::Source`] if the source can't be fetched.
    /// * [`MirrorError::Store`] if the bucket probe fails for a reason other
    ///   than not-found, or bucket creation or the upload fails.
    pub async fn download_url(
        &self,
        url: &str,
        key: &str,
        destination: Destination<'_>,
    ) -> Result<SyncOutcome, MirrorError> {
        let bucket = self.config.resolve_bucket(destination.bucket)?;

        let built;
        let store: &dyn ObjectStore = if let Some(store) = destination.store {
            store
        } else {
            let config = self.config.with_overrides(None, destination.region);
            built = S3Store::from_config(&config).await;
            &built
        };

        ensure_bucket(store, &bucket).await?;

        log::info!("Checking metadata on {url}...");
        let start = Instant::now();
        let source = source::probe(&self.http, url).await?;
        log::info!(
            "Fetched metadata on {url} ({} ms)",
            start.elapsed().as_millis()
        );

        if freshness::is_up_to_date(&source.headers, store, &bucket, key).await {
            drop(source);
            log::info!("Skipping download of {url} to s3://{bucket}/{key} (up-to-date)");
            return Ok(SyncOutcome::Skipped);
        }

        let request = TransferRequest::new(bucket, key, &source.headers);
        let location = request.location();

        log::info!("Beginning download of {url} to {location}...");
        let start = Instant::now();
        let bytes = store.upload(&request, source.into_body()).await?;
        log::info!(
            "Download of {url} to {location} complete ({bytes} bytes, {} ms)",
            start.elapsed().as_millis()
        );

        Ok(SyncOutcome::Transferred { bytes })
    }
}

/// Creates `bucket` if a probe reports it missing. Other probe failures are
/// returned as-is.
async fn ensure_bucket(store: &dyn ObjectStore, bucket: &str) -> Result<(), MirrorError> {
    log::info!("Validating existence of bucket {bucket}...");
    let start = Instant::now();
    if store.bucket_exists(bucket).await? {
        log::info!(
            "Bucket {bucket} exists ({} ms)",
            start.elapsed().as_millis()
        );
        return Ok(());
    }

    log::info!("Creating bucket {bucket}...");
    let start = Instant::now();
    store.create_bucket(bucket).await?;
    log::info!(
        "Created bucket {bucket} ({} ms)",
        start.elapsed().as_millis()
    );
    Ok(())
}
