//! Decides whether a destination object is current with its source.
//!
//! The comparison errs toward re-transferring: a missing destination, a
//! storage error, or any differing header means "not up to date".
//! `Last-Modified` is compared as opaque text, so two spellings of the same
//! instant count as a change.

use url_mirror_models::{
    DestinationObjectInfo, SRC_ETAG_KEY, SRC_LAST_MODIFIED_KEY, SourceHeaders,
};

use crate::ObjectStore;

/// Compares a source header with a destination object attribute.
///
/// Equal when both are absent, or both present and byte-for-byte equal.
#[must_use]
pub fn field_equal(header: Option<&str>, attribute: Option<&str>) -> bool {
    header == attribute
}

/// Compares a source header with a destination user-metadata entry, looked
/// up by lower-cased `key`.
#[must_use]
pub fn meta_equal(header: Option<&str>, info: &DestinationObjectInfo, key: &str) -> bool {
    field_equal(header, info.metadata_value(key))
}

/// Returns `true` only if all four recorded values match the source.
#[must_use]
pub fn headers_match(source: &SourceHeaders, dest: &DestinationObjectInfo) -> bool {
    field_equal(
        source.content_encoding.as_deref(),
        dest.content_encoding.as_deref(),
    ) && field_equal(source.content_type.as_deref(), dest.content_type.as_deref())
        && meta_equal(source.etag.as_deref(), dest, SRC_ETAG_KEY)
        && meta_equal(source.last_modified.as_deref(), dest, SRC_LAST_MODIFIED_KEY)
}

/// Checks whether `s3://bucket/key` already holds the current source.
///
/// Never fails: a missing object or any store error yields `false`.
pub async fn is_up_to_date(
    source: &SourceHeaders,
    store: &dyn ObjectStore,
    bucket: &str,
    key: &str,
) -> bool {
    match store.head_object(bucket, key).await {
        Ok(Some(dest)) => headers_match(source, &dest),
        Ok(None) => {
            log::debug!("s3://{bucket}/{key} does not exist yet");
            false
        }
        Err(e) => {
            log::warn!("Could not read s3://{bucket}/{key}, assuming stale: {e}");
            false
        }
    }
}
