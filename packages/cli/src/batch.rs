//! One scheduled invocation: list the feed, then mirror each snapshot.

use url_mirror::{Destination, Mirror, ObjectStore};
use url_mirror_feed::{FeedError, RecordFeed, object_key};
use url_mirror_models::SyncStats;

/// Mirrors every snapshot the feed lists, in order, under
/// `<realm>/<timestamp>` keys.
///
/// A failing snapshot is logged and counted in [`SyncStats::failed`]; the
/// remaining snapshots are still attempted.
///
/// # Errors
///
/// Returns [`FeedError`] if the feed itself cannot be listed.
pub async fn run_feed(
    mirror: &Mirror,
    feed: &dyn RecordFeed,
    store: &dyn ObjectStore,
    realm: &str,
) -> Result<SyncStats, FeedError> {
    let records = feed.records().await?;
    let mut stats = SyncStats::default();

    for (i, record) in records.iter().enumerate() {
        let key = object_key(realm, &record.last_modified);
        log::info!("[{}/{}] {} -> {key}", i + 1, records.len(), record.url);

        match mirror
            .download_url(&record.url, &key, Destination::store(store))
            .await
        {
            Ok(outcome) => stats.record(outcome),
            Err(e) => {
                log::error!("Failed to mirror {}: {e}", record.url);
                stats.record_failure();
            }
        }
    }

    Ok(stats)
}
