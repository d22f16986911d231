#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Entry point for scheduled mirror runs.
//!
//! `url_mirror run` is what the scheduler invokes: it lists the feed and
//! mirrors each snapshot into the configured bucket. `sync` mirrors a
//! single URL and `records` shows what a run would mirror.
//!
//! Configuration comes from the environment (see
//! [`url_mirror::MirrorConfig::from_env`] and
//! [`url_mirror_feed::FeedConfig::from_env`]); flags override it.

mod batch;

use std::time::Instant;

use clap::{Parser, Subcommand};
use url_mirror::{Destination, Mirror, MirrorConfig, S3Store};
use url_mirror_feed::{FeedConfig, HttpJsonFeed, RecordFeed as _, object_key};

#[derive(Parser)]
#[command(name = "url_mirror", about = "Mirror feed snapshots into S3")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the feed and mirror every snapshot
    Run {
        /// Destination bucket (overrides `S3_BUCKET`)
        #[arg(long)]
        bucket: Option<String>,
        /// Destination region (overrides `AWS_REGION`)
        #[arg(long)]
        region: Option<String>,
        /// Realm to list (overrides `FEED_REALM`)
        #[arg(long)]
        realm: Option<String>,
        /// Locale to list with (overrides `FEED_LOCALE`)
        #[arg(long)]
        locale: Option<String>,
    },
    /// Mirror a single URL to a single key
    Sync {
        /// Source URL
        url: String,
        /// Destination object key
        key: String,
        /// Destination bucket (overrides `S3_BUCKET`)
        #[arg(long)]
        bucket: Option<String>,
        /// Destination region (overrides `AWS_REGION`)
        #[arg(long)]
        region: Option<String>,
    },
    /// List feed snapshots and the keys they would be stored under
    Records {
        /// Realm to list (overrides `FEED_REALM`)
        #[arg(long)]
        realm: Option<String>,
        /// Locale to list with (overrides `FEED_LOCALE`)
        #[arg(long)]
        locale: Option<String>,
    },
}

fn feed_config(realm: Option<String>, locale: Option<String>) -> FeedConfig {
    let mut config = FeedConfig::from_env();
    if let Some(realm) = realm {
        config.realm = realm;
    }
    if let Some(locale) = locale {
        config.locale = locale;
    }
    config
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            bucket,
            region,
            realm,
            locale,
        } => {
            let config =
                MirrorConfig::from_env().with_overrides(bucket.as_deref(), region.as_deref());
            config.resolve_bucket(None)?;

            let feed = HttpJsonFeed::new(feed_config(realm, locale));
            let realm = feed.config().realm.clone();
            let store = S3Store::from_config(&config).await;
            let mirror = Mirror::new(config);

            let start = Instant::now();
            let stats = batch::run_feed(&mirror, &feed, &store, &realm).await?;
            log::info!(
                "Mirror complete: {stats} in {:.1}s",
                start.elapsed().as_secs_f64()
            );

            if stats.failed > 0 {
                return Err(format!("{} of {} snapshot(s) failed", stats.failed, stats.total()).into());
            }
        }
        Commands::Sync {
            url,
            key,
            bucket,
            region,
        } => {
            let mirror = Mirror::new(MirrorConfig::from_env());
            let destination = Destination {
                bucket: bucket.as_deref(),
                region: region.as_deref(),
                store: None,
            };
            let outcome = mirror.download_url(&url, &key, destination).await?;
            println!("{url} -> {key}: {outcome}");
        }
        Commands::Records { realm, locale } => {
            let feed = HttpJsonFeed::new(feed_config(realm, locale));
            let records = feed.records().await?;
            println!("{:<34} URL", "KEY");
            println!("{}", "-".repeat(80));
            for record in &records {
                println!(
                    "{:<34} {}",
                    object_key(&feed.config().realm, &record.last_modified),
                    record.url
                );
            }
        }
    }

    Ok(())
}
