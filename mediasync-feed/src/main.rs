//! mediasync-feed - Print a channel feed as JSON
//!
//! Usage: `mediasync-feed [MAX_ITEMS]` with the channel taken from
//! `--channel-id` or `YT_CHANNEL_ID`. On success prints `{"items": [...]}`;
//! on any failure prints `{"error": "..."}` and exits 1.

use std::process::ExitCode;

use clap::Parser;
use mediasync_common::config::{FeedConfig, Settings, DEFAULT_LOG_LEVEL};
use mediasync_common::logging::init_logging;
use mediasync_common::models::VideoRecord;
use mediasync_common::services::FeedClient;
use mediasync_common::{Error, Result};
use serde::Serialize;
use serde_json::json;

const DEFAULT_MAX_ITEMS: usize = 10;

/// Command-line arguments for mediasync-feed
#[derive(Parser, Debug)]
#[command(name = "mediasync-feed")]
#[command(about = "Print the latest entries of a channel feed as JSON")]
#[command(version)]
struct Args {
    /// Maximum number of entries to print
    #[arg(default_value_t = DEFAULT_MAX_ITEMS)]
    max_items: usize,

    /// Channel whose feed is read
    #[arg(long, env = "YT_CHANNEL_ID")]
    channel_id: Option<String>,

    /// Feed host override
    #[arg(long, env = "MEDIASYNC_FEED_BASE_URL")]
    feed_base_url: Option<String>,
}

/// One printed entry: the record plus its watch URL
#[derive(Debug, Serialize)]
struct FeedItem {
    #[serde(flatten)]
    record: VideoRecord,
    url: String,
}

impl From<VideoRecord> for FeedItem {
    fn from(record: VideoRecord) -> Self {
        let url = record.watch_url();
        Self { record, url }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging(DEFAULT_LOG_LEVEL);
    let args = Args::parse();

    let (output, code) = match read_feed(&args).await {
        Ok(items) => (json!({ "items": items }), ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!("{}", e);
            (json!({ "error": e.to_string() }), ExitCode::FAILURE)
        }
    };

    match serde_json::to_string_pretty(&output) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            tracing::error!("Failed to render output: {}", e);
            return ExitCode::FAILURE;
        }
    }
    code
}

async fn read_feed(args: &Args) -> Result<Vec<FeedItem>> {
    if args.channel_id.is_none() {
        return Err(Error::Config(
            "Set YT_CHANNEL_ID environment variable or pass --channel-id".to_string(),
        ));
    }
    let config = FeedConfig::from_settings(&Settings {
        channel_id: args.channel_id.clone(),
        feed_base_url: args.feed_base_url.clone(),
        ..Default::default()
    })?;

    let records = FeedClient::new(config)?
        .fetch_records(Some(args.max_items))
        .await?;
    Ok(records.into_iter().map(FeedItem::from).collect())
}
