//! Sync job orchestration

use std::collections::HashMap;

use anyhow::{Context, Result};
use mediasync_common::config::SyncConfig;
use mediasync_common::filter::{merge_details, retain_min_duration};
use mediasync_common::models::StoreRow;
use mediasync_common::services::{FeedClient, MetadataClient, StoreClient, UpsertResponse};
use tracing::{info, warn};

/// Rows included in a dry-run preview
pub const DRY_RUN_PREVIEW_ROWS: usize = 20;

/// Sample ids logged before the write
const SAMPLE_IDS: usize = 10;

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The feed had no usable entries
    NoItems,
    /// Every entry was filtered out
    NothingToWrite,
    /// Rows were prepared but not sent
    DryRun,
    Upserted(UpsertResponse),
}

/// Summary of one sync run
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    /// Entries extracted from the feed (after `limit`)
    pub fetched: usize,
    /// Entries the metadata API recognized
    pub enriched: usize,
    /// Rows prepared for the store
    pub rows: Vec<StoreRow>,
    pub outcome: SyncOutcome,
}

impl SyncReport {
    /// JSON printed for a dry run: the first rows under `"rows"`
    pub fn dry_run_preview(&self) -> serde_json::Value {
        let preview: Vec<&StoreRow> = self.rows.iter().take(DRY_RUN_PREVIEW_ROWS).collect();
        serde_json::json!({ "rows": preview })
    }
}

/// Run one sync pass.
///
/// Nothing is written when `config.dry_run` is set. A failed metadata batch
/// leaves those durations unknown; a failed feed fetch or upsert ends the run.
pub async fn run(config: SyncConfig) -> Result<SyncReport> {
    let feed = FeedClient::new(config.feed.clone())?;
    info!(channel_id = %config.feed.channel_id, "Fetching channel feed");

    let records = feed
        .fetch_records(config.limit)
        .await
        .context("Failed to fetch channel feed")?;
    let fetched = records.len();
    info!(count = fetched, "Fetched feed entries");

    if records.is_empty() {
        info!("No items found in feed");
        return Ok(SyncReport {
            fetched,
            enriched: 0,
            rows: Vec::new(),
            outcome: SyncOutcome::NoItems,
        });
    }

    let details = match &config.metadata {
        Some(metadata) => {
            let ids: Vec<String> = records.iter().map(|r| r.video_id.clone()).collect();
            info!(ids = ids.len(), "Enriching with metadata API");
            MetadataClient::new(metadata.clone())?
                .fetch_details(&ids)
                .await
        }
        None => {
            warn!("No metadata API key configured; durations unknown, filter keeps every video");
            HashMap::new()
        }
    };
    let enriched = records
        .iter()
        .filter(|r| details.contains_key(&r.video_id))
        .count();

    let merged = merge_details(records, &details);
    let retained = retain_min_duration(merged, config.min_duration_secs);
    let rows: Vec<StoreRow> = retained.iter().map(StoreRow::from).collect();
    info!(
        fetched,
        retained = rows.len(),
        min_duration_secs = config.min_duration_secs,
        "Applied duration filter"
    );

    if rows.is_empty() {
        info!("No rows to upsert after filtering");
        return Ok(SyncReport {
            fetched,
            enriched,
            rows,
            outcome: SyncOutcome::NothingToWrite,
        });
    }

    let sample: Vec<&str> = rows
        .iter()
        .take(SAMPLE_IDS)
        .map(|r| r.video_id.as_str())
        .collect();
    info!(rows = rows.len(), sample_ids = ?sample, "Prepared rows for upsert");

    if config.dry_run {
        info!("Dry run enabled, skipping upsert");
        return Ok(SyncReport {
            fetched,
            enriched,
            rows,
            outcome: SyncOutcome::DryRun,
        });
    }

    let store = StoreClient::new(config.store.clone())?;
    info!(rows = rows.len(), table = %config.store.table, "Upserting rows");
    let response = store
        .upsert(&rows)
        .await
        .context("Failed to upsert rows")?;
    info!(status = response.status, echoed = ?response.row_count(), "Upsert complete");

    Ok(SyncReport {
        fetched,
        enriched,
        rows,
        outcome: SyncOutcome::Upserted(response),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> StoreRow {
        StoreRow {
            video_id: id.to_string(),
            title: None,
            description: None,
            thumbnail_url: None,
            published_at: None,
            duration: None,
            duration_seconds: None,
        }
    }

    #[test]
    fn test_dry_run_preview_is_capped() {
        let report = SyncReport {
            fetched: 25,
            enriched: 0,
            rows: (0..25).map(|i| row(&format!("v{}", i))).collect(),
            outcome: SyncOutcome::DryRun,
        };

        let preview = report.dry_run_preview();
        let rows = preview["rows"].as_array().unwrap();
        assert_eq!(rows.len(), DRY_RUN_PREVIEW_ROWS);
        assert_eq!(rows[0]["video_id"], "v0");
        assert!(rows[0]["duration"].is_null());
    }
}
