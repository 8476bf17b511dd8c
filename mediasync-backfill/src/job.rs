//! Duration backfill orchestration

use anyhow::{Context, Result};
use mediasync_common::config::BackfillConfig;
use mediasync_common::duration::format_duration_text;
use mediasync_common::services::metadata_client::DURATION_PARTS;
use mediasync_common::services::{MetadataClient, PatchOutcome, StoreClient};
use tracing::{error, info, warn};

/// Counts from one backfill run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    /// Rows the store reported as missing a duration
    pub candidates: usize,
    /// Rows the store confirmed as patched
    pub updated: usize,
    /// Patches that matched no row
    pub no_op: usize,
    /// Ids the API did not return, or returned without a duration
    pub missing_duration: usize,
    /// Patches the store rejected
    pub failed: usize,
    /// Patches skipped because of dry run
    pub skipped: usize,
}

/// Run one backfill pass.
///
/// Fails only when the missing-duration query fails (after its single
/// retry). Per-row patch failures are logged and counted.
pub async fn run(config: BackfillConfig) -> Result<BackfillReport> {
    let store = StoreClient::new(config.store.clone())?;
    let metadata = MetadataClient::new(config.metadata.clone())?.with_parts(DURATION_PARTS);

    info!("Fetching video ids with missing duration");
    let ids = store
        .query_missing_durations()
        .await
        .context("Failed to query rows with missing duration")?;
    info!(count = ids.len(), "Found videos to update");

    let mut report = BackfillReport {
        candidates: ids.len(),
        ..Default::default()
    };
    if ids.is_empty() {
        return Ok(report);
    }

    let details = metadata.fetch_details(&ids).await;

    for video_id in &ids {
        let Some(found) = details.get(video_id) else {
            report.missing_duration += 1;
            continue;
        };
        let Some(duration_iso) = found.duration_iso.as_deref() else {
            warn!(video_id = %video_id, "Missing duration for video");
            report.missing_duration += 1;
            continue;
        };
        let seconds = found.duration_seconds;

        if config.dry_run {
            info!(
                video_id = %video_id,
                duration = %duration_iso,
                seconds,
                "Dry run: would update"
            );
            report.skipped += 1;
            continue;
        }

        match store.patch_duration(video_id, duration_iso, seconds).await {
            Ok(PatchOutcome::Updated(_)) => {
                report.updated += 1;
                info!(
                    "Updated {} -> {} ({}, {}s)",
                    video_id,
                    duration_iso,
                    format_duration_text(seconds),
                    seconds
                );
            }
            Ok(PatchOutcome::NoOp) => {
                report.no_op += 1;
                warn!(video_id = %video_id, "Patch returned no rows");
            }
            Err(e) => {
                report.failed += 1;
                error!(video_id = %video_id, error = %e, "Patch failed");
            }
        }
    }

    info!("Done. Updated {} rows.", report.updated);
    Ok(report)
}
