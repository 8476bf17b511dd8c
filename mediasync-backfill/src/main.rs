//! mediasync-backfill - Fill in missing video durations
//!
//! Queries the store for rows without a duration, looks each one up in the
//! metadata API and patches it. Requires store credentials and a metadata
//! API key.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use mediasync_backfill::run;
use mediasync_common::config::{
    load_toml_config, BackfillConfig, Settings, SettingsArgs, DEFAULT_LOG_LEVEL,
};
use mediasync_common::error::exit_code_for;
use mediasync_common::logging::init_logging;
use tracing::{error, info};

/// Command-line arguments for mediasync-backfill
#[derive(Parser, Debug)]
#[command(name = "mediasync-backfill")]
#[command(about = "Backfill missing video durations in the video table")]
#[command(version)]
struct Args {
    #[command(flatten)]
    settings: SettingsArgs,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loaded = match load_toml_config(args.settings.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            init_logging(DEFAULT_LOG_LEVEL);
            error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };
    init_logging(&loaded.config.logging.level);

    info!("Starting mediasync-backfill v{}", env!("CARGO_PKG_VERSION"));

    let settings = args
        .settings
        .into_settings(
            std::env::var("DRY_RUN").ok().as_deref(),
            std::env::var("PERSIST").ok().as_deref(),
            std::env::var("YT_DATA_API_KEY").ok(),
        )
        .layered(loaded.config.settings);

    match backfill(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn backfill(settings: Settings) -> Result<()> {
    let config = BackfillConfig::from_settings(&settings)?;
    let report = run(config).await?;
    info!(
        candidates = report.candidates,
        updated = report.updated,
        no_op = report.no_op,
        missing_duration = report.missing_duration,
        failed = report.failed,
        skipped = report.skipped,
        "Backfill finished"
    );
    Ok(())
}
