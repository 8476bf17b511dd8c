//! mediasync-sync - Channel feed to store sync job
//!
//! Intended to run from cron. Reads configuration from flags, environment,
//! an optional TOML file and compiled defaults, then performs one sync pass.
//! Logs go to stderr; the dry-run preview or upsert response goes to stdout.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use mediasync_common::config::{
    load_toml_config, Settings, SettingsArgs, SyncConfig, DEFAULT_LOG_LEVEL,
};
use mediasync_common::error::exit_code_for;
use mediasync_common::logging::init_logging;
use mediasync_sync::{run, SyncOutcome};
use tracing::{error, info};

/// Command-line arguments for mediasync-sync
#[derive(Parser, Debug)]
#[command(name = "mediasync-sync")]
#[command(about = "Sync a channel feed into the video table")]
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

    info!("Starting mediasync-sync v{}", env!("CARGO_PKG_VERSION"));
    if let Some(source) = &loaded.source {
        info!(path = %source.display(), "Loaded config file");
    }

    let cli_env = args.settings.into_settings(
        std::env::var("DRY_RUN").ok().as_deref(),
        std::env::var("PERSIST").ok().as_deref(),
        std::env::var("YT_DATA_API_KEY").ok(),
    );

    match sync(cli_env.layered(loaded.config.settings)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn sync(settings: Settings) -> Result<()> {
    let config = SyncConfig::from_settings(&settings)?;
    let report = run(config).await?;

    match &report.outcome {
        SyncOutcome::DryRun => {
            info!("Dry run payload preview follows");
            let preview = serde_json::to_string_pretty(&report.dry_run_preview())
                .context("Failed to render dry-run preview")?;
            println!("{}", preview);
        }
        SyncOutcome::Upserted(response) => {
            println!("HTTP status: {}", response.status);
            let body = serde_json::to_string_pretty(&response.body)
                .context("Failed to render upsert response")?;
            println!("{}", body);
        }
        SyncOutcome::NoItems | SyncOutcome::NothingToWrite => {}
    }

    info!(
        fetched = report.fetched,
        enriched = report.enriched,
        rows = report.rows.len(),
        "Sync finished"
    );
    Ok(())
}
