//! Configuration loading and resolution
//!
//! Values are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 arrive together through [`SettingsArgs`]; tier 3 through
//! [`load_toml_config`]. [`Settings::layered`] merges them, and the typed
//! configs are built once in `main` and handed to each component by value.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CHANNEL_ID: &str = "UCANMUQ39X4PcnUENrxFocbw";
pub const DEFAULT_TABLE: &str = "youtube_videos";
pub const DEFAULT_MIN_DURATION_SECS: u64 = 300;
pub const DEFAULT_FEED_BASE_URL: &str = "https://www.youtube.com";
pub const DEFAULT_METADATA_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Raw, untyped settings from any single source
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub channel_id: Option<String>,
    pub store_url: Option<String>,
    pub store_key: Option<String>,
    pub metadata_api_key: Option<String>,
    pub table: Option<String>,
    pub min_duration: Option<u64>,
    /// 0 means unlimited
    pub limit: Option<usize>,
    pub dry_run: Option<bool>,
    pub feed_base_url: Option<String>,
    pub metadata_base_url: Option<String>,
}

impl Settings {
    /// Fill every unset field from a lower-priority source
    pub fn layered(self, lower: Settings) -> Settings {
        Settings {
            channel_id: self.channel_id.or(lower.channel_id),
            store_url: self.store_url.or(lower.store_url),
            store_key: self.store_key.or(lower.store_key),
            metadata_api_key: self.metadata_api_key.or(lower.metadata_api_key),
            table: self.table.or(lower.table),
            min_duration: self.min_duration.or(lower.min_duration),
            limit: self.limit.or(lower.limit),
            dry_run: self.dry_run.or(lower.dry_run),
            feed_base_url: self.feed_base_url.or(lower.feed_base_url),
            metadata_base_url: self.metadata_base_url.or(lower.metadata_base_url),
        }
    }
}

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// TOML config file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    #[serde(flatten)]
    pub settings: Settings,
    pub logging: LoggingConfig,
}

/// Loaded TOML config and the file it came from
#[derive(Debug, Clone, Default)]
pub struct LoadedToml {
    pub config: TomlConfig,
    pub source: Option<PathBuf>,
}

/// Load the TOML tier.
///
/// An explicit path must exist and parse. Without one, the per-user default
/// file is used when present; a missing or broken default file falls back to
/// compiled defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<LoadedToml> {
    if let Some(path) = explicit {
        let config = read_toml_file(path)?;
        return Ok(LoadedToml {
            config,
            source: Some(path.to_path_buf()),
        });
    }

    match default_config_path() {
        Some(path) if path.exists() => match read_toml_file(&path) {
            Ok(config) => Ok(LoadedToml {
                config,
                source: Some(path),
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable default config file");
                Ok(LoadedToml::default())
            }
        },
        _ => Ok(LoadedToml::default()),
    }
}

/// Per-user default config location (`<config_dir>/mediasync/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mediasync").join("config.toml"))
}

fn read_toml_file(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;
    toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Invalid config file {}: {}", path.display(), e))
    })
}

/// Interpret the `DRY_RUN` / `PERSIST` environment pair.
///
/// `DRY_RUN` in (1, true, yes) or `PERSIST` in (0, false, no) enables dry run.
/// Returns `None` when neither variable is set.
pub fn dry_run_from_env(dry_run: Option<&str>, persist: Option<&str>) -> Option<bool> {
    if dry_run.is_none() && persist.is_none() {
        return None;
    }
    let truthy = |v: &str| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    let falsy = |v: &str| matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no");

    Some(dry_run.is_some_and(truthy) || persist.is_some_and(falsy))
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn valid(value: Option<&String>) -> Option<String> {
    value
        .filter(|v| is_valid_key(v))
        .map(|v| v.trim().to_string())
}

/// Where the feed comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub channel_id: String,
    pub base_url: String,
}

impl FeedConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let channel_id = match &settings.channel_id {
            Some(id) => valid(Some(id)).ok_or_else(|| {
                Error::Config("Channel id is empty; set YT_CHANNEL_ID or --channel-id".to_string())
            })?,
            None => DEFAULT_CHANNEL_ID.to_string(),
        };
        Ok(Self {
            channel_id,
            base_url: base_url(settings.feed_base_url.as_ref(), DEFAULT_FEED_BASE_URL),
        })
    }
}

/// Remote table access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Project URL without trailing slash
    pub url: String,
    pub service_key: String,
    pub table: String,
}

impl StoreConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        match (valid(settings.store_url.as_ref()), valid(settings.store_key.as_ref())) {
            (Some(url), Some(service_key)) => Ok(Self {
                url: url.trim_end_matches('/').to_string(),
                service_key,
                table: valid(settings.table.as_ref()).unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            }),
            _ => Err(Error::Config(
                "Set SUPABASE_URL and SUPABASE_SERVICE_ROLE_KEY environment variables".to_string(),
            )),
        }
    }
}

/// Metadata API access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataConfig {
    pub api_key: String,
    pub base_url: String,
}

impl MetadataConfig {
    /// `None` when no usable API key is configured
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        valid(settings.metadata_api_key.as_ref()).map(|api_key| Self {
            api_key,
            base_url: base_url(settings.metadata_base_url.as_ref(), DEFAULT_METADATA_BASE_URL),
        })
    }
}

fn base_url(value: Option<&String>, default: &str) -> String {
    valid(value)
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Everything the sync job needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub feed: FeedConfig,
    pub store: StoreConfig,
    /// Enrichment is skipped when absent
    pub metadata: Option<MetadataConfig>,
    pub min_duration_secs: u64,
    /// `None` means all feed entries
    pub limit: Option<usize>,
    pub dry_run: bool,
}

impl SyncConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = StoreConfig::from_settings(settings)?;
        Ok(Self {
            feed: FeedConfig::from_settings(settings)?,
            store,
            metadata: MetadataConfig::from_settings(settings),
            min_duration_secs: settings.min_duration.unwrap_or(DEFAULT_MIN_DURATION_SECS),
            limit: settings.limit.filter(|&n| n > 0),
            dry_run: settings.dry_run.unwrap_or(false),
        })
    }
}

/// Everything the duration backfill job needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
    pub store: StoreConfig,
    pub metadata: MetadataConfig,
    pub dry_run: bool,
}

impl BackfillConfig {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store = StoreConfig::from_settings(settings)?;
        let metadata = MetadataConfig::from_settings(settings).ok_or_else(|| {
            Error::Config(
                "Missing YOUTUBE_DATA_API_KEY in environment; cannot fetch durations".to_string(),
            )
        })?;
        Ok(Self {
            store,
            metadata,
            dry_run: settings.dry_run.unwrap_or(false),
        })
    }
}

/// Command-line and environment tiers shared by the sync and backfill binaries
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SettingsArgs {
    /// TOML config file
    #[arg(long, env = "MEDIASYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Channel whose feed is read
    #[arg(long, env = "YT_CHANNEL_ID")]
    pub channel_id: Option<String>,

    /// Store project URL, e.g. https://xyz.supabase.co
    #[arg(long, env = "SUPABASE_URL")]
    pub store_url: Option<String>,

    /// Store service credential
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub store_key: Option<String>,

    /// Metadata API key (also read from YT_DATA_API_KEY)
    #[arg(long, env = "YOUTUBE_DATA_API_KEY", hide_env_values = true)]
    pub metadata_api_key: Option<String>,

    /// Store table name
    #[arg(long, env = "MEDIASYNC_TABLE")]
    pub table: Option<String>,

    /// Minimum duration in seconds for videos with a known duration
    #[arg(long, env = "MIN_DURATION")]
    pub min_duration: Option<u64>,

    /// Maximum number of feed entries to process (0 = all)
    #[arg(long, env = "LIMIT")]
    pub limit: Option<usize>,

    /// Do everything except the final write and print the payload
    #[arg(long)]
    pub dry_run: bool,

    /// Feed host override
    #[arg(long, env = "MEDIASYNC_FEED_BASE_URL")]
    pub feed_base_url: Option<String>,

    /// Metadata API base override
    #[arg(long, env = "MEDIASYNC_METADATA_BASE_URL")]
    pub metadata_base_url: Option<String>,
}

impl SettingsArgs {
    /// Convert to the highest-priority settings tier.
    ///
    /// `env_dry_run` and `env_persist` are the raw `DRY_RUN` / `PERSIST`
    /// values; `env_api_key_alias` is `YT_DATA_API_KEY`.
    pub fn into_settings(
        self,
        env_dry_run: Option<&str>,
        env_persist: Option<&str>,
        env_api_key_alias: Option<String>,
    ) -> Settings {
        let dry_run = if self.dry_run {
            Some(true)
        } else {
            dry_run_from_env(env_dry_run, env_persist)
        };

        Settings {
            channel_id: self.channel_id,
            store_url: self.store_url,
            store_key: self.store_key,
            metadata_api_key: self.metadata_api_key.or(env_api_key_alias),
            table: self.table,
            min_duration: self.min_duration,
            limit: self.limit,
            dry_run,
            feed_base_url: self.feed_base_url,
            metadata_base_url: self.metadata_base_url,
        }
    }
}
