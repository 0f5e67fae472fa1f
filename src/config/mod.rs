mod file_config;

pub use file_config::{FileConfig, ReconcilerConfig};

use anyhow::{bail, Result};
use chrono::Duration;
use std::path::PathBuf;

use crate::reconciler::DEFAULT_ARTIST_MAX_AGE_DAYS;

pub const DEFAULT_METADATA_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_REPORT_CAPACITY: usize = 256;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub metadata_url: Option<String>,
    pub metadata_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub metadata_url: Option<String>,
    pub metadata_timeout_sec: u64,

    pub reconciler: ReconcilerSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let metadata_url = file.metadata_url.or_else(|| cli.metadata_url.clone());
        let metadata_timeout_sec = file
            .metadata_timeout_sec
            .unwrap_or(cli.metadata_timeout_sec);

        let reconciler_file = file.reconciler.unwrap_or_default();
        let artist_max_age_days = reconciler_file
            .artist_max_age_days
            .unwrap_or(DEFAULT_ARTIST_MAX_AGE_DAYS);
        if artist_max_age_days < 0 {
            bail!(
                "reconciler.artist_max_age_days must not be negative, got {}",
                artist_max_age_days
            );
        }
        let Some(artist_max_age) = Duration::try_days(artist_max_age_days) else {
            bail!(
                "reconciler.artist_max_age_days is out of range, got {}",
                artist_max_age_days
            );
        };
        let reconciler = ReconcilerSettings {
            // Nothing to reconcile against without a metadata service
            enabled: metadata_url.is_some() && reconciler_file.enabled.unwrap_or(true),
            artist_max_age,
            report_capacity: reconciler_file
                .report_capacity
                .unwrap_or(DEFAULT_REPORT_CAPACITY),
        };

        Ok(Self {
            db_dir,
            metadata_url,
            metadata_timeout_sec,
            reconciler,
        })
    }

    pub fn library_db_path(&self) -> PathBuf {
        self.db_dir.join("library.db")
    }

    pub fn preferences_db_path(&self) -> PathBuf {
        self.db_dir.join("preferences.db")
    }
}

#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    pub enabled: bool, // false without metadata_url
    pub artist_max_age: Duration,
    pub report_capacity: usize,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            artist_max_age: Duration::days(DEFAULT_ARTIST_MAX_AGE_DAYS),
            report_capacity: DEFAULT_REPORT_CAPACITY,
        }
    }
}
