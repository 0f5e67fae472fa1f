use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pezzottify_library::config::{self, DEFAULT_METADATA_TIMEOUT_SEC};
use pezzottify_library::reconciler::{ReconcileEvent, ReconcileOutcome};
use pezzottify_library::{
    DownloadTracker, HttpMetadataClient, LibraryViews, Reconcilers, SqliteLibraryStore,
    SqlitePreferenceStore,
};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

fn parse_dir(s: &str) -> Result<PathBuf, String> {
    let path = parse_path(s)?;
    if !path.exists() {
        return Err(format!("Directory does not exist: {}", s));
    }
    if !path.is_dir() {
        return Err(format!("Path is not a directory: {}", s));
    }
    Ok(path)
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Directory containing database files (library.db, preferences.db).
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_dir)]
    pub db_dir: Option<PathBuf>,

    /// Base URL of the metadata service. Reconcilers are disabled without it.
    #[clap(long)]
    pub metadata_url: Option<String>,

    /// Timeout in seconds for metadata requests.
    #[clap(long, default_value_t = DEFAULT_METADATA_TIMEOUT_SEC)]
    pub metadata_timeout_sec: u64,
}

impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_dir: args.db_dir.clone(),
            metadata_url: args.metadata_url.clone(),
            metadata_timeout_sec: args.metadata_timeout_sec,
        }
    }
}

/// Log the size of a view every time it changes, until shutdown.
fn log_view<T: Send + Sync + 'static>(
    name: &'static str,
    mut view: watch::Receiver<Arc<Vec<T>>>,
    shutdown: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = view.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let len = view.borrow_and_update().len();
                    info!("{} view: {} items", name, len);
                }
                _ = shutdown.cancelled() => break,
            }
        }
    });
}

fn log_reports(mut reports: broadcast::Receiver<ReconcileEvent>, shutdown: CancellationToken) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = reports.recv() => match event {
                    Ok(ReconcileEvent {
                        kind,
                        entity_id,
                        outcome: ReconcileOutcome::Failed(e),
                    }) => {
                        warn!("Reconcile of {} {} failed: {}", kind, entity_id, e);
                    }
                    Ok(event) => {
                        info!("Reconciled {} {}: {:?}", event.kind, event.entity_id, event.outcome);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Reconcile report listener lagged, {} events skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.cancelled() => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_dir: {:?}", app_config.db_dir);
    info!("  metadata_url: {:?}", app_config.metadata_url);
    info!("  reconciler enabled: {}", app_config.reconciler.enabled);
    info!(
        "  artist max age: {} days",
        app_config.reconciler.artist_max_age.num_days()
    );

    let library_store = Arc::new(SqliteLibraryStore::new(app_config.library_db_path())?);
    let preference_store = Arc::new(SqlitePreferenceStore::new(
        app_config.preferences_db_path(),
    )?);
    let downloads = Arc::new(DownloadTracker::new());

    let shutdown_token = CancellationToken::new();

    let mut views = LibraryViews::new(library_store.clone(), preference_store, downloads);

    match (&app_config.metadata_url, app_config.reconciler.enabled) {
        (Some(url), true) => {
            info!("Metadata service configured at {}", url);
            let provider = Arc::new(HttpMetadataClient::new(
                url.clone(),
                app_config.metadata_timeout_sec,
            )?);
            let reconcilers = Arc::new(Reconcilers::new(
                library_store,
                provider,
                app_config.reconciler.artist_max_age,
                app_config.reconciler.report_capacity,
            ));
            log_reports(reconcilers.subscribe_reports(), shutdown_token.clone());
            views = views.with_reconcilers(reconcilers);
        }
        _ => info!("Reconcilers disabled"),
    }

    let songs = views.songs();
    let artists = views.artists();
    let albums = views.albums();
    let playlists = views.playlists();
    let mix = views.mix();

    log_view("songs", songs.subscribe(), shutdown_token.clone());
    log_view("artists", artists.subscribe(), shutdown_token.clone());
    log_view("albums", albums.subscribe(), shutdown_token.clone());
    log_view("playlists", playlists.playlists.subscribe(), shutdown_token.clone());
    log_view("top songs", playlists.top_songs.subscribe(), shutdown_token.clone());
    log_view("mix artists", mix.artists.subscribe(), shutdown_token.clone());
    log_view("mix albums", mix.albums.subscribe(), shutdown_token.clone());

    info!("Library views running, press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, shutting down");
    shutdown_token.cancel();

    Ok(())
}
