//! Background repair of cached remote metadata.
//!
//! Reconcilers observe the lists emitted by library views. Every stale entity
//! in a list is fetched from the metadata provider and written back in a
//! single store transaction. Results go to a broadcast report channel and to
//! the logs, never to the views.

mod album;
mod artist;
mod report;
mod runner;

pub use album::AlbumReconciler;
pub use artist::{ArtistReconciler, DEFAULT_ARTIST_MAX_AGE_DAYS};
pub use report::{EntityKind, PassSummary, ReconcileError, ReconcileEvent, ReconcileOutcome};
pub use runner::{ReconcileRunner, StalenessReconciler, DEFAULT_REFRESH_COOLDOWN_MINUTES};

use chrono::Duration;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::library::{Album, Artist, LibraryMutation, LibraryStore};
use crate::metadata::MetadataProvider;

/// Apply a mutation on the blocking pool.
pub(crate) async fn write_mutation(
    store: &Arc<dyn LibraryStore>,
    mutation: LibraryMutation,
) -> Result<(), ReconcileError> {
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || store.apply(mutation))
        .await
        .map_err(|e| ReconcileError::Join(e.to_string()))?
        .map_err(|e| ReconcileError::Write(format!("{:#}", e)))
}

/// The artist and album reconcilers sharing one report channel.
pub struct Reconcilers {
    artists: Arc<ReconcileRunner<ArtistReconciler>>,
    albums: Arc<ReconcileRunner<AlbumReconciler>>,
    reports: broadcast::Sender<ReconcileEvent>,
}

impl Reconcilers {
    pub fn new(
        store: Arc<dyn LibraryStore>,
        provider: Arc<dyn MetadataProvider>,
        artist_max_age: Duration,
        report_capacity: usize,
    ) -> Self {
        let (reports, _) = broadcast::channel(report_capacity.max(1));
        let artists = ArtistReconciler::new(store.clone(), provider.clone(), artist_max_age);
        let albums = AlbumReconciler::new(store, provider);
        Self {
            artists: Arc::new(ReconcileRunner::new(artists, reports.clone())),
            albums: Arc::new(ReconcileRunner::new(albums, reports.clone())),
            reports,
        }
    }

    pub fn subscribe_reports(&self) -> broadcast::Receiver<ReconcileEvent> {
        self.reports.subscribe()
    }

    pub fn attach_artists(&self, view: watch::Receiver<Arc<Vec<Artist>>>) -> JoinHandle<()> {
        self.artists.attach(view)
    }

    pub fn attach_albums(&self, view: watch::Receiver<Arc<Vec<Album>>>) -> JoinHandle<()> {
        self.albums.attach(view)
    }

    pub fn artists(&self) -> &Arc<ReconcileRunner<ArtistReconciler>> {
        &self.artists
    }

    pub fn albums(&self) -> &Arc<ReconcileRunner<AlbumReconciler>> {
        &self.albums
    }
}
