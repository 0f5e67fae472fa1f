use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::report::{EntityKind, ReconcileError, ReconcileOutcome};
use super::runner::StalenessReconciler;
use super::write_mutation;
use crate::library::{Album, LibraryMutation, LibraryStore};
use crate::metadata::MetadataProvider;

/// Completes albums whose page was never fetched (song count 0).
///
/// When the remote reports the album as not found, the local record is
/// deleted. Any other failure leaves it for the next emission.
pub struct AlbumReconciler {
    store: Arc<dyn LibraryStore>,
    provider: Arc<dyn MetadataProvider>,
}

impl AlbumReconciler {
    pub fn new(store: Arc<dyn LibraryStore>, provider: Arc<dyn MetadataProvider>) -> Self {
        Self { store, provider }
    }
}

#[async_trait]
impl StalenessReconciler for AlbumReconciler {
    type Entity = Album;

    fn kind(&self) -> EntityKind {
        EntityKind::Album
    }

    fn entity_id<'a>(&self, entity: &'a Album) -> &'a str {
        &entity.id
    }

    fn is_stale(&self, album: &Album, _now: DateTime<Utc>) -> bool {
        album.is_incomplete()
    }

    async fn reconcile(&self, album_id: &str) -> Result<ReconcileOutcome, ReconcileError> {
        match self.provider.fetch_album(album_id).await {
            Ok(page) => {
                write_mutation(
                    &self.store,
                    LibraryMutation::RefreshAlbum {
                        album_id: album_id.to_string(),
                        page,
                        refreshed_at: Utc::now(),
                    },
                )
                .await?;
                Ok(ReconcileOutcome::Refreshed)
            }
            Err(e) if e.is_not_found() => {
                write_mutation(
                    &self.store,
                    LibraryMutation::DeleteAlbum {
                        album_id: album_id.to_string(),
                    },
                )
                .await?;
                Ok(ReconcileOutcome::Deleted { reason: e })
            }
            Err(e) => Err(ReconcileError::Fetch(e)),
        }
    }
}
