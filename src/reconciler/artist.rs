use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::report::{EntityKind, ReconcileError, ReconcileOutcome};
use super::runner::StalenessReconciler;
use super::write_mutation;
use crate::library::{Artist, LibraryMutation, LibraryStore};
use crate::metadata::MetadataProvider;

pub const DEFAULT_ARTIST_MAX_AGE_DAYS: i64 = 10;

/// Refreshes artists with no thumbnail or with metadata older than
/// `max_age`. A failed fetch, not-found included, never removes the artist.
pub struct ArtistReconciler {
    store: Arc<dyn LibraryStore>,
    provider: Arc<dyn MetadataProvider>,
    max_age: Duration,
}

impl ArtistReconciler {
    pub fn new(
        store: Arc<dyn LibraryStore>,
        provider: Arc<dyn MetadataProvider>,
        max_age: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            max_age,
        }
    }
}

#[async_trait]
impl StalenessReconciler for ArtistReconciler {
    type Entity = Artist;

    fn kind(&self) -> EntityKind {
        EntityKind::Artist
    }

    fn entity_id<'a>(&self, entity: &'a Artist) -> &'a str {
        &entity.id
    }

    fn is_stale(&self, artist: &Artist, now: DateTime<Utc>) -> bool {
        artist.thumbnail_url.is_none() || now - artist.last_update_time > self.max_age
    }

    async fn reconcile(&self, artist_id: &str) -> Result<ReconcileOutcome, ReconcileError> {
        let page = self.provider.fetch_artist(artist_id).await?;
        write_mutation(
            &self.store,
            LibraryMutation::RefreshArtist {
                artist_id: artist_id.to_string(),
                page,
                refreshed_at: Utc::now(),
            },
        )
        .await?;
        Ok(ReconcileOutcome::Refreshed)
    }
}
