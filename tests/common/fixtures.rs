//! Stores and sample entities shared by the end-to-end tests.

use chrono::{DateTime, Duration, Utc};
use pezzottify_library::downloads::DownloadTracker;
use pezzottify_library::library::{
    Album, Artist, ArtistRef, LibraryMutation, LibraryStore, Playlist, Song,
};
use pezzottify_library::reconciler::Reconcilers;
use pezzottify_library::{LibraryViews, SqliteLibraryStore, SqlitePreferenceStore};
use std::sync::Arc;

use super::provider::FakeMetadataProvider;

pub const REPORT_CAPACITY: usize = 64;

pub struct TestLibrary {
    pub store: Arc<SqliteLibraryStore>,
    pub preferences: Arc<SqlitePreferenceStore>,
    pub downloads: Arc<DownloadTracker>,
    pub views: LibraryViews,
    pub reconcilers: Option<Arc<Reconcilers>>,
}

impl TestLibrary {
    /// Views without reconcilers.
    pub fn new() -> Self {
        let store = Arc::new(SqliteLibraryStore::in_memory().unwrap());
        let preferences = Arc::new(SqlitePreferenceStore::in_memory().unwrap());
        let downloads = Arc::new(DownloadTracker::new());
        let views = LibraryViews::new(store.clone(), preferences.clone(), downloads.clone());
        Self {
            store,
            preferences,
            downloads,
            views,
            reconcilers: None,
        }
    }

    /// Views that hand artist and album lists to reconcilers backed by `provider`.
    pub fn with_provider(provider: Arc<FakeMetadataProvider>) -> Self {
        let mut library = Self::new();
        let reconcilers = Arc::new(Reconcilers::new(
            library.store.clone(),
            provider,
            Duration::days(10),
            REPORT_CAPACITY,
        ));
        library.views = library.views.clone().with_reconcilers(reconcilers.clone());
        library.reconcilers = Some(reconcilers);
        library
    }

    pub fn apply(&self, mutations: Vec<LibraryMutation>) {
        self.store.apply(LibraryMutation::Batch(mutations)).unwrap();
    }
}

pub fn at(offset_secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000 + offset_secs, 0).unwrap()
}

pub fn artist_ref(id: &str, name: &str) -> ArtistRef {
    ArtistRef {
        id: id.to_string(),
        name: name.to_string(),
    }
}

pub fn song(id: &str, title: &str, artists: Vec<ArtistRef>, created: i64) -> LibraryMutation {
    LibraryMutation::UpsertSong(Song {
        id: id.to_string(),
        title: title.to_string(),
        artists,
        album_id: None,
        duration: 180,
        total_play_time: 0,
        liked: false,
        in_library: Some(at(created)),
        create_date: at(created),
    })
}

pub fn artist(
    id: &str,
    name: &str,
    thumbnail: Option<&str>,
    updated: DateTime<Utc>,
) -> LibraryMutation {
    LibraryMutation::UpsertArtist(Artist {
        id: id.to_string(),
        name: name.to_string(),
        thumbnail_url: thumbnail.map(str::to_string),
        last_update_time: updated,
        bookmarked_at: None,
        create_date: at(0),
        song_count: 0,
    })
}

pub fn album(id: &str, title: &str, song_count: i32) -> LibraryMutation {
    LibraryMutation::UpsertAlbum(Album {
        id: id.to_string(),
        title: title.to_string(),
        year: None,
        thumbnail_url: None,
        song_count,
        duration: 0,
        liked: false,
        artists: vec![],
        create_date: at(0),
        last_update_time: at(0),
    })
}

pub fn playlist(id: &str, name: &str, created: i64) -> LibraryMutation {
    LibraryMutation::UpsertPlaylist {
        playlist: Playlist {
            id: id.to_string(),
            name: name.to_string(),
            song_count: 0,
            create_date: at(created),
        },
        song_ids: vec![],
    }
}
