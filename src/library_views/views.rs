use futures::stream::BoxStream;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::info;

use super::controller::{ListController, LiveController};
use super::router::EntityQueryRouter;
use crate::downloads::DownloadStateSource;
use crate::library::{
    Album, AlbumFilter, AlbumSortType, Artist, ArtistFilter, ArtistSongSortType, ArtistSortType,
    LibraryStore, Playlist, PlaylistSortType, PreferenceValue, Song, SongFilter, SongSortType,
};
use crate::preferences::keys::{
    ViewKeys, ALBUM_VIEW_KEYS, ARTIST_SONG_VIEW_KEYS, ARTIST_VIEW_KEYS, DEFAULT_TOP_SIZE,
    PLAYLIST_VIEW_KEYS, SONG_VIEW_KEYS, TOP_SIZE,
};
use crate::preferences::{distinct_values, PreferenceStore, PreferenceTuple};
use crate::reconciler::Reconcilers;

/// Most played songs shown next to the playlists.
pub const TOP_SONGS_LIMIT: usize = 100;

pub struct PlaylistsView {
    pub playlists: ListController<Playlist>,
    pub top_songs: ListController<Song>,
    /// Stored "top size" setting, as the raw string.
    pub top_size: LiveController<String>,
}

/// Bookmarked artists, liked albums and playlists, newest first.
pub struct MixView {
    pub artists: ListController<Artist>,
    pub albums: ListController<Album>,
    pub playlists: ListController<Playlist>,
    pub top_size: LiveController<String>,
}

pub struct ArtistDetailView {
    /// `None` until the artist exists in the store.
    pub artist: LiveController<Option<Artist>>,
    pub songs: ListController<Song>,
}

/// Builds the live views of the library.
///
/// Every call returns an independent view; dropping it cancels its pending
/// queries. With reconcilers set, artist and album lists are also handed to
/// them on every emission.
#[derive(Clone)]
pub struct LibraryViews {
    router: EntityQueryRouter,
    preferences: Arc<dyn PreferenceStore>,
    reconcilers: Option<Arc<Reconcilers>>,
}

impl LibraryViews {
    pub fn new(
        store: Arc<dyn LibraryStore>,
        preferences: Arc<dyn PreferenceStore>,
        downloads: Arc<dyn DownloadStateSource>,
    ) -> Self {
        Self {
            router: EntityQueryRouter::new(store, downloads),
            preferences,
            reconcilers: None,
        }
    }

    pub fn with_reconcilers(mut self, reconcilers: Arc<Reconcilers>) -> Self {
        info!("Library views will reconcile artist and album metadata");
        self.reconcilers = Some(reconcilers);
        self
    }

    fn tuples<F, S>(&self, keys: ViewKeys) -> BoxStream<'static, PreferenceTuple<F, S>>
    where
        F: PreferenceValue + Default + PartialEq + Send + Debug + 'static,
        S: PreferenceValue + Default + PartialEq + Send + Debug + 'static,
    {
        distinct_values(self.preferences.subscribe(), move |snapshot| {
            snapshot.tuple::<F, S>(&keys)
        })
    }

    fn top_size(&self) -> LiveController<String> {
        LiveController::from_stream(
            "top_size",
            DEFAULT_TOP_SIZE.to_string(),
            distinct_values(self.preferences.subscribe(), |snapshot| {
                snapshot.get_or(TOP_SIZE, DEFAULT_TOP_SIZE).to_string()
            }),
        )
    }

    fn reconcile_artists(&self, view: &ListController<Artist>) {
        if let Some(reconcilers) = &self.reconcilers {
            reconcilers.attach_artists(view.subscribe());
        }
    }

    fn reconcile_albums(&self, view: &ListController<Album>) {
        if let Some(reconcilers) = &self.reconcilers {
            reconcilers.attach_albums(view.subscribe());
        }
    }

    pub fn songs(&self) -> ListController<Song> {
        let router = self.router.clone();
        ListController::list(
            "songs",
            self.tuples::<SongFilter, SongSortType>(SONG_VIEW_KEYS),
            move |tuple| router.songs(tuple),
        )
    }

    pub fn artists(&self) -> ListController<Artist> {
        let router = self.router.clone();
        let view = ListController::list(
            "artists",
            self.tuples::<ArtistFilter, ArtistSortType>(ARTIST_VIEW_KEYS),
            move |tuple| router.artists(tuple),
        );
        self.reconcile_artists(&view);
        view
    }

    pub fn albums(&self) -> ListController<Album> {
        let router = self.router.clone();
        let view = ListController::list(
            "albums",
            self.tuples::<AlbumFilter, AlbumSortType>(ALBUM_VIEW_KEYS),
            move |tuple| router.albums(tuple),
        );
        self.reconcile_albums(&view);
        view
    }

    pub fn playlists(&self) -> PlaylistsView {
        let router = self.router.clone();
        let playlists = ListController::list(
            "playlists",
            self.tuples::<(), PlaylistSortType>(PLAYLIST_VIEW_KEYS),
            move |tuple| router.playlists(tuple),
        );
        let top_songs = ListController::list_from_stream(
            "top_songs",
            self.router.store().most_played_songs(TOP_SONGS_LIMIT),
        );
        PlaylistsView {
            playlists,
            top_songs,
            top_size: self.top_size(),
        }
    }

    pub fn mix(&self) -> MixView {
        let store = self.router.store();
        let artists = ListController::list_from_stream(
            "mix_artists",
            store.bookmarked_artists(ArtistSortType::CreateDate, true),
        );
        let albums = ListController::list_from_stream(
            "mix_albums",
            store.liked_albums(AlbumSortType::CreateDate, true),
        );
        let playlists = ListController::list_from_stream(
            "mix_playlists",
            store.playlists(PlaylistSortType::CreateDate, true),
        );
        self.reconcile_artists(&artists);
        self.reconcile_albums(&albums);
        MixView {
            artists,
            albums,
            playlists,
            top_size: self.top_size(),
        }
    }

    pub fn artist_detail(&self, artist_id: &str) -> ArtistDetailView {
        let artist = LiveController::from_stream(
            "artist",
            None,
            self.router.store().artist(artist_id),
        );
        let router = self.router.clone();
        let id = artist_id.to_string();
        let songs = ListController::list(
            "artist_songs",
            self.tuples::<(), ArtistSongSortType>(ARTIST_SONG_VIEW_KEYS),
            move |tuple| router.artist_songs(&id, tuple),
        );
        ArtistDetailView { artist, songs }
    }
}
