use std::sync::Arc;

use super::download_joiner::downloaded_songs;
use crate::downloads::DownloadStateSource;
use crate::library::{
    Album, AlbumFilter, AlbumSortType, Artist, ArtistFilter, ArtistSongSortType, ArtistSortType,
    LibraryStore, LiveList, Playlist, PlaylistSortType, Song, SongFilter, SongSortType,
};
use crate::preferences::PreferenceTuple;

/// Picks the live source for a view given its current preference tuple.
#[derive(Clone)]
pub struct EntityQueryRouter {
    store: Arc<dyn LibraryStore>,
    downloads: Arc<dyn DownloadStateSource>,
}

impl EntityQueryRouter {
    pub fn new(store: Arc<dyn LibraryStore>, downloads: Arc<dyn DownloadStateSource>) -> Self {
        Self { store, downloads }
    }

    pub fn songs(&self, tuple: PreferenceTuple<SongFilter, SongSortType>) -> LiveList<Song> {
        match tuple.filter {
            SongFilter::Library => self.store.songs(tuple.sort, tuple.descending),
            SongFilter::Liked => self.store.liked_songs(tuple.sort, tuple.descending),
            SongFilter::Downloaded => downloaded_songs(
                self.downloads.subscribe(),
                self.store.all_songs(),
                tuple.sort,
                tuple.descending,
            ),
        }
    }

    /// LIKED artists are the bookmarked ones.
    pub fn artists(
        &self,
        tuple: PreferenceTuple<ArtistFilter, ArtistSortType>,
    ) -> LiveList<Artist> {
        match tuple.filter {
            ArtistFilter::Library => self.store.artists(tuple.sort, tuple.descending),
            ArtistFilter::Liked => self.store.bookmarked_artists(tuple.sort, tuple.descending),
        }
    }

    pub fn albums(&self, tuple: PreferenceTuple<AlbumFilter, AlbumSortType>) -> LiveList<Album> {
        match tuple.filter {
            AlbumFilter::Library => self.store.albums(tuple.sort, tuple.descending),
            AlbumFilter::Liked => self.store.liked_albums(tuple.sort, tuple.descending),
        }
    }

    pub fn playlists(&self, tuple: PreferenceTuple<(), PlaylistSortType>) -> LiveList<Playlist> {
        self.store.playlists(tuple.sort, tuple.descending)
    }

    pub fn artist_songs(
        &self,
        artist_id: &str,
        tuple: PreferenceTuple<(), ArtistSongSortType>,
    ) -> LiveList<Song> {
        self.store.artist_songs(artist_id, tuple.sort, tuple.descending)
    }

    pub fn store(&self) -> &Arc<dyn LibraryStore> {
        &self.store
    }
}
