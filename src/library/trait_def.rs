//! LibraryStore trait definition.

use anyhow::Result;
use futures::stream::BoxStream;

use super::models::{Album, Artist, Playlist, Song};
use super::mutation::LibraryMutation;
use super::sort::{
    AlbumSortType, ArtistSongSortType, ArtistSortType, PlaylistSortType, SongSortType,
};

/// A query that re-emits its result every time the underlying data changes.
///
/// The first item is the current result. Dropping the stream cancels the
/// subscription, including a query that is still running.
pub type LiveQuery<T> = BoxStream<'static, T>;

pub type LiveList<T> = LiveQuery<Vec<T>>;

/// Persisted library of songs, artists, albums and playlists.
///
/// Ordering on every list query is done by the store according to the
/// requested sort key and direction.
pub trait LibraryStore: Send + Sync {
    // =========================================================================
    // Songs
    // =========================================================================

    /// Songs in the user's library.
    fn songs(&self, sort: SongSortType, descending: bool) -> LiveList<Song>;

    fn liked_songs(&self, sort: SongSortType, descending: bool) -> LiveList<Song>;

    /// Every known song, library or not, in insertion order.
    fn all_songs(&self) -> LiveList<Song>;

    /// Library songs credited to the given artist.
    fn artist_songs(
        &self,
        artist_id: &str,
        sort: ArtistSongSortType,
        descending: bool,
    ) -> LiveList<Song>;

    /// Songs with the highest accumulated play time.
    fn most_played_songs(&self, limit: usize) -> LiveList<Song>;

    // =========================================================================
    // Artists
    // =========================================================================

    fn artists(&self, sort: ArtistSortType, descending: bool) -> LiveList<Artist>;

    fn bookmarked_artists(&self, sort: ArtistSortType, descending: bool) -> LiveList<Artist>;

    /// Single artist by id, `None` while it does not exist.
    fn artist(&self, id: &str) -> LiveQuery<Option<Artist>>;

    // =========================================================================
    // Albums
    // =========================================================================

    fn albums(&self, sort: AlbumSortType, descending: bool) -> LiveList<Album>;

    fn liked_albums(&self, sort: AlbumSortType, descending: bool) -> LiveList<Album>;

    // =========================================================================
    // Playlists
    // =========================================================================

    fn playlists(&self, sort: PlaylistSortType, descending: bool) -> LiveList<Playlist>;

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Apply a mutation atomically. On success every live query re-runs.
    fn apply(&self, mutation: LibraryMutation) -> Result<()>;
}
