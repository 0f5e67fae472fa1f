use chrono::{DateTime, Utc};

use super::models::{Album, Artist, Playlist, Song};
use crate::metadata::{AlbumPage, ArtistPage};

/// A single write against the library store.
///
/// `LibraryStore::apply` runs each mutation (a `Batch` included) inside one
/// transaction: readers either see all of it or none of it.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryMutation {
    /// Insert or overwrite a song together with its artist credits.
    UpsertSong(Song),
    UpsertArtist(Artist),
    /// Insert or overwrite an album together with its artist credits.
    UpsertAlbum(Album),
    UpsertPlaylist {
        playlist: Playlist,
        song_ids: Vec<String>,
    },
    SetSongLiked {
        song_id: String,
        liked: bool,
    },
    SetAlbumLiked {
        album_id: String,
        liked: bool,
    },
    SetArtistBookmarked {
        artist_id: String,
        bookmarked_at: Option<DateTime<Utc>>,
    },
    /// Replace an artist's cached remote metadata.
    RefreshArtist {
        artist_id: String,
        page: ArtistPage,
        refreshed_at: DateTime<Utc>,
    },
    /// Replace an album's cached remote metadata, artist credits and song list.
    RefreshAlbum {
        album_id: String,
        page: AlbumPage,
        refreshed_at: DateTime<Utc>,
    },
    DeleteAlbum {
        album_id: String,
    },
    Batch(Vec<LibraryMutation>),
}

impl LibraryMutation {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            LibraryMutation::UpsertSong(_) => "upsert_song",
            LibraryMutation::UpsertArtist(_) => "upsert_artist",
            LibraryMutation::UpsertAlbum(_) => "upsert_album",
            LibraryMutation::UpsertPlaylist { .. } => "upsert_playlist",
            LibraryMutation::SetSongLiked { .. } => "set_song_liked",
            LibraryMutation::SetAlbumLiked { .. } => "set_album_liked",
            LibraryMutation::SetArtistBookmarked { .. } => "set_artist_bookmarked",
            LibraryMutation::RefreshArtist { .. } => "refresh_artist",
            LibraryMutation::RefreshAlbum { .. } => "refresh_album",
            LibraryMutation::DeleteAlbum { .. } => "delete_album",
            LibraryMutation::Batch(_) => "batch",
        }
    }
}
