//! Filter variants and sort keys for library views.
//!
//! Values are persisted in the preference store by their SCREAMING_SNAKE_CASE
//! name. On the LIBRARY/LIKED paths the store does the ordering, so each sort
//! key also knows the SQL expression it orders by.

use serde::{Deserialize, Serialize};

/// Enums that round-trip through the preference store as strings.
pub trait PreferenceValue: Sized + Copy {
    fn as_str(&self) -> &'static str;
    fn parse(value: &str) -> Option<Self>;
}

macro_rules! preference_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl PreferenceValue for $name {
            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

preference_enum! {
    /// Which subset of songs a view shows.
    pub enum SongFilter {
        Library => "LIBRARY",
        Liked => "LIKED",
        Downloaded => "DOWNLOADED",
    }
}

preference_enum! {
    pub enum ArtistFilter {
        Library => "LIBRARY",
        Liked => "LIKED",
    }
}

preference_enum! {
    pub enum AlbumFilter {
        Library => "LIBRARY",
        Liked => "LIKED",
    }
}

preference_enum! {
    pub enum SongSortType {
        CreateDate => "CREATE_DATE",
        Name => "NAME",
        Artist => "ARTIST",
        PlayTime => "PLAY_TIME",
    }
}

preference_enum! {
    pub enum ArtistSortType {
        CreateDate => "CREATE_DATE",
        Name => "NAME",
        SongCount => "SONG_COUNT",
        PlayTime => "PLAY_TIME",
    }
}

preference_enum! {
    pub enum AlbumSortType {
        CreateDate => "CREATE_DATE",
        Name => "NAME",
        Artist => "ARTIST",
        Year => "YEAR",
        SongCount => "SONG_COUNT",
        Length => "LENGTH",
        PlayTime => "PLAY_TIME",
    }
}

preference_enum! {
    pub enum PlaylistSortType {
        CreateDate => "CREATE_DATE",
        Name => "NAME",
        SongCount => "SONG_COUNT",
    }
}

preference_enum! {
    /// Sort keys for the songs of a single artist.
    pub enum ArtistSongSortType {
        CreateDate => "CREATE_DATE",
        Name => "NAME",
        PlayTime => "PLAY_TIME",
    }
}

// Expressions below refer to the aliases used by the store queries:
// `s` songs, `a` artists, `al` albums, `p` playlists.

const SONG_ARTIST_NAMES: &str = "(SELECT group_concat(name, '') FROM \
     (SELECT ar.name AS name FROM song_artist_map m JOIN artists ar ON ar.id = m.artist_id \
      WHERE m.song_id = s.id ORDER BY m.position))";

const ALBUM_ARTIST_NAMES: &str = "(SELECT group_concat(name, '') FROM \
     (SELECT ar.name AS name FROM album_artist_map m JOIN artists ar ON ar.id = m.artist_id \
      WHERE m.album_id = al.id ORDER BY m.position))";

impl SongSortType {
    pub fn order_expr(&self) -> &'static str {
        match self {
            SongSortType::CreateDate => "s.create_date",
            SongSortType::Name => "s.title",
            SongSortType::Artist => SONG_ARTIST_NAMES,
            SongSortType::PlayTime => "s.total_play_time",
        }
    }
}

impl ArtistSortType {
    pub fn order_expr(&self) -> &'static str {
        match self {
            ArtistSortType::CreateDate => "a.create_date",
            ArtistSortType::Name => "a.name",
            ArtistSortType::SongCount => "song_count",
            ArtistSortType::PlayTime => "play_time",
        }
    }
}

impl AlbumSortType {
    pub fn order_expr(&self) -> &'static str {
        match self {
            AlbumSortType::CreateDate => "al.create_date",
            AlbumSortType::Name => "al.title",
            AlbumSortType::Artist => ALBUM_ARTIST_NAMES,
            AlbumSortType::Year => "al.year",
            AlbumSortType::SongCount => "al.song_count",
            AlbumSortType::Length => "al.duration",
            AlbumSortType::PlayTime => "play_time",
        }
    }
}

impl PlaylistSortType {
    pub fn order_expr(&self) -> &'static str {
        match self {
            PlaylistSortType::CreateDate => "p.create_date",
            PlaylistSortType::Name => "p.name",
            PlaylistSortType::SongCount => "song_count",
        }
    }
}

impl ArtistSongSortType {
    pub fn order_expr(&self) -> &'static str {
        match self {
            ArtistSongSortType::CreateDate => "s.create_date",
            ArtistSongSortType::Name => "s.title",
            ArtistSongSortType::PlayTime => "s.total_play_time",
        }
    }
}

/// Builds an ORDER BY clause. Ties always fall back to insertion order so the
/// same store contents produce the same list in both directions.
pub fn order_by_clause(expr: &str, descending: bool, rowid_column: &str) -> String {
    format!(
        "ORDER BY {} {}, {} ASC",
        expr,
        if descending { "DESC" } else { "ASC" },
        rowid_column
    )
}
