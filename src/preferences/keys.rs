//! Preference keys used by the library views.

pub const SONG_FILTER: &str = "songFilter";
pub const SONG_SORT_TYPE: &str = "songSortType";
pub const SONG_SORT_DESCENDING: &str = "songSortDescending";

pub const ARTIST_FILTER: &str = "artistFilter";
pub const ARTIST_SORT_TYPE: &str = "artistSortType";
pub const ARTIST_SORT_DESCENDING: &str = "artistSortDescending";

pub const ALBUM_FILTER: &str = "albumFilter";
pub const ALBUM_SORT_TYPE: &str = "albumSortType";
pub const ALBUM_SORT_DESCENDING: &str = "albumSortDescending";

pub const PLAYLIST_SORT_TYPE: &str = "playlistSortType";
pub const PLAYLIST_SORT_DESCENDING: &str = "playlistSortDescending";

pub const ARTIST_SONG_SORT_TYPE: &str = "artistSongSortType";
pub const ARTIST_SONG_SORT_DESCENDING: &str = "artistSongSortDescending";

pub const TOP_SIZE: &str = "topSize";
pub const DEFAULT_TOP_SIZE: &str = "50";

/// Keys that together make up the preference tuple of one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewKeys {
    /// `None` for views without a filter.
    pub filter: Option<&'static str>,
    pub sort: &'static str,
    pub descending: &'static str,
}

pub const SONG_VIEW_KEYS: ViewKeys = ViewKeys {
    filter: Some(SONG_FILTER),
    sort: SONG_SORT_TYPE,
    descending: SONG_SORT_DESCENDING,
};

pub const ARTIST_VIEW_KEYS: ViewKeys = ViewKeys {
    filter: Some(ARTIST_FILTER),
    sort: ARTIST_SORT_TYPE,
    descending: ARTIST_SORT_DESCENDING,
};

pub const ALBUM_VIEW_KEYS: ViewKeys = ViewKeys {
    filter: Some(ALBUM_FILTER),
    sort: ALBUM_SORT_TYPE,
    descending: ALBUM_SORT_DESCENDING,
};

pub const PLAYLIST_VIEW_KEYS: ViewKeys = ViewKeys {
    filter: None,
    sort: PLAYLIST_SORT_TYPE,
    descending: PLAYLIST_SORT_DESCENDING,
};

pub const ARTIST_SONG_VIEW_KEYS: ViewKeys = ViewKeys {
    filter: None,
    sort: ARTIST_SONG_SORT_TYPE,
    descending: ARTIST_SONG_SORT_DESCENDING,
};
