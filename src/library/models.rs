//! Library entities as read from the persisted store.
//!
//! Views hold these by value; the store stays the owner of the records and
//! every change reaches the views as a freshly queried list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal artist reference carried by songs and albums, in credit order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artists: Vec<ArtistRef>,
    pub album_id: Option<String>,
    /// Duration in seconds, -1 when unknown
    pub duration: i32,
    /// Accumulated listening time in milliseconds
    pub total_play_time: i64,
    pub liked: bool,
    /// When the song entered the library, `None` for songs only known
    /// through an album page.
    pub in_library: Option<DateTime<Utc>>,
    pub create_date: DateTime<Utc>,
}

impl Song {
    /// Artist names concatenated in credit order, with no separator.
    pub fn joined_artist_names(&self) -> String {
        self.artists.iter().map(|a| a.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub last_update_time: DateTime<Utc>,
    pub bookmarked_at: Option<DateTime<Utc>>,
    pub create_date: DateTime<Utc>,
    /// Number of library songs credited to this artist
    pub song_count: i64,
}

impl Artist {
    pub fn is_bookmarked(&self) -> bool {
        self.bookmarked_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub thumbnail_url: Option<String>,
    /// Zero means the album page was never fetched.
    pub song_count: i32,
    /// Total duration in seconds
    pub duration: i32,
    pub liked: bool,
    pub artists: Vec<ArtistRef>,
    pub create_date: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
}

impl Album {
    pub fn is_incomplete(&self) -> bool {
        self.song_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub song_count: i64,
    pub create_date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_artist_names_preserves_order_without_separator() {
        let song = Song {
            id: "s1".to_string(),
            title: "Song".to_string(),
            artists: vec![
                ArtistRef {
                    id: "a2".to_string(),
                    name: "Zeta".to_string(),
                },
                ArtistRef {
                    id: "a1".to_string(),
                    name: "Alpha".to_string(),
                },
            ],
            album_id: None,
            duration: 180,
            total_play_time: 0,
            liked: false,
            in_library: None,
            create_date: Utc::now(),
        };
        assert_eq!(song.joined_artist_names(), "ZetaAlpha");
    }
}
