//! Pages returned by the remote metadata service.
//!
//! These types match the JSON bodies of `/artist/{id}` and `/album/{id}` and
//! carry everything a refresh writes back in one transaction.

use serde::{Deserialize, Serialize};

use crate::library::ArtistRef;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ArtistPage {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// Song as listed on an album page.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AlbumPageSong {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    /// Seconds, -1 when the service does not know it
    #[serde(default = "unknown_duration")]
    pub duration: i32,
}

fn unknown_duration() -> i32 {
    -1
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AlbumPage {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub songs: Vec<AlbumPageSong>,
}

impl AlbumPage {
    pub fn song_count(&self) -> i32 {
        self.songs.len() as i32
    }

    /// Sum of the known song durations, in seconds.
    pub fn total_duration(&self) -> i32 {
        self.songs.iter().map(|s| s.duration.max(0)).sum()
    }
}
