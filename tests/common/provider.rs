use async_trait::async_trait;
use pezzottify_library::metadata::{
    AlbumPage, AlbumPageSong, ArtistPage, MetadataProvider, RemoteError,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Metadata provider answering from in-memory tables.
///
/// Ids without an entry fail with a plain (not "not found") error.
#[derive(Default)]
pub struct FakeMetadataProvider {
    artists: Mutex<HashMap<String, Result<ArtistPage, RemoteError>>>,
    albums: Mutex<HashMap<String, Result<AlbumPage, RemoteError>>>,
    artist_calls: AtomicUsize,
    album_calls: AtomicUsize,
    fetched: Mutex<Vec<String>>,
}

impl FakeMetadataProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artist(self, id: &str, name: &str, thumbnail: &str) -> Self {
        self.artists.lock().unwrap().insert(
            id.to_string(),
            Ok(ArtistPage {
                id: id.to_string(),
                name: name.to_string(),
                thumbnail_url: Some(thumbnail.to_string()),
            }),
        );
        self
    }

    /// Artist page the service returns without a thumbnail.
    pub fn with_bare_artist(self, id: &str, name: &str) -> Self {
        self.artists.lock().unwrap().insert(
            id.to_string(),
            Ok(ArtistPage {
                id: id.to_string(),
                name: name.to_string(),
                thumbnail_url: None,
            }),
        );
        self
    }

    pub fn with_album(self, id: &str, title: &str, song_ids: &[&str]) -> Self {
        let songs = song_ids
            .iter()
            .map(|song_id| AlbumPageSong {
                id: song_id.to_string(),
                title: format!("Track {}", song_id),
                artists: vec![],
                duration: 200,
            })
            .collect();
        self.albums.lock().unwrap().insert(
            id.to_string(),
            Ok(AlbumPage {
                id: id.to_string(),
                title: title.to_string(),
                year: Some(2001),
                thumbnail_url: None,
                artists: vec![],
                songs,
            }),
        );
        self
    }

    pub fn with_missing_album(self, id: &str) -> Self {
        self.albums
            .lock()
            .unwrap()
            .insert(id.to_string(), Err(RemoteError::not_found("album", id)));
        self
    }

    pub fn artist_calls(&self) -> usize {
        self.artist_calls.load(Ordering::SeqCst)
    }

    pub fn album_calls(&self) -> usize {
        self.album_calls.load(Ordering::SeqCst)
    }

    /// Every id passed to a fetch, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataProvider for FakeMetadataProvider {
    async fn fetch_artist(&self, id: &str) -> Result<ArtistPage, RemoteError> {
        self.artist_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(id.to_string());
        self.artists
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(RemoteError::new("connection refused")))
    }

    async fn fetch_album(&self, id: &str) -> Result<AlbumPage, RemoteError> {
        self.album_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(id.to_string());
        self.albums
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_else(|| Err(RemoteError::new("connection refused")))
    }
}
