use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use super::models::{Download, DownloadMap};

/// Anything that can expose the live song-id -> download map.
pub trait DownloadStateSource: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<DownloadMap>;
}

/// In-memory download state, updated by whoever drives the downloads.
pub struct DownloadTracker {
    downloads: watch::Sender<DownloadMap>,
}

impl Default for DownloadTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadTracker {
    pub fn new() -> Self {
        let (downloads, _) = watch::channel(Arc::new(HashMap::new()));
        Self { downloads }
    }

    /// Record the latest download of a song, replacing any previous one.
    pub fn set(&self, song_id: &str, download: Download) {
        debug!("Download of {} is now {:?}", song_id, download.state);
        self.downloads.send_modify(|map| {
            Arc::make_mut(map).insert(song_id.to_string(), download);
        });
    }

    pub fn remove(&self, song_id: &str) {
        self.downloads.send_if_modified(|map| {
            if map.contains_key(song_id) {
                Arc::make_mut(map).remove(song_id);
                true
            } else {
                false
            }
        });
    }

    pub fn current(&self) -> DownloadMap {
        Arc::clone(&self.downloads.borrow())
    }
}

impl DownloadStateSource for DownloadTracker {
    fn subscribe(&self) -> watch::Receiver<DownloadMap> {
        self.downloads.subscribe()
    }
}
