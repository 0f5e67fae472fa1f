//! Download state as reported by the download manager.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DownloadState {
    NotDownloaded,
    InProgress,
    Completed, // terminal
    Failed,    // terminal
}

impl DownloadState {
    pub fn is_completed(&self) -> bool {
        matches!(self, DownloadState::Completed)
    }
}

/// Latest known download of one song.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    pub state: DownloadState,
    /// Last state change, also the CREATE_DATE sort key of downloaded songs.
    pub updated_at: DateTime<Utc>,
}

impl Download {
    pub fn new(state: DownloadState, updated_at: DateTime<Utc>) -> Self {
        Self { state, updated_at }
    }
}

/// Song id -> download. Songs missing from the map are not downloaded.
pub type DownloadMap = Arc<HashMap<String, Download>>;
