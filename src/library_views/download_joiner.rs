//! Downloaded-songs view: the song list joined with live download state.
//!
//! Unlike the library and liked paths, ordering here is done in memory since
//! the CREATE_DATE key comes from the download map, not from the store.

use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::downloads::{Download, DownloadMap};
use crate::library::{LiveList, Song, SongSortType};

fn compare(
    a: &Song,
    b: &Song,
    sort: SongSortType,
    downloads: &HashMap<String, Download>,
) -> Ordering {
    match sort {
        SongSortType::CreateDate => {
            let updated_at = |song: &Song| downloads.get(&song.id).map(|d| d.updated_at);
            updated_at(a).cmp(&updated_at(b))
        }
        SongSortType::Name => a.title.cmp(&b.title),
        SongSortType::Artist => a.joined_artist_names().cmp(&b.joined_artist_names()),
        SongSortType::PlayTime => a.total_play_time.cmp(&b.total_play_time),
    }
}

/// Songs whose download completed, ordered by `sort`.
///
/// `descending` puts the greatest key first. The sort is stable in both
/// directions, so songs with equal keys keep their store order.
pub fn join_downloaded(
    songs: &[Song],
    downloads: &HashMap<String, Download>,
    sort: SongSortType,
    descending: bool,
) -> Vec<Song> {
    let mut joined: Vec<Song> = songs
        .iter()
        .filter(|song| {
            downloads
                .get(&song.id)
                .is_some_and(|d| d.state.is_completed())
        })
        .cloned()
        .collect();

    joined.sort_by(|a, b| {
        let ordering = compare(a, b, sort, downloads);
        if descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
    joined
}

struct JoinState {
    downloads: watch::Receiver<DownloadMap>,
    downloads_open: bool,
    songs: LiveList<Song>,
    latest_songs: Option<Vec<Song>>,
}

/// Re-joins every time either the song list or the download map changes.
///
/// Nothing is emitted until the first song list arrives. The stream ends with
/// the song stream; a closed download source keeps its last map.
pub fn downloaded_songs(
    downloads: watch::Receiver<DownloadMap>,
    songs: LiveList<Song>,
    sort: SongSortType,
    descending: bool,
) -> LiveList<Song> {
    let state = JoinState {
        downloads,
        downloads_open: true,
        songs,
        latest_songs: None,
    };

    stream::unfold(state, move |mut state| async move {
        loop {
            tokio::select! {
                next = state.songs.next() => match next {
                    Some(songs) => state.latest_songs = Some(songs),
                    None => return None,
                },
                changed = state.downloads.changed(), if state.downloads_open => {
                    if changed.is_err() {
                        debug!("Download source closed, keeping last known state");
                        state.downloads_open = false;
                        continue;
                    }
                }
            }

            if let Some(songs) = &state.latest_songs {
                let joined = {
                    let downloads = state.downloads.borrow_and_update();
                    join_downloaded(songs, &downloads, sort, descending)
                };
                return Some((joined, state));
            }
        }
    })
    .boxed()
}
