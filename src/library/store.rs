//! SQLite-backed library store.
//!
//! All access goes through one connection. Writes run in a transaction and
//! bump the invalidation tracker once committed, which makes every live query
//! re-run against the new state.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, ToSql, Transaction};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use super::live_query::{live_query, InvalidationTracker};
use super::models::{Album, Artist, ArtistRef, Playlist, Song};
use super::mutation::LibraryMutation;
use super::schema::LIBRARY_VERSIONED_SCHEMAS;
use super::sort::{
    order_by_clause, AlbumSortType, ArtistSongSortType, ArtistSortType, PlaylistSortType,
    SongSortType,
};
use super::trait_def::{LibraryStore, LiveList, LiveQuery};
use crate::sqlite_persistence::initialize_schema;

pub(crate) fn to_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
}

const SONG_COLUMNS: &str =
    "s.id, s.title, s.album_id, s.duration, s.total_play_time, s.liked, s.in_library, s.create_date";

const ARTIST_SELECT: &str = "SELECT a.id, a.name, a.thumbnail_url, a.last_update_time, \
     a.bookmarked_at, a.create_date, \
     (SELECT COUNT(*) FROM song_artist_map m JOIN songs s ON s.id = m.song_id \
      WHERE m.artist_id = a.id AND s.in_library IS NOT NULL) AS song_count, \
     (SELECT COALESCE(SUM(s.total_play_time), 0) FROM song_artist_map m \
      JOIN songs s ON s.id = m.song_id WHERE m.artist_id = a.id) AS play_time \
     FROM artists a";

const ALBUM_SELECT: &str = "SELECT al.id, al.title, al.year, al.thumbnail_url, al.song_count, \
     al.duration, al.liked, al.create_date, al.last_update_time, \
     (SELECT COALESCE(SUM(s.total_play_time), 0) FROM album_song_map m \
      JOIN songs s ON s.id = m.song_id WHERE m.album_id = al.id) AS play_time \
     FROM albums al";

const PLAYLIST_SELECT: &str = "SELECT p.id, p.name, p.create_date, \
     (SELECT COUNT(*) FROM playlist_song_map m WHERE m.playlist_id = p.id) AS song_count \
     FROM playlists p";

/// SQLite-backed library store.
#[derive(Clone)]
pub struct SqliteLibraryStore {
    conn: Arc<Mutex<Connection>>,
    invalidation: Arc<InvalidationTracker>,
}

impl SqliteLibraryStore {
    /// Open (creating if needed) the library database at `db_path`.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open library database {:?}", db_path))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    /// Library store backed by a private in-memory database.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        initialize_schema(&mut conn, LIBRARY_VERSIONED_SCHEMAS, "library")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let counts: (i64, i64, i64) = conn.query_row(
            "SELECT (SELECT COUNT(*) FROM songs), (SELECT COUNT(*) FROM artists), \
             (SELECT COUNT(*) FROM albums)",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?;
        info!(
            "Opened library: {} songs, {} artists, {} albums",
            counts.0, counts.1, counts.2
        );

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            invalidation: Arc::new(InvalidationTracker::new()),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("library db connection mutex poisoned"))
    }

    fn live<T, F>(&self, label: &'static str, query: F) -> LiveQuery<T>
    where
        T: Send + 'static,
        F: Fn(&Connection) -> Result<T> + Send + Sync + 'static,
    {
        live_query(
            Arc::clone(&self.conn),
            self.invalidation.subscribe(),
            label,
            query,
        )
    }

    fn live_songs(
        &self,
        label: &'static str,
        where_clause: &'static str,
        order_clause: String,
        args: Vec<String>,
    ) -> LiveList<Song> {
        self.live(label, move |conn| {
            let sql = format!(
                "SELECT {} FROM songs s {} {}",
                SONG_COLUMNS, where_clause, order_clause
            );
            let params: Vec<&dyn ToSql> = args.iter().map(|a| a as &dyn ToSql).collect();
            query_songs(conn, &sql, &params)
        })
    }

    fn live_artists(
        &self,
        label: &'static str,
        where_clause: &'static str,
        sort: ArtistSortType,
        descending: bool,
    ) -> LiveList<Artist> {
        self.live(label, move |conn| {
            let sql = format!(
                "{} {} {}",
                ARTIST_SELECT,
                where_clause,
                order_by_clause(sort.order_expr(), descending, "a.rowid")
            );
            query_artists(conn, &sql, &[])
        })
    }

    fn live_albums(
        &self,
        label: &'static str,
        where_clause: &'static str,
        sort: AlbumSortType,
        descending: bool,
    ) -> LiveList<Album> {
        self.live(label, move |conn| {
            let sql = format!(
                "{} {} {}",
                ALBUM_SELECT,
                where_clause,
                order_by_clause(sort.order_expr(), descending, "al.rowid")
            );
            query_albums(conn, &sql)
        })
    }
}

// =============================================================================
// Row mapping
// =============================================================================

fn load_artist_refs(
    conn: &Connection,
    map_table: &str,
    key_column: &str,
) -> Result<HashMap<String, Vec<ArtistRef>>> {
    let sql = format!(
        "SELECT m.{key}, ar.id, ar.name FROM {table} m JOIN artists ar ON ar.id = m.artist_id \
         ORDER BY m.{key}, m.position",
        key = key_column,
        table = map_table
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            ArtistRef {
                id: row.get(1)?,
                name: row.get(2)?,
            },
        ))
    })?;

    let mut refs: HashMap<String, Vec<ArtistRef>> = HashMap::new();
    for row in rows {
        let (owner_id, artist) = row?;
        refs.entry(owner_id).or_default().push(artist);
    }
    Ok(refs)
}

fn query_songs(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Song>> {
    let mut artists = load_artist_refs(conn, "song_artist_map", "song_id")?;
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok(Song {
            id: row.get(0)?,
            title: row.get(1)?,
            artists: Vec::new(),
            album_id: row.get(2)?,
            duration: row.get(3)?,
            total_play_time: row.get(4)?,
            liked: row.get::<_, i64>(5)? != 0,
            in_library: row.get::<_, Option<i64>>(6)?.map(from_millis),
            create_date: from_millis(row.get(7)?),
        })
    })?;

    let mut songs = Vec::new();
    for row in rows {
        let mut song = row?;
        song.artists = artists.remove(&song.id).unwrap_or_default();
        songs.push(song);
    }
    Ok(songs)
}

fn query_artists(conn: &Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Artist>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok(Artist {
            id: row.get(0)?,
            name: row.get(1)?,
            thumbnail_url: row.get(2)?,
            last_update_time: from_millis(row.get(3)?),
            bookmarked_at: row.get::<_, Option<i64>>(4)?.map(from_millis),
            create_date: from_millis(row.get(5)?),
            song_count: row.get(6)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn query_albums(conn: &Connection, sql: &str) -> Result<Vec<Album>> {
    let mut artists = load_artist_refs(conn, "album_artist_map", "album_id")?;
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(Album {
            id: row.get(0)?,
            title: row.get(1)?,
            year: row.get(2)?,
            thumbnail_url: row.get(3)?,
            song_count: row.get(4)?,
            duration: row.get(5)?,
            liked: row.get::<_, i64>(6)? != 0,
            artists: Vec::new(),
            create_date: from_millis(row.get(7)?),
            last_update_time: from_millis(row.get(8)?),
        })
    })?;

    let mut albums = Vec::new();
    for row in rows {
        let mut album = row?;
        album.artists = artists.remove(&album.id).unwrap_or_default();
        albums.push(album);
    }
    Ok(albums)
}

fn query_playlists(conn: &Connection, sql: &str) -> Result<Vec<Playlist>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map([], |row| {
        Ok(Playlist {
            id: row.get(0)?,
            name: row.get(1)?,
            create_date: from_millis(row.get(2)?),
            song_count: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

// =============================================================================
// Writes
// =============================================================================

/// Insert an artist known only by reference, keeping any existing row.
fn ensure_artist(tx: &Transaction, artist: &ArtistRef, now: i64) -> Result<()> {
    // last_update_time 0 and no thumbnail: the artist is due for a refresh
    tx.execute(
        "INSERT OR IGNORE INTO artists (id, name, thumbnail_url, last_update_time, bookmarked_at, create_date) \
         VALUES (?1, ?2, NULL, 0, NULL, ?3)",
        params![artist.id, artist.name, now],
    )?;
    Ok(())
}

fn replace_artist_map(
    tx: &Transaction,
    map_table: &str,
    key_column: &str,
    owner_id: &str,
    artists: &[ArtistRef],
    now: i64,
) -> Result<()> {
    tx.execute(
        &format!("DELETE FROM {} WHERE {} = ?1", map_table, key_column),
        params![owner_id],
    )?;
    for (position, artist) in artists.iter().enumerate() {
        ensure_artist(tx, artist, now)?;
        tx.execute(
            &format!(
                "INSERT OR IGNORE INTO {} ({}, artist_id, position) VALUES (?1, ?2, ?3)",
                map_table, key_column
            ),
            params![owner_id, artist.id, position as i64],
        )?;
    }
    Ok(())
}

fn apply_in_tx(tx: &Transaction, mutation: &LibraryMutation) -> Result<()> {
    let now = to_millis(Utc::now());
    match mutation {
        LibraryMutation::UpsertSong(song) => {
            tx.execute(
                "INSERT INTO songs (id, title, album_id, duration, total_play_time, liked, in_library, create_date) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(id) DO UPDATE SET title = excluded.title, album_id = excluded.album_id, \
                 duration = excluded.duration, total_play_time = excluded.total_play_time, \
                 liked = excluded.liked, in_library = excluded.in_library, create_date = excluded.create_date",
                params![
                    song.id,
                    song.title,
                    song.album_id,
                    song.duration,
                    song.total_play_time,
                    song.liked as i64,
                    song.in_library.map(to_millis),
                    to_millis(song.create_date),
                ],
            )?;
            replace_artist_map(tx, "song_artist_map", "song_id", &song.id, &song.artists, now)?;
        }
        LibraryMutation::UpsertArtist(artist) => {
            tx.execute(
                "INSERT INTO artists (id, name, thumbnail_url, last_update_time, bookmarked_at, create_date) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, thumbnail_url = excluded.thumbnail_url, \
                 last_update_time = excluded.last_update_time, bookmarked_at = excluded.bookmarked_at, \
                 create_date = excluded.create_date",
                params![
                    artist.id,
                    artist.name,
                    artist.thumbnail_url,
                    to_millis(artist.last_update_time),
                    artist.bookmarked_at.map(to_millis),
                    to_millis(artist.create_date),
                ],
            )?;
        }
        LibraryMutation::UpsertAlbum(album) => {
            tx.execute(
                "INSERT INTO albums (id, title, year, thumbnail_url, song_count, duration, liked, create_date, last_update_time) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
                 ON CONFLICT(id) DO UPDATE SET title = excluded.title, year = excluded.year, \
                 thumbnail_url = excluded.thumbnail_url, song_count = excluded.song_count, \
                 duration = excluded.duration, liked = excluded.liked, create_date = excluded.create_date, \
                 last_update_time = excluded.last_update_time",
                params![
                    album.id,
                    album.title,
                    album.year,
                    album.thumbnail_url,
                    album.song_count,
                    album.duration,
                    album.liked as i64,
                    to_millis(album.create_date),
                    to_millis(album.last_update_time),
                ],
            )?;
            replace_artist_map(tx, "album_artist_map", "album_id", &album.id, &album.artists, now)?;
        }
        LibraryMutation::UpsertPlaylist { playlist, song_ids } => {
            tx.execute(
                "INSERT INTO playlists (id, name, create_date) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, create_date = excluded.create_date",
                params![playlist.id, playlist.name, to_millis(playlist.create_date)],
            )?;
            tx.execute(
                "DELETE FROM playlist_song_map WHERE playlist_id = ?1",
                params![playlist.id],
            )?;
            for (position, song_id) in song_ids.iter().enumerate() {
                tx.execute(
                    "INSERT INTO playlist_song_map (playlist_id, song_id, position) VALUES (?1, ?2, ?3)",
                    params![playlist.id, song_id, position as i64],
                )?;
            }
        }
        LibraryMutation::SetSongLiked { song_id, liked } => {
            tx.execute(
                "UPDATE songs SET liked = ?1 WHERE id = ?2",
                params![*liked as i64, song_id],
            )?;
        }
        LibraryMutation::SetAlbumLiked { album_id, liked } => {
            tx.execute(
                "UPDATE albums SET liked = ?1 WHERE id = ?2",
                params![*liked as i64, album_id],
            )?;
        }
        LibraryMutation::SetArtistBookmarked {
            artist_id,
            bookmarked_at,
        } => {
            tx.execute(
                "UPDATE artists SET bookmarked_at = ?1 WHERE id = ?2",
                params![bookmarked_at.map(to_millis), artist_id],
            )?;
        }
        LibraryMutation::RefreshArtist {
            artist_id,
            page,
            refreshed_at,
        } => {
            let updated = tx.execute(
                "UPDATE artists SET name = ?1, thumbnail_url = ?2, last_update_time = ?3 WHERE id = ?4",
                params![page.name, page.thumbnail_url, to_millis(*refreshed_at), artist_id],
            )?;
            if updated == 0 {
                debug!("Artist {} no longer exists, refresh skipped", artist_id);
            }
        }
        LibraryMutation::RefreshAlbum {
            album_id,
            page,
            refreshed_at,
        } => {
            let updated = tx.execute(
                "UPDATE albums SET title = ?1, year = ?2, thumbnail_url = ?3, song_count = ?4, \
                 duration = ?5, last_update_time = ?6 WHERE id = ?7",
                params![
                    page.title,
                    page.year,
                    page.thumbnail_url,
                    page.song_count(),
                    page.total_duration(),
                    to_millis(*refreshed_at),
                    album_id,
                ],
            )?;
            if updated == 0 {
                debug!("Album {} no longer exists, refresh skipped", album_id);
                return Ok(());
            }

            replace_artist_map(tx, "album_artist_map", "album_id", album_id, &page.artists, now)?;

            tx.execute(
                "DELETE FROM album_song_map WHERE album_id = ?1",
                params![album_id],
            )?;
            for (position, song) in page.songs.iter().enumerate() {
                tx.execute(
                    "INSERT INTO songs (id, title, album_id, duration, create_date) \
                     VALUES (?1, ?2, ?3, ?4, ?5) \
                     ON CONFLICT(id) DO UPDATE SET title = excluded.title, \
                     album_id = excluded.album_id, duration = excluded.duration",
                    params![song.id, song.title, album_id, song.duration, now],
                )?;
                if !song.artists.is_empty() {
                    replace_artist_map(
                        tx,
                        "song_artist_map",
                        "song_id",
                        &song.id,
                        &song.artists,
                        now,
                    )?;
                }
                tx.execute(
                    "INSERT OR IGNORE INTO album_song_map (album_id, song_id, position) VALUES (?1, ?2, ?3)",
                    params![album_id, song.id, position as i64],
                )?;
            }
        }
        LibraryMutation::DeleteAlbum { album_id } => {
            tx.execute(
                "DELETE FROM album_song_map WHERE album_id = ?1",
                params![album_id],
            )?;
            tx.execute(
                "DELETE FROM album_artist_map WHERE album_id = ?1",
                params![album_id],
            )?;
            tx.execute("DELETE FROM albums WHERE id = ?1", params![album_id])?;
        }
        LibraryMutation::Batch(mutations) => {
            for m in mutations {
                apply_in_tx(tx, m)?;
            }
        }
    }
    Ok(())
}

impl LibraryStore for SqliteLibraryStore {
    fn songs(&self, sort: SongSortType, descending: bool) -> LiveList<Song> {
        self.live_songs(
            "songs",
            "WHERE s.in_library IS NOT NULL",
            order_by_clause(sort.order_expr(), descending, "s.rowid"),
            Vec::new(),
        )
    }

    fn liked_songs(&self, sort: SongSortType, descending: bool) -> LiveList<Song> {
        self.live_songs(
            "liked_songs",
            "WHERE s.liked = 1",
            order_by_clause(sort.order_expr(), descending, "s.rowid"),
            Vec::new(),
        )
    }

    fn all_songs(&self) -> LiveList<Song> {
        self.live_songs("all_songs", "", "ORDER BY s.rowid ASC".to_string(), Vec::new())
    }

    fn artist_songs(
        &self,
        artist_id: &str,
        sort: ArtistSongSortType,
        descending: bool,
    ) -> LiveList<Song> {
        self.live_songs(
            "artist_songs",
            "WHERE s.in_library IS NOT NULL AND s.id IN \
             (SELECT song_id FROM song_artist_map WHERE artist_id = ?1)",
            order_by_clause(sort.order_expr(), descending, "s.rowid"),
            vec![artist_id.to_string()],
        )
    }

    fn most_played_songs(&self, limit: usize) -> LiveList<Song> {
        self.live_songs(
            "most_played_songs",
            "WHERE s.total_play_time > 0",
            format!("ORDER BY s.total_play_time DESC, s.rowid ASC LIMIT {}", limit),
            Vec::new(),
        )
    }

    fn artists(&self, sort: ArtistSortType, descending: bool) -> LiveList<Artist> {
        self.live_artists("artists", "", sort, descending)
    }

    fn bookmarked_artists(&self, sort: ArtistSortType, descending: bool) -> LiveList<Artist> {
        self.live_artists(
            "bookmarked_artists",
            "WHERE a.bookmarked_at IS NOT NULL",
            sort,
            descending,
        )
    }

    fn artist(&self, id: &str) -> LiveQuery<Option<Artist>> {
        let id = id.to_string();
        self.live("artist", move |conn| {
            let sql = format!("{} WHERE a.id = ?1", ARTIST_SELECT);
            let mut artists = query_artists(conn, &sql, &[&id as &dyn ToSql])?;
            Ok(artists.pop())
        })
    }

    fn albums(&self, sort: AlbumSortType, descending: bool) -> LiveList<Album> {
        self.live_albums("albums", "", sort, descending)
    }

    fn liked_albums(&self, sort: AlbumSortType, descending: bool) -> LiveList<Album> {
        self.live_albums("liked_albums", "WHERE al.liked = 1", sort, descending)
    }

    fn playlists(&self, sort: PlaylistSortType, descending: bool) -> LiveList<Playlist> {
        self.live("playlists", move |conn| {
            let sql = format!(
                "{} {}",
                PLAYLIST_SELECT,
                order_by_clause(sort.order_expr(), descending, "p.rowid")
            );
            query_playlists(conn, &sql)
        })
    }

    fn apply(&self, mutation: LibraryMutation) -> Result<()> {
        {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;
            apply_in_tx(&tx, &mutation)
                .with_context(|| format!("Failed to apply {}", mutation.name()))?;
            tx.commit()?;
        }
        self.invalidation.invalidate();
        Ok(())
    }
}

impl SqliteLibraryStore {
    /// Whether an album row exists, outside of any live query.
    pub fn album_exists(&self, album_id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM albums WHERE id = ?1",
                params![album_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{AlbumPage, AlbumPageSong, ArtistPage};
    use chrono::Duration;
    use futures::StreamExt;
    use tempfile::TempDir;

    fn artist_ref(id: &str, name: &str) -> ArtistRef {
        ArtistRef {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    fn song(id: &str, title: &str, artists: Vec<ArtistRef>, play_time: i64, age_days: i64) -> Song {
        let created = Utc::now() - Duration::days(age_days);
        Song {
            id: id.to_string(),
            title: title.to_string(),
            artists,
            album_id: None,
            duration: 200,
            total_play_time: play_time,
            liked: false,
            in_library: Some(created),
            create_date: created,
        }
    }

    fn album(id: &str, title: &str, song_count: i32) -> Album {
        Album {
            id: id.to_string(),
            title: title.to_string(),
            year: Some(2020),
            thumbnail_url: None,
            song_count,
            duration: 0,
            liked: false,
            artists: vec![artist_ref("ar1", "Band")],
            create_date: Utc::now(),
            last_update_time: Utc::now(),
        }
    }

    async fn first<T>(mut live: LiveQuery<T>) -> T {
        live.next().await.unwrap()
    }

    #[tokio::test]
    async fn test_songs_ordered_by_store() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        store
            .apply(LibraryMutation::Batch(vec![
                LibraryMutation::UpsertSong(song(
                    "s1",
                    "Beta",
                    vec![artist_ref("a1", "Zed")],
                    50,
                    3,
                )),
                LibraryMutation::UpsertSong(song(
                    "s2",
                    "Alpha",
                    vec![artist_ref("a2", "Amy")],
                    10,
                    1,
                )),
                LibraryMutation::UpsertSong(song(
                    "s3",
                    "Gamma",
                    vec![artist_ref("a1", "Zed")],
                    30,
                    2,
                )),
            ]))
            .unwrap();

        let ids = |songs: Vec<Song>| songs.into_iter().map(|s| s.id).collect::<Vec<_>>();

        let by_date_desc = first(store.songs(SongSortType::CreateDate, true)).await;
        assert_eq!(ids(by_date_desc), vec!["s2", "s3", "s1"]);

        let by_name_asc = first(store.songs(SongSortType::Name, false)).await;
        assert_eq!(ids(by_name_asc), vec!["s2", "s1", "s3"]);

        let by_artist_asc = first(store.songs(SongSortType::Artist, false)).await;
        assert_eq!(ids(by_artist_asc), vec!["s2", "s1", "s3"]);

        let by_play_time_desc = first(store.songs(SongSortType::PlayTime, true)).await;
        assert_eq!(ids(by_play_time_desc), vec!["s1", "s3", "s2"]);
    }

    #[tokio::test]
    async fn test_song_artists_keep_credit_order() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        store
            .apply(LibraryMutation::UpsertSong(song(
                "s1",
                "Duet",
                vec![artist_ref("a2", "Second"), artist_ref("a1", "First")],
                0,
                0,
            )))
            .unwrap();

        let songs = first(store.all_songs()).await;
        assert_eq!(songs[0].joined_artist_names(), "SecondFirst");
    }

    #[tokio::test]
    async fn test_liked_songs_update_live() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        store
            .apply(LibraryMutation::UpsertSong(song("s1", "One", vec![], 0, 0)))
            .unwrap();

        let mut liked = store.liked_songs(SongSortType::CreateDate, true);
        assert!(liked.next().await.unwrap().is_empty());

        store
            .apply(LibraryMutation::SetSongLiked {
                song_id: "s1".to_string(),
                liked: true,
            })
            .unwrap();
        let after = liked.next().await.unwrap();
        assert_eq!(after.len(), 1);
        assert!(after[0].liked);
    }

    #[tokio::test]
    async fn test_refresh_artist_replaces_metadata() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        store
            .apply(LibraryMutation::UpsertSong(song(
                "s1",
                "One",
                vec![artist_ref("a1", "Old")],
                0,
                0,
            )))
            .unwrap();

        let refreshed_at = Utc::now();
        store
            .apply(LibraryMutation::RefreshArtist {
                artist_id: "a1".to_string(),
                page: ArtistPage {
                    id: "a1".to_string(),
                    name: "New".to_string(),
                    thumbnail_url: Some("http://img/a1".to_string()),
                },
                refreshed_at,
            })
            .unwrap();

        let artist = first(store.artist("a1")).await.unwrap();
        assert_eq!(artist.name, "New");
        assert_eq!(artist.thumbnail_url.as_deref(), Some("http://img/a1"));
        assert_eq!(
            artist.last_update_time.timestamp_millis(),
            refreshed_at.timestamp_millis()
        );
        assert_eq!(artist.song_count, 1);
    }

    #[tokio::test]
    async fn test_refresh_album_replaces_songs_and_count() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        store.apply(LibraryMutation::UpsertAlbum(album("al1", "Draft", 0))).unwrap();

        store
            .apply(LibraryMutation::RefreshAlbum {
                album_id: "al1".to_string(),
                page: AlbumPage {
                    id: "al1".to_string(),
                    title: "Final".to_string(),
                    year: Some(2021),
                    thumbnail_url: Some("http://img/al1".to_string()),
                    artists: vec![artist_ref("ar2", "Other Band")],
                    songs: vec![
                        AlbumPageSong {
                            id: "t1".to_string(),
                            title: "Track 1".to_string(),
                            artists: vec![artist_ref("ar2", "Other Band")],
                            duration: 100,
                        },
                        AlbumPageSong {
                            id: "t2".to_string(),
                            title: "Track 2".to_string(),
                            artists: vec![],
                            duration: 120,
                        },
                    ],
                },
                refreshed_at: Utc::now(),
            })
            .unwrap();

        let albums = first(store.albums(AlbumSortType::CreateDate, true)).await;
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].title, "Final");
        assert_eq!(albums[0].song_count, 2);
        assert_eq!(albums[0].duration, 220);
        assert_eq!(albums[0].artists, vec![artist_ref("ar2", "Other Band")]);

        let songs = first(store.all_songs()).await;
        assert_eq!(songs.len(), 2);
        assert!(songs.iter().all(|s| s.album_id.as_deref() == Some("al1")));
        // Album page songs are known but not part of the library
        assert!(first(store.songs(SongSortType::CreateDate, true)).await.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_missing_album_is_noop() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        store
            .apply(LibraryMutation::RefreshAlbum {
                album_id: "gone".to_string(),
                page: AlbumPage {
                    id: "gone".to_string(),
                    title: "Gone".to_string(),
                    year: None,
                    thumbnail_url: None,
                    artists: vec![],
                    songs: vec![],
                },
                refreshed_at: Utc::now(),
            })
            .unwrap();
        assert!(!store.album_exists("gone").unwrap());
    }

    #[tokio::test]
    async fn test_delete_album() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        store.apply(LibraryMutation::UpsertAlbum(album("al1", "A", 0))).unwrap();
        assert!(store.album_exists("al1").unwrap());

        store
            .apply(LibraryMutation::DeleteAlbum {
                album_id: "al1".to_string(),
            })
            .unwrap();
        assert!(!store.album_exists("al1").unwrap());
        assert!(first(store.albums(AlbumSortType::Name, false)).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_batch_is_rolled_back() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        let result = store.apply(LibraryMutation::Batch(vec![
            LibraryMutation::UpsertAlbum(album("al1", "A", 0)),
            // Unknown song violates the playlist foreign key
            LibraryMutation::UpsertPlaylist {
                playlist: Playlist {
                    id: "p1".to_string(),
                    name: "P".to_string(),
                    song_count: 0,
                    create_date: Utc::now(),
                },
                song_ids: vec!["missing".to_string()],
            },
        ]));
        assert!(result.is_err());
        assert!(!store.album_exists("al1").unwrap());
    }

    #[tokio::test]
    async fn test_playlists_sorted_by_song_count() {
        let store = SqliteLibraryStore::in_memory().unwrap();
        let playlist = |id: &str| Playlist {
            id: id.to_string(),
            name: id.to_string(),
            song_count: 0,
            create_date: Utc::now(),
        };
        store
            .apply(LibraryMutation::Batch(vec![
                LibraryMutation::UpsertSong(song("s1", "One", vec![], 0, 0)),
                LibraryMutation::UpsertSong(song("s2", "Two", vec![], 0, 0)),
                LibraryMutation::UpsertPlaylist {
                    playlist: playlist("small"),
                    song_ids: vec!["s1".to_string()],
                },
                LibraryMutation::UpsertPlaylist {
                    playlist: playlist("big"),
                    song_ids: vec!["s1".to_string(), "s2".to_string()],
                },
            ]))
            .unwrap();

        let playlists = first(store.playlists(PlaylistSortType::SongCount, true)).await;
        assert_eq!(playlists[0].id, "big");
        assert_eq!(playlists[0].song_count, 2);
        assert_eq!(playlists[1].id, "small");
    }

    #[tokio::test]
    async fn test_reopen_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("library.db");
        {
            let store = SqliteLibraryStore::new(&db_path).unwrap();
            store.apply(LibraryMutation::UpsertAlbum(album("al1", "A", 3))).unwrap();
        }
        let store = SqliteLibraryStore::new(&db_path).unwrap();
        assert!(store.album_exists("al1").unwrap());
    }
}
