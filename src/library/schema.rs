//! SQLite schema for the library database.
//!
//! Entities are keyed by their remote text id. Timestamps are unix epoch
//! milliseconds.

use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
};

const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("album_id", &SqlType::Text),
        sqlite_column!("duration", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "total_play_time",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "liked",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("in_library", &SqlType::Integer), // NULL = not in library
        sqlite_column!("create_date", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_songs_album", "album_id")],
    unique_constraints: &[&["id"]],
};

const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("thumbnail_url", &SqlType::Text),
        sqlite_column!("last_update_time", &SqlType::Integer, non_null = true),
        sqlite_column!("bookmarked_at", &SqlType::Integer),
        sqlite_column!("create_date", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["id"]],
};

const ALBUMS_TABLE: Table = Table {
    name: "albums",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!("title", &SqlType::Text, non_null = true),
        sqlite_column!("year", &SqlType::Integer),
        sqlite_column!("thumbnail_url", &SqlType::Text),
        sqlite_column!("song_count", &SqlType::Integer, non_null = true), // 0 = never fetched
        sqlite_column!("duration", &SqlType::Integer, non_null = true),
        sqlite_column!(
            "liked",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!("create_date", &SqlType::Integer, non_null = true),
        sqlite_column!("last_update_time", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["id"]],
};

const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    columns: &[
        sqlite_column!("rowid", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("id", &SqlType::Text, non_null = true),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("create_date", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["id"]],
};

const SONG_ARTIST_MAP_TABLE: Table = Table {
    name: "song_artist_map",
    columns: &[
        sqlite_column!(
            "song_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "songs",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_song_artist_map_artist", "artist_id")],
    unique_constraints: &[&["song_id", "artist_id"]],
};

const ALBUM_ARTIST_MAP_TABLE: Table = Table {
    name: "album_artist_map",
    columns: &[
        sqlite_column!(
            "album_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "albums",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "artist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "artists",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["album_id", "artist_id"]],
};

const ALBUM_SONG_MAP_TABLE: Table = Table {
    name: "album_song_map",
    columns: &[
        sqlite_column!(
            "album_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "albums",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "song_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "songs",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["album_id", "song_id"]],
};

const PLAYLIST_SONG_MAP_TABLE: Table = Table {
    name: "playlist_song_map",
    columns: &[
        sqlite_column!(
            "playlist_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "playlists",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!(
            "song_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "songs",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const LIBRARY_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        SONGS_TABLE,
        ARTISTS_TABLE,
        ALBUMS_TABLE,
        PLAYLISTS_TABLE,
        SONG_ARTIST_MAP_TABLE,
        ALBUM_ARTIST_MAP_TABLE,
        ALBUM_SONG_MAP_TABLE,
        PLAYLIST_SONG_MAP_TABLE,
    ],
    migration: None,
}];
