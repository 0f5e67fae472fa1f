use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info};

use super::snapshot::PreferenceSnapshot;
use crate::sqlite_column;
use crate::sqlite_persistence::{initialize_schema, Column, SqlType, Table, VersionedSchema};

const PREFERENCES_TABLE: Table = Table {
    name: "preferences",
    columns: &[
        sqlite_column!("key", &SqlType::Text, is_primary_key = true),
        sqlite_column!("value", &SqlType::Text, non_null = true),
        sqlite_column!("updated_at", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

pub const PREFERENCES_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[PREFERENCES_TABLE],
    migration: None,
}];

/// Key-value preference store with a live snapshot.
pub trait PreferenceStore: Send + Sync {
    /// Receiver that always holds the current snapshot, defaults included
    /// implicitly by absence.
    fn subscribe(&self) -> watch::Receiver<PreferenceSnapshot>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

pub struct SqlitePreferenceStore {
    conn: Arc<Mutex<Connection>>,
    snapshot: watch::Sender<PreferenceSnapshot>,
}

impl SqlitePreferenceStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open preferences database {:?}", db_path))?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        initialize_schema(&mut conn, PREFERENCES_VERSIONED_SCHEMAS, "preferences")?;
        let values = Self::load_all(&conn)?;
        info!("Loaded {} stored preferences", values.len());
        let (snapshot, _) = watch::channel(PreferenceSnapshot::new(values));
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            snapshot,
        })
    }

    fn load_all(conn: &Connection) -> Result<HashMap<String, String>> {
        let mut stmt = conn.prepare("SELECT key, value FROM preferences")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<rusqlite::Result<HashMap<_, _>>>()?)
    }

    /// Run `write` and publish the reloaded table as the new snapshot.
    fn write_and_publish<F>(&self, write: F) -> Result<()>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<usize>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow!("preferences db connection mutex poisoned"))?;
        write(&conn)?;
        let values = Self::load_all(&conn)?;
        self.snapshot
            .send_replace(PreferenceSnapshot::new(values));
        Ok(())
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn subscribe(&self) -> watch::Receiver<PreferenceSnapshot> {
        self.snapshot.subscribe()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("Setting preference {} = {}", key, value);
        self.write_and_publish(|conn| {
            conn.execute(
                "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, Utc::now().timestamp_millis()],
            )
        })
        .with_context(|| format!("Failed to set preference {}", key))
    }

    fn remove(&self, key: &str) -> Result<()> {
        debug!("Removing preference {}", key);
        self.write_and_publish(|conn| {
            conn.execute("DELETE FROM preferences WHERE key = ?1", params![key])
        })
        .with_context(|| format!("Failed to remove preference {}", key))
    }
}
