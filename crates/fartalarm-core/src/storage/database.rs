//! SQLite-backed persistence.
//!
//! Provides persistent storage for:
//! - The app state, as one JSON document in the key-value table
//! - Custom sound recordings, as blobs

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, StateStore, STATE_KEY};
use crate::error::{CoreError, DatabaseError, Result};
use crate::sound::{CustomSound, CustomSoundStore};
use crate::state::AppState;

/// SQLite database for app state and recordings.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/fartalarm/fartalarm.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("fartalarm.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS custom_sounds (
                id           TEXT PRIMARY KEY,
                name         TEXT NOT NULL,
                mime_type    TEXT NOT NULL,
                duration     REAL NOT NULL DEFAULT 0,
                date_created TEXT NOT NULL,
                audio        BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_custom_sounds_date_created ON custom_sounds(date_created);",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<bool, rusqlite::Error> {
        let n = self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(n > 0)
    }

    pub fn custom_sound_count(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM custom_sounds", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

type SoundRow = (String, String, String, f64, String, Vec<u8>);

fn sound_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SoundRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_sound((id, name, mime_type, duration, date_created, audio): SoundRow) -> Result<CustomSound> {
    let date_created = DateTime::parse_from_rfc3339(&date_created)
        .map_err(|e| CoreError::Custom(format!("bad date_created on {id}: {e}")))?
        .with_timezone(&Utc);
    Ok(CustomSound {
        id,
        name,
        audio,
        mime_type,
        duration,
        date_created,
    })
}

impl StateStore for Database {
    fn load(&self) -> Result<Option<AppState>> {
        match self.kv_get(STATE_KEY)? {
            Some(json) => Ok(Some(AppState::from_json(&json)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, state: &AppState) -> Result<()> {
        self.kv_set(STATE_KEY, &state.to_json()?)?;
        Ok(())
    }
}

impl CustomSoundStore for Database {
    fn get_all(&self) -> Result<Vec<CustomSound>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, mime_type, duration, date_created, audio
             FROM custom_sounds
             ORDER BY date_created, rowid",
        )?;
        let rows = stmt.query_map([], sound_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(into_sound(row?)?);
        }
        Ok(out)
    }

    fn get(&self, id: &str) -> Result<Option<CustomSound>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, mime_type, duration, date_created, audio
                 FROM custom_sounds WHERE id = ?1",
                params![id],
                sound_from_row,
            )
            .optional()?;
        row.map(into_sound).transpose()
    }

    fn save(&mut self, sound: &CustomSound) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO custom_sounds (id, name, mime_type, duration, date_created, audio)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                sound.id,
                sound.name,
                sound.mime_type,
                sound.duration,
                sound.date_created.to_rfc3339(),
                sound.audio,
            ],
        )?;
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM custom_sounds WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }
}
