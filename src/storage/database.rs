//! SQLite database for persistent storage

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row, Transaction};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{CapturedSnap, SnapStore, StoreError};

const CURRENT_SCHEMA_VERSION: i32 = 1;

const SCHEMA_V1: &str = "
CREATE TABLE IF NOT EXISTS snaps (
    id              TEXT PRIMARY KEY NOT NULL,
    image_reference TEXT NOT NULL,
    recognized_text TEXT NOT NULL,
    pinyin          TEXT NOT NULL,
    latitude        REAL,
    longitude       REAL,
    address         TEXT,
    translation     TEXT NOT NULL,
    maps_link       TEXT,
    created_at      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_snaps_created_at ON snaps (created_at);
";

const SNAP_COLUMNS: &str = "id, image_reference, recognized_text, pinyin, latitude, longitude, \
                            address, translation, maps_link, created_at";

/// Snap store backed by a single SQLite connection
///
/// Writes are serialized through the connection mutex.
pub struct SqliteSnapStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteSnapStore {
    /// Open or create the database at path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut conn = Connection::open(path)?;
        if let Err(err) = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        }) {
            warn!("Failed to enable WAL mode: {err}");
        }
        run_migrations(&mut conn)?;

        info!("Snap database opened at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut conn = Connection::open_in_memory()?;
        run_migrations(&mut conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file, or `None` for an in-memory store
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Look up a single snap
    pub fn get(&self, id: &str) -> Result<Option<CapturedSnap>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {SNAP_COLUMNS} FROM snaps WHERE id = ?1"))?;
        let row = stmt.query_map(params![id], SnapRow::from_row)?.next().transpose()?;

        row.map(SnapRow::into_snap).transpose()
    }
}

impl SnapStore for SqliteSnapStore {
    fn insert(&self, snap: &CapturedSnap) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            &format!(
                "INSERT INTO snaps ({SNAP_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(id) DO NOTHING"
            ),
            params![
                snap.id,
                snap.image_reference,
                snap.recognized_text,
                snap.pinyin,
                snap.latitude,
                snap.longitude,
                snap.address,
                snap.translation,
                snap.maps_link,
                format_timestamp(&snap.created_at),
            ],
        )?;

        if inserted == 0 {
            debug!("Snap {} already stored, insert skipped", snap.id);
        }
        Ok(())
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM snaps", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM snaps WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn list_all(&self) -> Result<Vec<CapturedSnap>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SNAP_COLUMNS} FROM snaps ORDER BY created_at DESC, rowid DESC"
        ))?;

        let rows = stmt
            .query_map([], SnapRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(SnapRow::into_snap).collect()
    }

    fn clear(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM snaps", [])?;
        info!("Cleared {} snaps", deleted);
        Ok(deleted)
    }
}

/// Raw column values, before timestamp parsing
struct SnapRow {
    id: String,
    image_reference: String,
    recognized_text: String,
    pinyin: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<String>,
    translation: String,
    maps_link: Option<String>,
    created_at: String,
}

impl SnapRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            image_reference: row.get(1)?,
            recognized_text: row.get(2)?,
            pinyin: row.get(3)?,
            latitude: row.get(4)?,
            longitude: row.get(5)?,
            address: row.get(6)?,
            translation: row.get(7)?,
            maps_link: row.get(8)?,
            created_at: row.get(9)?,
        })
    }

    fn into_snap(self) -> Result<CapturedSnap, StoreError> {
        let created_at = parse_timestamp(&self.created_at).map_err(|reason| StoreError::InvalidRecord {
            id: self.id.clone(),
            reason,
        })?;

        Ok(CapturedSnap {
            id: self.id,
            image_reference: self.image_reference,
            recognized_text: self.recognized_text,
            pinyin: self.pinyin,
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address,
            translation: self.translation,
            maps_link: self.maps_link,
            created_at,
        })
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| format!("invalid timestamp '{value}': {err}"))
}

fn run_migrations(conn: &mut Connection) -> Result<(), StoreError> {
    let mut version: i32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchema {
            found: version,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn.transaction()?;
    while version < CURRENT_SCHEMA_VERSION {
        version += 1;
        apply_migration(&tx, version)?;
        debug!("Applied snap schema migration {}", version);
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)?;
    tx.commit()?;

    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> Result<(), StoreError> {
    match version {
        1 => tx.execute_batch(SCHEMA_V1)?,
        other => {
            return Err(StoreError::UnsupportedSchema {
                found: other,
                supported: CURRENT_SCHEMA_VERSION,
            })
        }
    }
    Ok(())
}
