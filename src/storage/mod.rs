//! Storage Layer
//!
//! Handles persistence of captured snaps using SQLite. The capture pipeline
//! talks to the [`SnapStore`] trait; [`SqliteSnapStore`] is the production
//! implementation.

pub mod database;
pub mod snap;

use anyhow::Result;
use std::path::PathBuf;
use thiserror::Error;

pub use database::SqliteSnapStore;
pub use snap::CapturedSnap;

/// Failure reading or writing the snap store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored row could not be turned back into a snap
    #[error("invalid record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },
    #[error("database schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i32, supported: i32 },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Write/read contract of the snap store
///
/// Snaps are only ever inserted or deleted whole. Inserting a snap whose id is
/// already stored is a no-op, so retrying an insert never duplicates a record.
pub trait SnapStore: Send + Sync {
    /// Insert a snap in a single atomic write
    fn insert(&self, snap: &CapturedSnap) -> Result<(), StoreError>;

    /// Number of stored snaps
    fn count(&self) -> Result<usize, StoreError>;

    /// Delete a snap by id, returning whether it existed
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// All snaps, newest first
    fn list_all(&self) -> Result<Vec<CapturedSnap>, StoreError>;

    /// Delete every snap, returning how many were removed
    fn clear(&self) -> Result<usize, StoreError>;
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "placesnap", "PlaceSnap")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Get the application data directory
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = project_dirs()?.data_dir().to_path_buf();
    std::fs::create_dir_all(&data_dir)?;

    Ok(data_dir)
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = project_dirs()?.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}
