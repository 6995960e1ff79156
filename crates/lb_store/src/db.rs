//! Database handle over SQLite via sqlx.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use tracing::debug;

use crate::error::StoreError;

/// Central store handle.  Cheap to clone (the pool is an `Arc` internally);
/// the owner decides its lifetime, there is no process-wide instance.
#[derive(Clone)]
pub struct Store {
    pub pool: SqlitePool,
}

impl Store {
    /// Open (or create) the SQLite database at `db_path`.
    /// Runs all pending migrations automatically.
    ///
    /// WAL journal mode and foreign-key enforcement are set on the connection
    /// options, not in a migration: SQLite refuses to change `journal_mode`
    /// inside the transaction sqlx wraps each migration in.
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePool::connect_with(opts).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        debug!(path = %db_path.display(), "store opened");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Remove the database file and its WAL/SHM side files.
    /// Missing files are not an error, so dropping twice is fine.
    pub fn destroy(db_path: &Path) -> Result<(), StoreError> {
        for path in [
            db_path.to_path_buf(),
            side_file(db_path, "-wal"),
            side_file(db_path, "-shm"),
        ] {
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StoreError::Invalid(format!(
                        "cannot remove {}: {e}",
                        path.display()
                    )))
                }
            }
        }
        Ok(())
    }
}

fn side_file(db_path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(db_path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
