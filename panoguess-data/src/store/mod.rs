//! The shared SQLite store holding persisted guesses.
//!
//! A [`GuessStore`] is opened once at startup and closed on shutdown. It owns
//! two connections to the same WAL-mode database: a writer, so write
//! transactions are serialized, and a read-only reader, so list queries run
//! alongside a write and only ever observe committed rows.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

mod schema;

pub use schema::{GUESS_TABLE, initialise_schema};

/// Default database file, relative to the working directory.
pub const DEFAULT_DATABASE_PATH: &str = "data.sqlite";

/// Default time a connection waits on a locked database.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised while opening, configuring or closing the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to create the parent directory for the database file.
    #[error("failed to create parent directory for {path}: {source}")]
    CreateDirectory {
        /// Database path whose parent could not be created.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening a connection failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    Open {
        /// Database path.
        path: Utf8PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Applying a connection setting failed.
    #[error("failed to configure SQLite {setting}: {source}")]
    Configure {
        /// Name of the setting.
        setting: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the guess table failed.
    #[error("failed to create table {table:?}: {source}")]
    CreateSchema {
        /// Table being created.
        table: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Closing a connection failed.
    #[error("failed to close the {role} connection: {source}")]
    Close {
        /// Which connection failed to close.
        role: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// Settings used when opening a [`GuessStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Location of the SQLite database file.
    pub path: Utf8PathBuf,
    /// How long a connection waits on a lock held by another connection.
    pub busy_timeout: Duration,
}

impl StoreConfig {
    /// Configuration for the database at `path` with default timeouts.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE_PATH)
    }
}

/// Durable, shareable store of guess records.
///
/// `GuessStore` is `Send + Sync`; share it behind an `Arc` between request
/// handlers.
pub struct GuessStore {
    path: Utf8PathBuf,
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl std::fmt::Debug for GuessStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuessStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Poisoned connection lock; the holder panicked mid-operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LockPoisoned;

impl GuessStore {
    /// Open (creating if needed) the database described by `config`.
    ///
    /// The parent directory is created, WAL journaling is enabled and the
    /// guess table is bootstrapped before the read connection is attached.
    ///
    /// # Errors
    /// Returns [`StoreError`] when any of those steps fail.
    ///
    /// # Examples
    /// ```no_run
    /// use panoguess_data::{GuessStore, StoreConfig};
    ///
    /// # fn main() -> Result<(), panoguess_data::StoreError> {
    /// let store = GuessStore::open(&StoreConfig::new("data.sqlite"))?;
    /// store.close()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let path = config.path.clone();
        panoguess_fs::ensure_parent_dir(&path).map_err(|source| StoreError::CreateDirectory {
            path: path.clone(),
            source,
        })?;

        let writer = open_connection(&path, OpenFlags::default())?;
        configure(&writer, config.busy_timeout)?;
        writer
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(|source| StoreError::Configure {
                setting: "journal_mode",
                source,
            })?;
        initialise_schema(&writer)?;

        let reader = open_connection(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        configure(&reader, config.busy_timeout)?;

        info!("Connected to the SQLite database at {path}");
        Ok(Self {
            path,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }

    /// Open the database at `path` with default settings.
    ///
    /// # Errors
    /// See [`GuessStore::open`].
    pub fn open_path(path: impl Into<Utf8PathBuf>) -> Result<Self, StoreError> {
        Self::open(&StoreConfig::new(path))
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Close both connections, reporting the first failure.
    ///
    /// # Errors
    /// Returns [`StoreError::Close`] when SQLite refuses to close a
    /// connection.
    pub fn close(self) -> Result<(), StoreError> {
        let reader = self
            .reader
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let writer = self
            .writer
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let reader_closed = reader.close().map_err(|(_, source)| StoreError::Close {
            role: "reader",
            source,
        });
        let writer_closed = writer.close().map_err(|(_, source)| StoreError::Close {
            role: "writer",
            source,
        });
        reader_closed.and(writer_closed)?;
        info!("Database connection closed.");
        Ok(())
    }

    pub(crate) fn lock_writer(&self) -> Result<MutexGuard<'_, Connection>, LockPoisoned> {
        self.writer.lock().map_err(|_| LockPoisoned)
    }

    pub(crate) fn lock_reader(&self) -> Result<MutexGuard<'_, Connection>, LockPoisoned> {
        self.reader.lock().map_err(|_| LockPoisoned)
    }
}

fn open_connection(path: &Utf8Path, flags: OpenFlags) -> Result<Connection, StoreError> {
    Connection::open_with_flags(path.as_std_path(), flags).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })
}

fn configure(connection: &Connection, busy_timeout: Duration) -> Result<(), StoreError> {
    connection
        .busy_timeout(busy_timeout)
        .map_err(|source| StoreError::Configure {
            setting: "busy_timeout",
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("create temp dir")
    }

    fn db_path(dir: &TempDir, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(name)).expect("utf-8 path")
    }

    #[rstest]
    fn opening_creates_the_guess_table(temp_dir: TempDir) {
        let path = db_path(&temp_dir, "data.sqlite");
        let store = GuessStore::open_path(path.clone()).expect("open store");
        store.close().expect("close store");

        let conn = Connection::open(path.as_std_path()).expect("open database");
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [GUESS_TABLE],
                |row| row.get(0),
            )
            .expect("inspect schema");
        assert_eq!(tables, 1);
    }

    #[rstest]
    fn opening_enables_wal(temp_dir: TempDir) {
        let store = GuessStore::open_path(db_path(&temp_dir, "data.sqlite")).expect("open store");
        let mode: String = store
            .lock_writer()
            .expect("writer lock")
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("read journal mode");
        assert_eq!(mode.to_ascii_lowercase(), "wal");
    }

    #[rstest]
    fn opening_creates_missing_directories(temp_dir: TempDir) {
        let path = db_path(&temp_dir, "nested/dir/data.sqlite");
        let store = GuessStore::open_path(path.clone()).expect("open nested store");
        assert_eq!(store.path(), path.as_path());
        assert!(path.exists());
    }

    #[rstest]
    fn reopening_is_idempotent(temp_dir: TempDir) {
        let path = db_path(&temp_dir, "data.sqlite");
        GuessStore::open_path(path.clone())
            .expect("first open")
            .close()
            .expect("first close");
        GuessStore::open_path(path)
            .expect("second open")
            .close()
            .expect("second close");
    }

    #[rstest]
    fn reader_connection_rejects_writes(temp_dir: TempDir) {
        let store = GuessStore::open_path(db_path(&temp_dir, "data.sqlite")).expect("open store");
        let result = store.lock_reader().expect("reader lock").execute(
            "INSERT INTO items (panoId, clickedLat, clickedLng, actualLat, actualLng, distance)
             VALUES ('x', 0, 0, 0, 0, 0)",
            [],
        );
        assert!(result.is_err(), "reader must be read-only");
    }

    #[rstest]
    fn store_is_shareable_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GuessStore>();
    }
}
