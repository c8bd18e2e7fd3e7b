//! Fixtures shared by unit tests, behaviour tests and benchmarks.
//!
//! Everything here panics on setup failure; none of it is meant for
//! production paths.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tempfile::TempDir;

use panoguess_core::{CandidateGuess, GuessBatch};

use crate::store::{GuessStore, StoreConfig};
use crate::time::TimeProvider;

/// `panoId` whose insert is rejected once [`install_insert_failure`] ran.
pub const FAILING_PANO_ID: &str = "poisoned";

/// A [`TimeProvider`] returning a settable, fixed time.
#[derive(Debug)]
pub struct MockProvider {
    now: RwLock<DateTime<Utc>>,
}

impl MockProvider {
    /// Provider frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Move the clock to `time`.
    pub fn set(&self, time: DateTime<Utc>) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = time;
    }

    /// Advance the clock by `step` and return the new time.
    ///
    /// # Panics
    /// Panics when `step` does not fit a `chrono::TimeDelta`.
    pub fn inc(&self, step: Duration) -> DateTime<Utc> {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += chrono::TimeDelta::from_std(step).expect("step fits a TimeDelta");
        *now
    }
}

impl TimeProvider for MockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A [`GuessStore`] on a database file inside a temporary directory.
///
/// The directory is removed on drop, after the store is closed.
#[derive(Debug)]
pub struct TempStore {
    store: Option<GuessStore>,
    path: Utf8PathBuf,
    _dir: TempDir,
}

impl TempStore {
    /// Open a fresh, empty store.
    ///
    /// # Panics
    /// Panics when the directory or database cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("data.sqlite"))
            .expect("temp dir path is UTF-8");
        let store = GuessStore::open(&StoreConfig {
            path: path.clone(),
            busy_timeout: Duration::from_secs(10),
        })
        .expect("open temp store");
        Self {
            store: Some(store),
            path,
            _dir: dir,
        }
    }

    /// The open store.
    ///
    /// # Panics
    /// Panics after [`TempStore::close`].
    #[must_use]
    pub fn store(&self) -> &GuessStore {
        self.store.as_ref().expect("store is open")
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Close the store, keeping the file for reopening.
    ///
    /// # Panics
    /// Panics when closing fails.
    pub fn close(&mut self) {
        if let Some(store) = self.store.take() {
            store.close().expect("close temp store");
        }
    }

    /// Close and reopen the store on the same file.
    ///
    /// # Panics
    /// Panics when closing or reopening fails.
    pub fn reopen(&mut self) {
        self.close();
        self.store = Some(GuessStore::open_path(self.path.clone()).expect("reopen temp store"));
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a validated guess.
#[must_use]
pub fn guess(
    pano_id: &str,
    clicked_lat: f64,
    clicked_lng: f64,
    actual_lat: f64,
    actual_lng: f64,
) -> CandidateGuess {
    CandidateGuess {
        pano_id: pano_id.to_owned(),
        clicked_lat,
        clicked_lng,
        actual_lat,
        actual_lng,
    }
}

/// A batch of `size` guesses whose clicked latitude steps by one degree.
///
/// # Panics
/// Panics when `size` is zero.
#[must_use]
pub fn stepped_batch(prefix: &str, size: usize) -> GuessBatch {
    let guesses = (0..size)
        .map(|step| {
            let offset = f64::from(u32::try_from(step).unwrap_or(u32::MAX));
            guess(&format!("{prefix}-{step}"), offset, 0.0, 0.0, 0.0)
        })
        .collect();
    GuessBatch::new(guesses).expect("batch size is non-zero")
}

/// Make every insert of [`FAILING_PANO_ID`] abort.
///
/// The trigger is created through a separate connection so the store under
/// test sees it as an ordinary schema change.
///
/// # Panics
/// Panics when the trigger cannot be created.
pub fn install_insert_failure(path: &Utf8Path) {
    let connection = Connection::open(path.as_std_path()).expect("open database for trigger");
    connection
        .execute_batch(&format!(
            "CREATE TRIGGER IF NOT EXISTS fail_poisoned_insert
             BEFORE INSERT ON items
             WHEN NEW.panoId = '{FAILING_PANO_ID}'
             BEGIN
                 SELECT RAISE(ABORT, 'simulated insert failure');
             END;"
        ))
        .expect("install failure trigger");
}

/// Number of committed rows, read through a fresh connection.
///
/// # Panics
/// Panics when the count query fails.
#[must_use]
pub fn row_count(store: &GuessStore) -> i64 {
    let connection = Connection::open(store.path().as_std_path()).expect("open database");
    connection
        .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
        .expect("count rows")
}
