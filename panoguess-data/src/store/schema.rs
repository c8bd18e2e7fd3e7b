//! Idempotent bootstrap of the guess table.

use log::info;
use rusqlite::Connection;

use super::StoreError;

/// Name of the table holding guess records.
pub const GUESS_TABLE: &str = "items";

/// Create the guess table when it does not exist yet.
///
/// Existing tables are left untouched, so opening a database written by an
/// earlier run keeps its rows.
///
/// # Errors
/// Returns [`StoreError::CreateSchema`] when SQLite rejects the statement.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use panoguess_data::initialise_schema;
///
/// let conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&conn).expect("create schema");
/// initialise_schema(&conn).expect("second run is a no-op");
/// let count: i64 = conn
///     .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
///     .expect("query items");
/// assert_eq!(count, 0);
/// ```
pub fn initialise_schema(connection: &Connection) -> Result<(), StoreError> {
    connection
        .execute(
            "CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                panoId TEXT NOT NULL,
                clickedLat REAL NOT NULL,
                clickedLng REAL NOT NULL,
                actualLat REAL NOT NULL,
                actualLng REAL NOT NULL,
                distance REAL NOT NULL,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )
        .map_err(|source| StoreError::CreateSchema {
            table: GUESS_TABLE,
            source,
        })?;
    info!("Table {GUESS_TABLE:?} is ready or already exists.");
    Ok(())
}
