//! Filtered reads over committed guesses.
//!
//! Reads go through the store's read-only connection, so they never wait on
//! an in-flight ingest and never observe its uncommitted rows.

use log::debug;
use rusqlite::{Connection, Row, params_from_iter};
use thiserror::Error;

use panoguess_core::{
    CoordinatePair, GuessFilter, GuessRecord, ListOutput, ListParams, ListQuery,
    QueryParameterError, parse_timestamp,
};

use crate::store::GuessStore;

mod sql;

use sql::{CompiledQuery, SELECT_PAIRS, SELECT_RECORDS, compile};

/// Failures while reading from the store.
#[derive(Debug, Error)]
pub enum QueryExecutionError {
    /// The reader connection lock was poisoned by a panicking holder.
    #[error("Database query error: reader is unavailable after an earlier panic")]
    ReaderPoisoned,
    /// SQLite rejected the query text.
    #[error("Database query error: {source}")]
    Prepare {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Running the query or reading a row failed.
    #[error("Database query error: {source}")]
    Execute {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored timestamp is in neither supported format.
    #[error("Database query error: row {id} has unreadable timestamp {value:?}")]
    InvalidTimestamp {
        /// Id of the offending row.
        id: i64,
        /// Stored text.
        value: String,
    },
    /// A row has a `NULL` timestamp.
    #[error("Database query error: row {id} has no timestamp")]
    MissingTimestamp {
        /// Id of the offending row.
        id: i64,
    },
}

/// Failures of a list request: bad parameters, then execution.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A filter value could not be parsed; the store was not queried.
    #[error(transparent)]
    Parameter(#[from] QueryParameterError),
    /// The store failed while answering.
    #[error(transparent)]
    Execution(#[from] QueryExecutionError),
}

/// Answers list requests against a [`GuessStore`].
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    store: &'a GuessStore,
}

impl<'a> QueryEngine<'a> {
    /// Engine reading from `store`.
    #[must_use]
    pub fn new(store: &'a GuessStore) -> Self {
        Self { store }
    }

    /// Parse raw parameters and run the resulting query.
    ///
    /// # Errors
    /// Returns [`QueryError::Parameter`] before touching the store when a
    /// filter value does not parse, or [`QueryError::Execution`] when the
    /// read fails.
    ///
    /// # Examples
    /// ```no_run
    /// use panoguess_core::ListParams;
    /// use panoguess_data::{GuessStore, QueryEngine};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = GuessStore::open_path("data.sqlite")?;
    /// let params = ListParams {
    ///     min_distance: Some("100".into()),
    ///     ..ListParams::default()
    /// };
    /// let rows = QueryEngine::new(&store).list_params(&params)?;
    /// println!("{}", serde_json::to_string(&rows)?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn list_params(&self, params: &ListParams) -> Result<ListOutput, QueryError> {
        let query = ListQuery::parse(params)?;
        Ok(self.list(&query)?)
    }

    /// Run a parsed list query and shape its rows.
    ///
    /// # Errors
    /// Returns [`QueryExecutionError`] when the read fails.
    pub fn list(&self, query: &ListQuery) -> Result<ListOutput, QueryExecutionError> {
        let records = self.records(&query.filter)?;
        Ok(ListOutput::shape(records, query.format))
    }

    /// Full records matching `filter`, in ascending id order.
    ///
    /// # Errors
    /// Returns [`QueryExecutionError`] when the read fails or a row cannot
    /// be decoded.
    pub fn records(&self, filter: &GuessFilter) -> Result<Vec<GuessRecord>, QueryExecutionError> {
        let compiled = compile(SELECT_RECORDS, filter);
        let connection = self.reader()?;
        let raw = fetch(&connection, &compiled, RawRecord::from_row)?;
        raw.into_iter().map(RawRecord::into_record).collect()
    }

    /// `[clickedLat, clickedLng]` of every record, ignoring all filters.
    ///
    /// # Errors
    /// Returns [`QueryExecutionError`] when the read fails.
    pub fn shortlist(&self) -> Result<Vec<CoordinatePair>, QueryExecutionError> {
        let compiled = CompiledQuery {
            sql: SELECT_PAIRS.to_owned(),
            params: Vec::new(),
        };
        let connection = self.reader()?;
        fetch(&connection, &compiled, |row| {
            Ok(CoordinatePair(row.get(0)?, row.get(1)?))
        })
    }

    /// Number of committed records.
    ///
    /// # Errors
    /// Returns [`QueryExecutionError`] when the read fails.
    pub fn count(&self) -> Result<i64, QueryExecutionError> {
        self.reader()?
            .query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
            .map_err(|source| QueryExecutionError::Execute { source })
    }

    fn reader(&self) -> Result<std::sync::MutexGuard<'a, Connection>, QueryExecutionError> {
        self.store
            .lock_reader()
            .map_err(|_| QueryExecutionError::ReaderPoisoned)
    }
}

fn fetch<T, F>(
    connection: &Connection,
    query: &CompiledQuery,
    map: F,
) -> Result<Vec<T>, QueryExecutionError>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    debug!("Executing query: {} with params {:?}", query.sql, query.params);
    let mut statement = connection
        .prepare(&query.sql)
        .map_err(|source| QueryExecutionError::Prepare { source })?;
    let rows = statement
        .query_map(params_from_iter(query.params.iter()), map)
        .map_err(|source| QueryExecutionError::Execute { source })?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|source| QueryExecutionError::Execute { source })
}

/// A row as stored, before its timestamp is interpreted.
struct RawRecord {
    id: i64,
    pano_id: String,
    clicked_lat: f64,
    clicked_lng: f64,
    actual_lat: f64,
    actual_lng: f64,
    distance: f64,
    timestamp: Option<String>,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            pano_id: row.get(1)?,
            clicked_lat: row.get(2)?,
            clicked_lng: row.get(3)?,
            actual_lat: row.get(4)?,
            actual_lng: row.get(5)?,
            distance: row.get(6)?,
            timestamp: row.get(7)?,
        })
    }

    fn into_record(self) -> Result<GuessRecord, QueryExecutionError> {
        let id = self.id;
        let raw = self
            .timestamp
            .ok_or(QueryExecutionError::MissingTimestamp { id })?;
        let Some(timestamp) = parse_timestamp(&raw) else {
            return Err(QueryExecutionError::InvalidTimestamp { id, value: raw });
        };
        Ok(GuessRecord {
            id,
            pano_id: self.pano_id,
            clicked_lat: self.clicked_lat,
            clicked_lng: self.clicked_lng,
            actual_lat: self.actual_lat,
            actual_lng: self.actual_lng,
            distance: self.distance,
            timestamp,
        })
    }
}
