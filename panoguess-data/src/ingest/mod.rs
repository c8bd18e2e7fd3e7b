//! Atomic ingestion of guess batches.
//!
//! A batch is validated in full before the store is touched. The rows are
//! then written inside one `IMMEDIATE` transaction through a single prepared
//! statement; the first failing insert stops the batch and rolls the whole
//! transaction back, so readers see either every row of a batch or none.

use log::{error, info, warn};
use rusqlite::{Connection, DropBehavior, Statement, Transaction, TransactionBehavior};
use serde_json::Value;

use panoguess_core::{CandidateGuess, GuessBatch, format_timestamp, parse_batch, validate_batch};

use crate::store::GuessStore;
use crate::time::{SystemProvider, TimeProvider};

mod error;

pub use error::{IngestError, PersistenceError};

const INSERT_GUESS: &str = "INSERT INTO items \
    (panoId, clickedLat, clickedLng, actualLat, actualLng, distance, timestamp) \
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

static SYSTEM_TIME: SystemProvider = SystemProvider;

/// Outcome of a committed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReceipt {
    ids: Vec<i64>,
}

impl IngestReceipt {
    /// Number of rows written.
    #[must_use]
    pub fn inserted(&self) -> usize {
        self.ids.len()
    }

    /// Ids assigned to the rows, in batch order.
    #[must_use]
    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    /// Id of the first row of the batch.
    #[must_use]
    pub fn first_id(&self) -> Option<i64> {
        self.ids.first().copied()
    }

    /// Id of the last row of the batch.
    #[must_use]
    pub fn last_id(&self) -> Option<i64> {
        self.ids.last().copied()
    }
}

/// Writes validated batches into a [`GuessStore`].
#[derive(Debug, Clone, Copy)]
pub struct BatchIngestor<'a> {
    store: &'a GuessStore,
    time: &'a dyn TimeProvider,
}

impl<'a> BatchIngestor<'a> {
    /// Ingestor stamping rows with the system clock.
    #[must_use]
    pub fn new(store: &'a GuessStore) -> Self {
        Self::with_time_provider(store, &SYSTEM_TIME)
    }

    /// Ingestor stamping rows with `time`.
    #[must_use]
    pub fn with_time_provider(store: &'a GuessStore, time: &'a dyn TimeProvider) -> Self {
        Self { store, time }
    }

    /// Validate a raw request body, then persist it.
    ///
    /// # Errors
    /// Returns [`IngestError::Validation`] without touching the store when
    /// the body is rejected, or [`IngestError::Persistence`] when the batch
    /// was rolled back.
    pub fn ingest_json(&self, body: &str) -> Result<IngestReceipt, IngestError> {
        let batch = parse_batch(body)?;
        Ok(self.ingest(&batch)?)
    }

    /// Validate an already decoded body, then persist it.
    ///
    /// # Errors
    /// See [`BatchIngestor::ingest_json`].
    pub fn ingest_value(&self, body: &Value) -> Result<IngestReceipt, IngestError> {
        let batch = validate_batch(body)?;
        Ok(self.ingest(&batch)?)
    }

    /// Persist every guess of `batch` in one transaction.
    ///
    /// Each row gets its distance derived from its coordinates and is stamped
    /// with the time of its insert.
    ///
    /// # Errors
    /// Returns [`PersistenceError`] when any step fails. Nothing from the
    /// batch is visible afterwards; a failed rollback is chained onto the
    /// original cause.
    ///
    /// # Examples
    /// ```no_run
    /// use panoguess_core::parse_batch;
    /// use panoguess_data::{BatchIngestor, GuessStore};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = GuessStore::open_path("data.sqlite")?;
    /// let batch = parse_batch(
    ///     r#"[{"panoId":"abc","clickedLat":0,"clickedLng":0,"actualLat":0,"actualLng":1}]"#,
    /// )?;
    /// let receipt = BatchIngestor::new(&store).ingest(&batch)?;
    /// assert_eq!(receipt.inserted(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn ingest(&self, batch: &GuessBatch) -> Result<IngestReceipt, PersistenceError> {
        let mut connection = self
            .store
            .lock_writer()
            .map_err(|_| PersistenceError::WriterPoisoned)?;
        match write_batch(&mut connection, batch, self.time) {
            Ok(receipt) => {
                info!(
                    "Inserted {} items in a single transaction.",
                    receipt.inserted()
                );
                Ok(receipt)
            }
            Err(err @ PersistenceError::RollbackFailed { .. }) => {
                error!("Batch of {} items left unresolved: {err}", batch.len());
                Err(err)
            }
            Err(err) => {
                warn!("Rolled back batch of {} items: {err}", batch.len());
                Err(err)
            }
        }
    }
}

fn write_batch(
    connection: &mut Connection,
    batch: &GuessBatch,
    time: &dyn TimeProvider,
) -> Result<IngestReceipt, PersistenceError> {
    let mut transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|source| PersistenceError::BeginTransaction { source })?;

    let ids = match insert_rows(&transaction, batch, time) {
        Ok(ids) => ids,
        Err(err) => return Err(err.with_rollback(roll_back(transaction))),
    };

    // A failed COMMIT may leave the transaction open; roll it back ourselves
    // so the outcome is reported instead of swallowed on drop.
    transaction.set_drop_behavior(DropBehavior::Ignore);
    if let Err(source) = transaction.commit() {
        let rollback = if connection.is_autocommit() {
            Ok(())
        } else {
            connection.execute_batch("ROLLBACK")
        };
        return Err(PersistenceError::Commit { source }.with_rollback(rollback));
    }
    Ok(IngestReceipt { ids })
}

fn roll_back(transaction: Transaction<'_>) -> rusqlite::Result<()> {
    // SQLite rolls back on its own after some errors (SQLITE_FULL, IOERR).
    if transaction.is_autocommit() {
        return Ok(());
    }
    transaction.rollback()
}

fn insert_rows(
    transaction: &Transaction<'_>,
    batch: &GuessBatch,
    time: &dyn TimeProvider,
) -> Result<Vec<i64>, PersistenceError> {
    let mut statement = transaction
        .prepare(INSERT_GUESS)
        .map_err(|source| PersistenceError::PrepareInsert { source })?;

    let inserted = batch
        .iter()
        .enumerate()
        .try_fold(Vec::with_capacity(batch.len()), |mut ids, (index, guess)| {
            let id = insert_guess(&mut statement, guess, time).map_err(|source| {
                PersistenceError::InsertRecord {
                    index,
                    pano_id: guess.pano_id.clone(),
                    source,
                }
            })?;
            ids.push(id);
            Ok(ids)
        });

    let finalized = statement
        .finalize()
        .map_err(|source| PersistenceError::FinalizeInsert { source });
    let ids = inserted?;
    finalized?;
    Ok(ids)
}

fn insert_guess(
    statement: &mut Statement<'_>,
    guess: &CandidateGuess,
    time: &dyn TimeProvider,
) -> rusqlite::Result<i64> {
    statement.insert((
        &guess.pano_id,
        guess.clicked_lat,
        guess.clicked_lng,
        guess.actual_lat,
        guess.actual_lng,
        guess.distance_km(),
        format_timestamp(time.now()),
    ))
}
