use thiserror::Error;

use panoguess_core::ValidationError;

/// Failures while writing a batch. The batch is never partially committed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The writer connection lock was poisoned by a panicking holder.
    #[error("database writer is unavailable after an earlier panic")]
    WriterPoisoned,
    /// Beginning the transaction failed.
    #[error("Transaction start error: {source}")]
    BeginTransaction {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Preparing the insert statement failed.
    #[error("Error preparing insert statement: {source}")]
    PrepareInsert {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Writing one guess failed.
    #[error("Error inserting item {index} (panoId: {pano_id}): {source}")]
    InsertRecord {
        /// Zero-based position of the guess in its batch.
        index: usize,
        /// Scene identifier of the guess.
        pano_id: String,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Finalizing the insert statement failed.
    #[error("Error finalizing statement: {source}")]
    FinalizeInsert {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Committing the transaction failed.
    #[error("Transaction commit error: {source}")]
    Commit {
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Rolling back after an earlier failure also failed.
    #[error("Transaction rollback failed: {source} after initial error: {original}")]
    RollbackFailed {
        /// Source error returned by `rusqlite` for the rollback.
        #[source]
        source: rusqlite::Error,
        /// The failure that triggered the rollback.
        original: Box<PersistenceError>,
    },
}

impl PersistenceError {
    /// Position of the guess whose insert failed, if an insert failed.
    #[must_use]
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            Self::InsertRecord { index, .. } => Some(*index),
            Self::RollbackFailed { original, .. } => original.failed_index(),
            _ => None,
        }
    }

    /// Layer a rollback outcome over the failure that triggered it.
    pub(crate) fn with_rollback(self, rollback: rusqlite::Result<()>) -> Self {
        match rollback {
            Ok(()) => self,
            Err(source) => Self::RollbackFailed {
                source,
                original: Box::new(self),
            },
        }
    }
}

/// Failures of a full ingest request: validation first, then persistence.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The batch was rejected before touching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The batch was rolled back.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn insert_failure() -> PersistenceError {
        PersistenceError::InsertRecord {
            index: 2,
            pano_id: "abc".into(),
            source: rusqlite::Error::ExecuteReturnedResults,
        }
    }

    #[rstest]
    fn successful_rollback_keeps_the_original_error() {
        let err = insert_failure().with_rollback(Ok(()));
        assert!(matches!(err, PersistenceError::InsertRecord { index: 2, .. }));
    }

    #[rstest]
    fn failed_rollback_chains_both_messages() {
        let err = insert_failure().with_rollback(Err(rusqlite::Error::InvalidQuery));
        let message = err.to_string();
        assert!(message.starts_with("Transaction rollback failed: "));
        assert!(message.contains("after initial error: Error inserting item 2 (panoId: abc)"));
        assert_eq!(err.failed_index(), Some(2));
    }

    #[rstest]
    fn commit_failures_name_no_record() {
        let err = PersistenceError::Commit {
            source: rusqlite::Error::InvalidQuery,
        };
        assert_eq!(err.failed_index(), None);
    }
}
