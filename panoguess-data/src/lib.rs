//! SQLite persistence and request handling for the Panoguess guess log.
//!
//! - [`GuessStore`] owns the database: a serialized writer connection and a
//!   read-only reader connection in WAL mode.
//! - [`BatchIngestor`] writes validated batches atomically.
//! - [`QueryEngine`] serves filtered, shaped reads.
//! - [`GuessService`] maps both onto wire replies.
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod ingest;
mod query;
mod service;
mod store;
mod time;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use ingest::{BatchIngestor, IngestError, IngestReceipt, PersistenceError};
pub use query::{QueryEngine, QueryError, QueryExecutionError};
pub use service::{GuessService, Reply, ReplyStatus};
pub use store::{
    DEFAULT_BUSY_TIMEOUT, DEFAULT_DATABASE_PATH, GUESS_TABLE, GuessStore, StoreConfig, StoreError,
    initialise_schema,
};
pub use time::{SystemProvider, TimeProvider};
