//! Facade crate for the Panoguess guess log.
//!
//! This crate re-exports the core domain types and exposes the SQLite-backed
//! store, ingestor and query engine behind the `store-sqlite` feature.

#![forbid(unsafe_code)]

pub use panoguess_core::{
    CandidateGuess, CoordinatePair, EARTH_RADIUS_KM, GuessBatch, GuessFilter, GuessRecord,
    ListFormat, ListOutput, ListParams, ListQuery, Predicate, QueryParameterError,
    ValidationError, distance_between, haversine_km, parse_batch, validate_batch,
};

#[cfg(feature = "store-sqlite")]
pub use panoguess_data::{
    BatchIngestor, GuessService, GuessStore, IngestError, IngestReceipt, PersistenceError,
    QueryEngine, QueryError, QueryExecutionError, Reply, ReplyStatus, StoreConfig, StoreError,
    SystemProvider, TimeProvider,
};

#[cfg(feature = "test-support")]
pub use panoguess_data::test_support;
