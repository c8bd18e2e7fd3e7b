//! Core domain types for the Panoguess guess log.
//!
//! This crate holds everything that does not touch storage: the guess
//! records, the haversine distance used to derive them, validation of
//! incoming batches and the filters used to read them back. Constructors and
//! parsers return `Result` so malformed input is rejected before it reaches a
//! store.

mod distance;
mod guess;
mod query;
mod validation;

pub use distance::{EARTH_RADIUS_KM, distance_between, haversine_km};
pub use guess::{
    CandidateGuess, CoordinatePair, GuessBatch, GuessRecord, format_timestamp, parse_timestamp,
};
pub use query::{
    GuessFilter, ListFormat, ListOutput, ListParams, ListQuery, Predicate, QueryParameterError,
    SHORT_FORMAT,
};
pub use validation::{
    COORDINATE_FIELDS, FIELD_PANO_ID, ValidationError, parse_batch, validate_batch,
};
