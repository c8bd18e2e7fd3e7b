//! Shape and type checks for incoming guess batches.
//!
//! Validation is all-or-nothing: a single bad element rejects the whole
//! batch, and nothing here touches storage.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::guess::{CandidateGuess, GuessBatch};

/// Wire name of the scene identifier field.
pub const FIELD_PANO_ID: &str = "panoId";

/// Wire names of the coordinate fields, in insert order.
pub const COORDINATE_FIELDS: [&str; 4] = ["clickedLat", "clickedLng", "actualLat", "actualLng"];

/// Reasons an ingest batch is rejected before any write happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The request body was not JSON at all.
    #[error("request body is not valid JSON: {source}")]
    MalformedBody {
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },
    /// The body decoded to something other than an array.
    #[error("Request body must be a non-empty JSON array.")]
    NotASequence,
    /// The body was an empty array.
    #[error("Request body must be a non-empty JSON array.")]
    EmptyBatch,
    /// An element of the array was not an object.
    #[error("item {index} must be a JSON object")]
    NotAnObject {
        /// Zero-based position of the element.
        index: usize,
    },
    /// An element had no usable `panoId`.
    #[error("item {index} is missing required field panoId")]
    MissingPanoId {
        /// Zero-based position of the element.
        index: usize,
    },
    /// A coordinate field was absent or not a JSON number.
    #[error("item {index} field {field} must be a number")]
    NonNumericCoordinate {
        /// Zero-based position of the element.
        index: usize,
        /// Wire name of the offending field.
        field: &'static str,
    },
}

/// Decode a raw request body and validate it as a guess batch.
///
/// # Errors
/// Returns [`ValidationError::MalformedBody`] when `body` is not JSON, or any
/// error produced by [`validate_batch`].
///
/// # Examples
/// ```
/// use panoguess_core::parse_batch;
///
/// let body = r#"[{"panoId":"abc","clickedLat":0,"clickedLng":0,"actualLat":0,"actualLng":1}]"#;
/// let batch = parse_batch(body).expect("valid batch");
/// assert_eq!(batch.len(), 1);
/// ```
pub fn parse_batch(body: &str) -> Result<GuessBatch, ValidationError> {
    let value: Value =
        serde_json::from_str(body).map_err(|source| ValidationError::MalformedBody { source })?;
    validate_batch(&value)
}

/// Validate a decoded request body as a non-empty array of guesses.
///
/// Each element must be an object with a `panoId` (string, or a number which
/// is kept in its textual form) and four numeric coordinates. Extra fields,
/// including any client-supplied `distance`, are ignored.
///
/// # Errors
/// Returns the first [`ValidationError`] found, scanning in order.
pub fn validate_batch(value: &Value) -> Result<GuessBatch, ValidationError> {
    let items = value.as_array().ok_or(ValidationError::NotASequence)?;
    if items.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }
    let guesses = items
        .iter()
        .enumerate()
        .map(|(index, item)| validate_item(index, item))
        .collect::<Result<Vec<_>, _>>()?;
    GuessBatch::new(guesses)
}

fn validate_item(index: usize, item: &Value) -> Result<CandidateGuess, ValidationError> {
    let object = item
        .as_object()
        .ok_or(ValidationError::NotAnObject { index })?;
    let pano_id = pano_id(object).ok_or(ValidationError::MissingPanoId { index })?;
    let [clicked_lat, clicked_lng, actual_lat, actual_lng] = coordinates(index, object)?;
    Ok(CandidateGuess {
        pano_id,
        clicked_lat,
        clicked_lng,
        actual_lat,
        actual_lng,
    })
}

fn pano_id(object: &Map<String, Value>) -> Option<String> {
    match object.get(FIELD_PANO_ID)? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn coordinates(index: usize, object: &Map<String, Value>) -> Result<[f64; 4], ValidationError> {
    let mut values = [0.0; 4];
    for (slot, field) in values.iter_mut().zip(COORDINATE_FIELDS) {
        *slot = object
            .get(field)
            .and_then(Value::as_f64)
            .ok_or(ValidationError::NonNumericCoordinate { index, field })?;
    }
    Ok(values)
}
