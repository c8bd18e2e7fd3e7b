//! Guess records and the validated batches that produce them.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use geo::Point;
use serde::{Deserialize, Serialize};

use crate::distance::haversine_km;
use crate::validation::ValidationError;

/// A client-supplied guess that passed validation but is not yet persisted.
///
/// The derived distance is never accepted from clients; call
/// [`CandidateGuess::distance_km`] to compute it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateGuess {
    /// Opaque identifier of the scene the guess was made in.
    pub pano_id: String,
    /// Latitude of the guessed position.
    pub clicked_lat: f64,
    /// Longitude of the guessed position.
    pub clicked_lng: f64,
    /// Latitude of the true position.
    pub actual_lat: f64,
    /// Longitude of the true position.
    pub actual_lng: f64,
}

impl CandidateGuess {
    /// Great-circle distance between the guessed and true positions in km.
    ///
    /// # Examples
    /// ```
    /// use panoguess_core::CandidateGuess;
    ///
    /// let guess = CandidateGuess {
    ///     pano_id: "abc".into(),
    ///     clicked_lat: 0.0,
    ///     clicked_lng: 0.0,
    ///     actual_lat: 0.0,
    ///     actual_lng: 1.0,
    /// };
    /// assert!((guess.distance_km() - 111.19).abs() < 0.01);
    /// ```
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        haversine_km(
            self.clicked_lat,
            self.clicked_lng,
            self.actual_lat,
            self.actual_lng,
        )
    }

    /// Guessed position as a point with `x = longitude`, `y = latitude`.
    #[must_use]
    pub fn clicked(&self) -> Point<f64> {
        Point::new(self.clicked_lng, self.clicked_lat)
    }

    /// True position as a point with `x = longitude`, `y = latitude`.
    #[must_use]
    pub fn actual(&self) -> Point<f64> {
        Point::new(self.actual_lng, self.actual_lat)
    }
}

/// A non-empty, ordered batch of validated guesses.
///
/// Batches are the unit of atomic ingestion: either every guess is stored or
/// none is.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessBatch {
    guesses: Vec<CandidateGuess>,
}

impl GuessBatch {
    /// Wrap already validated guesses, rejecting an empty list.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyBatch`] when `guesses` is empty.
    pub fn new(guesses: Vec<CandidateGuess>) -> Result<Self, ValidationError> {
        if guesses.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        Ok(Self { guesses })
    }

    /// Number of guesses in the batch. Always at least one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guesses.len()
    }

    /// Always `false`: a batch holds at least one guess.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guesses.is_empty()
    }

    /// Iterate over the guesses in submission order.
    pub fn iter(&self) -> std::slice::Iter<'_, CandidateGuess> {
        self.guesses.iter()
    }

    /// Borrow the guesses as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[CandidateGuess] {
        &self.guesses
    }
}

impl<'a> IntoIterator for &'a GuessBatch {
    type Item = &'a CandidateGuess;
    type IntoIter = std::slice::Iter<'a, CandidateGuess>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A persisted guess as served to readers.
///
/// Serializes with the camelCase field names of the wire contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuessRecord {
    /// Store-assigned identifier; unique and never reused.
    pub id: i64,
    /// Opaque identifier of the scene the guess was made in.
    pub pano_id: String,
    /// Latitude of the guessed position.
    pub clicked_lat: f64,
    /// Longitude of the guessed position.
    pub clicked_lng: f64,
    /// Latitude of the true position.
    pub actual_lat: f64,
    /// Longitude of the true position.
    pub actual_lng: f64,
    /// Derived great-circle distance in kilometres.
    pub distance: f64,
    /// Creation time, serialized as RFC 3339 with milliseconds.
    #[serde(with = "wire_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl GuessRecord {
    /// The guessed coordinate reduced to a `[lat, lng]` pair.
    #[must_use]
    pub const fn clicked_pair(&self) -> CoordinatePair {
        CoordinatePair(self.clicked_lat, self.clicked_lng)
    }
}

/// A `[latitude, longitude]` pair, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinatePair(pub f64, pub f64);

impl CoordinatePair {
    /// Latitude component.
    #[must_use]
    pub const fn lat(self) -> f64 {
        self.0
    }

    /// Longitude component.
    #[must_use]
    pub const fn lng(self) -> f64 {
        self.1
    }
}

const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a timestamp the way ingestion stores it: RFC 3339, milliseconds, `Z`.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use panoguess_core::format_timestamp;
///
/// let at = Utc.with_ymd_and_hms(2025, 5, 18, 0, 10, 0).unwrap();
/// assert_eq!(format_timestamp(at), "2025-05-18T00:10:00.000Z");
/// ```
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 text as written by ingestion and the
/// `YYYY-MM-DD HH:MM:SS` form SQLite uses for `CURRENT_TIMESTAMP`, which is
/// interpreted as UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, LEGACY_TIMESTAMP_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

mod wire_timestamp {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub(super) fn serialize<S: Serializer>(
        at: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(*at))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("unrecognised timestamp {raw:?}")))
    }
}
