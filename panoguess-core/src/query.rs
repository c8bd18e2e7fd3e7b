//! Read-side filters and output shaping.
//!
//! Raw, optional string parameters are parsed into a [`ListQuery`]: a
//! [`GuessFilter`] of AND-combined predicates plus a [`ListFormat`]. Storage
//! back ends compile the predicates into their own parameterized form.

use serde::Serialize;
use thiserror::Error;

use crate::guess::{CoordinatePair, GuessRecord};

/// Value of the `format` parameter that selects short rows.
pub const SHORT_FORMAT: &str = "short";

/// Errors raised when a filter parameter cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryParameterError {
    /// `id` was not an integer.
    #[error("Invalid id parameter {value:?}. Must be an integer.")]
    InvalidId {
        /// The rejected raw value.
        value: String,
        /// Integer parser failure.
        #[source]
        source: std::num::ParseIntError,
    },
    /// `min_distance` was not a number.
    #[error("Invalid min_distance parameter {value:?}. Must be a number.")]
    InvalidMinDistance {
        /// The rejected raw value.
        value: String,
    },
}

/// Unparsed query parameters as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    /// Raw `id` parameter.
    pub id: Option<String>,
    /// Raw `min_distance` parameter.
    pub min_distance: Option<String>,
    /// Raw `format` parameter.
    pub format: Option<String>,
}

/// Row shape of a list response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// Every persisted column.
    #[default]
    Full,
    /// Only the guessed `[lat, lng]` pair.
    Short,
}

impl ListFormat {
    /// Interpret a raw `format` parameter. Only `"short"` selects short rows.
    #[must_use]
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some(SHORT_FORMAT) => Self::Short,
            _ => Self::Full,
        }
    }
}

/// A single filter condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    /// `id` equals the value.
    IdEquals(i64),
    /// `distance` is strictly greater than the value.
    DistanceGreaterThan(f64),
}

impl Predicate {
    /// Evaluate the predicate against a record.
    #[must_use]
    pub fn matches(&self, record: &GuessRecord) -> bool {
        match *self {
            Self::IdEquals(id) => record.id == id,
            Self::DistanceGreaterThan(min) => record.distance > min,
        }
    }
}

/// Optional predicates combined with logical AND.
///
/// # Examples
/// ```
/// use panoguess_core::{GuessFilter, Predicate};
///
/// let filter = GuessFilter::default().with_id(3).with_min_distance(1.5);
/// let predicates: Vec<_> = filter.predicates().collect();
/// assert_eq!(
///     predicates,
///     vec![Predicate::IdEquals(3), Predicate::DistanceGreaterThan(1.5)]
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GuessFilter {
    /// Exact id match.
    pub id: Option<i64>,
    /// Exclusive lower bound on distance.
    pub min_distance: Option<f64>,
}

impl GuessFilter {
    /// Restrict results to a single id.
    #[must_use]
    pub const fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Restrict results to distances strictly greater than `min`.
    #[must_use]
    pub const fn with_min_distance(mut self, min: f64) -> Self {
        self.min_distance = Some(min);
        self
    }

    /// Whether no predicate is set.
    #[must_use]
    pub const fn is_unfiltered(&self) -> bool {
        self.id.is_none() && self.min_distance.is_none()
    }

    /// Active predicates in a stable order: id first, then distance.
    pub fn predicates(&self) -> impl Iterator<Item = Predicate> + 'static {
        let id = self.id.map(Predicate::IdEquals);
        let distance = self.min_distance.map(Predicate::DistanceGreaterThan);
        id.into_iter().chain(distance)
    }

    /// Whether a record satisfies every predicate.
    #[must_use]
    pub fn matches(&self, record: &GuessRecord) -> bool {
        self.predicates().all(|predicate| predicate.matches(record))
    }
}

/// A parsed list request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ListQuery {
    /// Row selection.
    pub filter: GuessFilter,
    /// Row shape.
    pub format: ListFormat,
}

impl ListQuery {
    /// Parse raw parameters.
    ///
    /// Values are trimmed first. `id` must be a base-10 integer; trailing
    /// garbage such as `"12abc"` is rejected. `min_distance` accepts any
    /// floating-point literal except NaN.
    ///
    /// # Errors
    /// Returns [`QueryParameterError`] for the first unparseable parameter.
    ///
    /// # Examples
    /// ```
    /// use panoguess_core::{ListFormat, ListParams, ListQuery};
    ///
    /// let params = ListParams {
    ///     id: None,
    ///     min_distance: Some("25".into()),
    ///     format: Some("short".into()),
    /// };
    /// let query = ListQuery::parse(&params).expect("valid parameters");
    /// assert_eq!(query.filter.min_distance, Some(25.0));
    /// assert_eq!(query.format, ListFormat::Short);
    /// ```
    pub fn parse(params: &ListParams) -> Result<Self, QueryParameterError> {
        let mut filter = GuessFilter::default();
        if let Some(raw) = params.id.as_deref() {
            filter = filter.with_id(parse_id(raw)?);
        }
        if let Some(raw) = params.min_distance.as_deref() {
            filter = filter.with_min_distance(parse_min_distance(raw)?);
        }
        Ok(Self {
            filter,
            format: ListFormat::from_param(params.format.as_deref()),
        })
    }
}

fn parse_id(raw: &str) -> Result<i64, QueryParameterError> {
    raw.trim()
        .parse()
        .map_err(|source| QueryParameterError::InvalidId {
            value: raw.to_owned(),
            source,
        })
}

fn parse_min_distance(raw: &str) -> Result<f64, QueryParameterError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| !value.is_nan())
        .ok_or_else(|| QueryParameterError::InvalidMinDistance {
            value: raw.to_owned(),
        })
}

/// A shaped list response.
///
/// Serializes as a bare JSON array of either full records or pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListOutput {
    /// Full records.
    Full(Vec<GuessRecord>),
    /// Guessed `[lat, lng]` pairs.
    Short(Vec<CoordinatePair>),
}

impl ListOutput {
    /// Shape full records according to `format`, preserving order.
    #[must_use]
    pub fn shape(records: Vec<GuessRecord>, format: ListFormat) -> Self {
        match format {
            ListFormat::Full => Self::Full(records),
            ListFormat::Short => {
                Self::Short(records.iter().map(GuessRecord::clicked_pair).collect())
            }
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Full(records) => records.len(),
            Self::Short(pairs) => pairs.len(),
        }
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The guessed pairs in row order, whatever the shape.
    #[must_use]
    pub fn pairs(&self) -> Vec<CoordinatePair> {
        match self {
            Self::Full(records) => records.iter().map(GuessRecord::clicked_pair).collect(),
            Self::Short(pairs) => pairs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rstest::{fixture, rstest};

    fn params(id: Option<&str>, min_distance: Option<&str>, format: Option<&str>) -> ListParams {
        ListParams {
            id: id.map(str::to_owned),
            min_distance: min_distance.map(str::to_owned),
            format: format.map(str::to_owned),
        }
    }

    #[fixture]
    fn records() -> Vec<GuessRecord> {
        let timestamp = Utc.with_ymd_and_hms(2025, 5, 18, 0, 0, 0).unwrap();
        [(1, 5.0), (2, 10.0), (3, 15.0)]
            .into_iter()
            .map(|(id, distance)| GuessRecord {
                id,
                pano_id: format!("pano-{id}"),
                clicked_lat: distance,
                clicked_lng: -distance,
                actual_lat: 0.0,
                actual_lng: 0.0,
                distance,
                timestamp,
            })
            .collect()
    }

    #[rstest]
    fn no_parameters_means_no_filter() {
        let query = ListQuery::parse(&ListParams::default()).expect("parse");
        assert!(query.filter.is_unfiltered());
        assert_eq!(query.format, ListFormat::Full);
    }

    #[rstest]
    #[case(" 12 ", 12)]
    #[case("-3", -3)]
    fn parses_integer_ids(#[case] raw: &str, #[case] expected: i64) {
        let query = ListQuery::parse(&params(Some(raw), None, None)).expect("parse");
        assert_eq!(query.filter.id, Some(expected));
    }

    #[rstest]
    #[case("abc")]
    #[case("12abc")]
    #[case("1.5")]
    #[case("")]
    fn rejects_non_integer_ids(#[case] raw: &str) {
        let err = ListQuery::parse(&params(Some(raw), None, None)).expect_err("should fail");
        assert!(matches!(err, QueryParameterError::InvalidId { .. }));
    }

    #[rstest]
    #[case("x")]
    #[case("NaN")]
    #[case("10km")]
    fn rejects_non_numeric_min_distance(#[case] raw: &str) {
        let err = ListQuery::parse(&params(None, Some(raw), None)).expect_err("should fail");
        assert_eq!(
            err,
            QueryParameterError::InvalidMinDistance {
                value: raw.to_owned()
            }
        );
    }

    #[rstest]
    #[case(Some("short"), ListFormat::Short)]
    #[case(Some("full"), ListFormat::Full)]
    #[case(Some("SHORT"), ListFormat::Full)]
    #[case(None, ListFormat::Full)]
    fn selects_format(#[case] raw: Option<&str>, #[case] expected: ListFormat) {
        assert_eq!(ListFormat::from_param(raw), expected);
    }

    #[rstest]
    fn min_distance_is_strict(records: Vec<GuessRecord>) {
        let filter = GuessFilter::default().with_min_distance(10.0);
        let ids: Vec<_> = records
            .iter()
            .filter(|record| filter.matches(record))
            .map(|record| record.id)
            .collect();
        assert_eq!(ids, [3]);
    }

    #[rstest]
    fn predicates_combine_with_and(records: Vec<GuessRecord>) {
        let filter = GuessFilter::default().with_id(2).with_min_distance(12.0);
        assert!(!records.iter().any(|record| filter.matches(record)));
    }

    #[rstest]
    fn short_shape_keeps_order(records: Vec<GuessRecord>) {
        let output = ListOutput::shape(records, ListFormat::Short);
        assert_eq!(output.len(), 3);
        let json = serde_json::to_value(&output).expect("serialize output");
        assert_eq!(
            json,
            serde_json::json!([[5.0, -5.0], [10.0, -10.0], [15.0, -15.0]])
        );
    }

    #[rstest]
    fn full_shape_serializes_records(records: Vec<GuessRecord>) {
        let output = ListOutput::shape(records, ListFormat::Full);
        let json = serde_json::to_value(&output).expect("serialize output");
        assert_eq!(json[1]["id"], 2);
        assert_eq!(json[1]["panoId"], "pano-2");
        assert_eq!(output.pairs().len(), 3);
    }
}
