//! Compilation of [`GuessFilter`] predicates into parameterized SQL.

use rusqlite::types::Value;

use panoguess_core::{GuessFilter, Predicate};

pub(crate) const SELECT_RECORDS: &str = "SELECT id, panoId, clickedLat, clickedLng, actualLat, \
     actualLng, distance, timestamp FROM items";

pub(crate) const SELECT_PAIRS: &str = "SELECT clickedLat, clickedLng FROM items ORDER BY id";

/// Query text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompiledQuery {
    pub(crate) sql: String,
    pub(crate) params: Vec<Value>,
}

/// Append a `WHERE` clause for `filter` to `base` and order by id.
///
/// Filter values only ever travel as bound parameters.
pub(crate) fn compile(base: &str, filter: &GuessFilter) -> CompiledQuery {
    let (clauses, params): (Vec<String>, Vec<Value>) = filter
        .predicates()
        .enumerate()
        .map(|(slot, predicate)| clause(slot + 1, predicate))
        .unzip();

    let mut sql = base.to_owned();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY id");
    CompiledQuery { sql, params }
}

fn clause(position: usize, predicate: Predicate) -> (String, Value) {
    match predicate {
        Predicate::IdEquals(id) => (format!("id = ?{position}"), Value::Integer(id)),
        Predicate::DistanceGreaterThan(min) => {
            (format!("distance > ?{position}"), Value::Real(min))
        }
    }
}
