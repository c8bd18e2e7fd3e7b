//! Clock sources used to stamp ingested guesses.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait TimeProvider: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the current time. No guarantees are made about monotonicity.
    fn now(&self) -> DateTime<Utc>;
}

/// A [`TimeProvider`] that uses [`Utc::now`] as a clock source.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProvider;

impl TimeProvider for SystemProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
