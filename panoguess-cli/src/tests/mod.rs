//! Shared test harness modules for the Panoguess CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod config;
mod helpers;
