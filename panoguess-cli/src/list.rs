//! `list` and `shortlist` commands: read stored guesses back.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use panoguess_core::ListParams;
use panoguess_data::{DEFAULT_DATABASE_PATH, Reply};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATABASE, ARG_FORMAT, ARG_ID, ARG_MIN_DISTANCE, CliError, serve};

/// CLI arguments for the `list` subcommand.
///
/// Filter values stay raw strings so malformed input surfaces as a client
/// error reply rather than an argument parsing failure.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "list",
    long_about = "List stored guesses in id order. Filters combine with AND: \
                 --id selects one guess and --min-distance keeps guesses \
                 strictly further away than the given kilometres. \
                 --format short prints [lat, lng] pairs only.",
    about = "List stored guesses"
)]
#[ortho_config(prefix = "PANOGUESS")]
pub(crate) struct ListArgs {
    /// Path to the SQLite guess database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Only the guess with this id.
    #[arg(long = ARG_ID, value_name = "id")]
    #[serde(default)]
    pub(crate) id: Option<String>,
    /// Only guesses further than this many kilometres.
    #[arg(long = ARG_MIN_DISTANCE, value_name = "km")]
    #[serde(default)]
    pub(crate) min_distance: Option<String>,
    /// Row shape; `short` prints guessed coordinate pairs.
    #[arg(long = ARG_FORMAT, value_name = "format")]
    #[serde(default)]
    pub(crate) format: Option<String>,
}

impl ListArgs {
    pub(crate) fn into_config(self) -> Result<ListConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(ListConfig::from(merged))
    }
}

/// Resolved `list` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListConfig {
    pub(crate) database: Utf8PathBuf,
    pub(crate) params: ListParams,
}

impl From<ListArgs> for ListConfig {
    fn from(args: ListArgs) -> Self {
        Self {
            database: database_or_default(args.database),
            params: ListParams {
                id: args.id,
                min_distance: args.min_distance,
                format: args.format,
            },
        }
    }
}

/// CLI arguments for the `shortlist` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "shortlist",
    about = "Print the guessed [lat, lng] pair of every stored guess"
)]
#[ortho_config(prefix = "PANOGUESS")]
pub(crate) struct ShortlistArgs {
    /// Path to the SQLite guess database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl ShortlistArgs {
    fn into_database(self) -> Result<Utf8PathBuf, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(database_or_default(merged.database))
    }
}

fn database_or_default(database: Option<Utf8PathBuf>) -> Utf8PathBuf {
    database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE_PATH))
}

pub(crate) fn run_list(args: ListArgs) -> Result<Reply, CliError> {
    run_list_with(&args.into_config()?)
}

pub(crate) fn run_list_with(config: &ListConfig) -> Result<Reply, CliError> {
    serve(&config.database, |service| service.list(&config.params))
}

pub(crate) fn run_shortlist(args: ShortlistArgs) -> Result<Reply, CliError> {
    let database = args.into_database()?;
    serve(&database, panoguess_data::GuessService::shortlist)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ListConfig, CliError> {
    let merged = ListArgs::merge_from_layers(layers).map_err(CliError::from)?;
    Ok(ListConfig::from(merged))
}
