//! `add` command: ingest one batch of guesses.

use std::io::Read;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use panoguess_data::{DEFAULT_DATABASE_PATH, Reply};
use serde::{Deserialize, Serialize};

use crate::{ARG_DATABASE, CliError, serve};

/// CLI arguments for the `add` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "add",
    long_about = "Validate a JSON array of guesses and store it in a single \
                 transaction. The batch is read from the given file, or from \
                 standard input when no path is supplied.",
    about = "Ingest a batch of guesses"
)]
#[ortho_config(prefix = "PANOGUESS")]
pub(crate) struct AddArgs {
    /// Path to a JSON file holding the batch; standard input when omitted.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) batch_path: Option<Utf8PathBuf>,
    /// Path to the SQLite guess database.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl AddArgs {
    pub(crate) fn into_config(self) -> Result<AddConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(AddConfig::from(merged))
    }
}

/// Where the batch body comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BatchSource {
    File(Utf8PathBuf),
    Stdin,
}

/// Resolved `add` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AddConfig {
    pub(crate) batch: BatchSource,
    pub(crate) database: Utf8PathBuf,
}

impl From<AddArgs> for AddConfig {
    fn from(args: AddArgs) -> Self {
        Self {
            batch: args.batch_path.map_or(BatchSource::Stdin, BatchSource::File),
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE_PATH)),
        }
    }
}

pub(crate) fn run_add(args: AddArgs, input: &mut dyn Read) -> Result<Reply, CliError> {
    run_add_with(args.into_config()?, input)
}

pub(crate) fn run_add_with(config: AddConfig, input: &mut dyn Read) -> Result<Reply, CliError> {
    let body = read_batch(&config.batch, input)?;
    serve(&config.database, |service| service.ingest(&body))
}

/// Read the raw batch body. The body is not validated here.
pub(crate) fn read_batch(source: &BatchSource, input: &mut dyn Read) -> Result<String, CliError> {
    match source {
        BatchSource::File(path) => {
            panoguess_fs::read_to_string(path).map_err(|source| CliError::ReadBatch {
                path: path.clone(),
                source,
            })
        }
        BatchSource::Stdin => {
            let mut body = String::new();
            input
                .read_to_string(&mut body)
                .map_err(CliError::ReadStdin)?;
            Ok(body)
        }
    }
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<AddConfig, CliError> {
    let merged = AddArgs::merge_from_layers(layers).map_err(CliError::from)?;
    Ok(AddConfig::from(merged))
}
