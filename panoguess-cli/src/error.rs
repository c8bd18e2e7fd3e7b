//! Error types emitted by the Panoguess CLI.
//!
//! Request-level failures (bad batches, bad filters, rolled-back writes) are
//! not errors here: they become JSON replies. `CliError` covers what stops a
//! reply from being produced at all.

use std::sync::Arc;

use camino::Utf8PathBuf;
use panoguess_data::StoreError;
use thiserror::Error;

/// Errors emitted by the Panoguess CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// Reading the batch file failed.
    #[error("failed to read batch from {path:?}: {source}")]
    ReadBatch {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading the batch from standard input failed.
    #[error("failed to read batch from standard input: {0}")]
    ReadStdin(#[source] std::io::Error),
    /// Opening the guess database failed.
    #[error(transparent)]
    OpenStore(StoreError),
    /// Closing the guess database failed.
    #[error(transparent)]
    CloseStore(StoreError),
    /// Serializing the reply failed.
    #[error("failed to serialize reply: {0}")]
    SerializeReply(#[source] serde_json::Error),
    /// Writing the reply failed.
    #[error("failed to write reply: {0}")]
    WriteOutput(#[source] std::io::Error),
}
