//! Command-line interface for the Panoguess guess log.
//!
//! Each invocation opens the store, serves one request through
//! [`GuessService`], prints the JSON reply and closes the store again.
#![forbid(unsafe_code)]

use std::io::{Read, Write};
use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use log::warn;
use panoguess_data::{GuessService, GuessStore, Reply, ReplyStatus};

mod add;
mod error;
mod list;

pub use error::CliError;

use add::AddArgs;
use list::{ListArgs, ShortlistArgs};

const ARG_DATABASE: &str = "database";
const ARG_ID: &str = "id";
const ARG_MIN_DISTANCE: &str = "min-distance";
const ARG_FORMAT: &str = "format";

/// Run the Panoguess CLI with the current process arguments and environment.
///
/// The exit code is success only for `Ok` replies.
///
/// # Errors
/// Returns [`CliError`] when no reply could be produced.
pub fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdin = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    let status = execute(cli.command, &mut stdin, &mut stdout)?;
    Ok(if status.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn execute(
    command: Command,
    input: &mut dyn Read,
    output: &mut dyn Write,
) -> Result<ReplyStatus, CliError> {
    let reply = match command {
        Command::Add(args) => add::run_add(args, input)?,
        Command::List(args) => list::run_list(args)?,
        Command::Shortlist(args) => list::run_shortlist(args)?,
    };
    write_reply(output, &reply)?;
    Ok(reply.status)
}

#[derive(Debug, Parser)]
#[command(
    name = "panoguess",
    about = "Record and query geo-guess results",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ingest a JSON batch of guesses atomically.
    Add(AddArgs),
    /// List stored guesses, optionally filtered.
    List(ListArgs),
    /// List the guessed coordinates of every stored guess.
    Shortlist(ShortlistArgs),
}

/// Open the store, serve one request and close the store again.
///
/// The store is closed even when serving fails to produce a success reply.
fn serve<F>(database: &Utf8Path, request: F) -> Result<Reply, CliError>
where
    F: FnOnce(&GuessService) -> Reply,
{
    let store = GuessStore::open_path(database.to_path_buf()).map_err(CliError::OpenStore)?;
    let store = Arc::new(store);
    let reply = request(&GuessService::new(Arc::clone(&store)));
    match Arc::try_unwrap(store) {
        Ok(store) => store.close().map_err(CliError::CloseStore)?,
        Err(_) => warn!("Store still shared after the request; closing on drop."),
    }
    Ok(reply)
}

fn write_reply(output: &mut dyn Write, reply: &Reply) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(&reply.body).map_err(CliError::SerializeReply)?;
    output
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    output.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
