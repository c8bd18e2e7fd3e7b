//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::process::ExitCode;

use panoguess_cli::CliError;

fn main() -> eyre::Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match panoguess_cli::run() {
        Ok(code) => Ok(code),
        // Help and version requests are reported through clap's own exit path.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => Err(err.into()),
    }
}
