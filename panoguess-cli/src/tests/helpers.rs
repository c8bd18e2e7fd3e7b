//! Test helpers for CLI runs against throwaway databases.

use super::*;
use camino::Utf8PathBuf;
use tempfile::TempDir;

/// A temporary workspace holding a database path and batch files.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn database(&self) -> Utf8PathBuf {
        self.root.join("data.sqlite")
    }

    pub(super) fn write_batch(&self, name: &str, body: &str) -> Utf8PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, body).expect("write batch file");
        path
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

/// Run a parsed command line, returning the reply status and printed JSON.
pub(super) fn run_cli(args: &[&str], stdin: &str) -> (ReplyStatus, serde_json::Value) {
    let cli = Cli::try_parse_from(std::iter::once("panoguess").chain(args.iter().copied()))
        .expect("arguments should parse");
    let mut input = stdin.as_bytes();
    let mut output = Vec::new();
    let status = execute(cli.command, &mut input, &mut output).expect("command should run");
    let body = serde_json::from_slice(&output).expect("reply is JSON");
    (status, body)
}
