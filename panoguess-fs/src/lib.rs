//! Filesystem helpers for locating the guess database and reading batch files.
//!
//! Everything goes through `cap-std` with ambient authority, using UTF-8
//! `camino` paths.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use std::io::{self, Read};

/// Read a whole UTF-8 text file, such as a JSON batch body.
pub fn read_to_string(path: &Utf8Path) -> io::Result<String> {
    let mut file = fs_utf8::File::open_ambient(path, ambient_authority())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Create the directory that will hold `path` when it does not exist yet.
///
/// Paths without a parent, or whose parent is the current directory or the
/// filesystem root, need no work.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base, relative) = split_parent(parent);
    if relative.as_str().is_empty() {
        return Ok(());
    }
    fs_utf8::Dir::open_ambient_dir(base, ambient_authority())?.create_dir_all(relative)
}

/// Split a parent path into an ambient base directory and the remainder.
fn split_parent(parent: &Utf8Path) -> (&Utf8Path, Utf8PathBuf) {
    match parent.strip_prefix("/") {
        Ok(relative) => (Utf8Path::new("/"), relative.to_path_buf()),
        Err(_) => (Utf8Path::new("."), parent.to_path_buf()),
    }
}
