// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.

//! The probe-child entry point. The exporter re-executes its own binary with
//! `<read|readdir> <path>` so the one blocking filesystem operation runs in a
//! disposable process the parent can kill when a dead network mount wedges
//! the syscall. The exit status is the whole wire protocol back to the
//! parent, so the codes below must stay stable across builds.

use log::error;
use std::fs;
use std::io;
use std::path::Path;

/// The filesystem responded (including permission-denied and
/// not-a-directory, which prove it is alive).
pub const EXIT_ALIVE: i32 = 0;
/// A genuine I/O error was observed and logged.
pub const EXIT_IO_ERROR: i32 = 4;
/// Unrecognized mode selector.
pub const EXIT_BAD_USAGE: i32 = 64;

pub const MODE_READ: &str = "read";
pub const MODE_READDIR: &str = "readdir";

/// Perform exactly one blocking operation against `path` and encode the
/// outcome in the returned exit status.
pub fn run(mode: &str, path: &Path) -> i32 {
    let result = match mode {
        MODE_READDIR => list_dir(path),
        MODE_READ => fs::read(path).map(|_| ()),
        _ => {
            error!("internal probe mode accepts two arguments: <read | readdir> <path>");
            return EXIT_BAD_USAGE;
        }
    };

    match result {
        Ok(()) => EXIT_ALIVE,
        Err(err) if confirms_liveness(mode, &err) => EXIT_ALIVE,
        Err(err) => {
            error!("probe: cannot {mode}() {}: {err}", path.display());
            EXIT_IO_ERROR
        }
    }
}

fn list_dir(path: &Path) -> io::Result<()> {
    // Drain the iterator so the directory is actually read, not just opened.
    for entry in fs::read_dir(path)? {
        entry?;
    }
    Ok(())
}

/// Errors that still prove the filesystem responded: permission denied for
/// either mode, and "not a directory" when asked to list one.
fn confirms_liveness(mode: &str, err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
        || (mode == MODE_READDIR && err.kind() == io::ErrorKind::NotADirectory)
}
