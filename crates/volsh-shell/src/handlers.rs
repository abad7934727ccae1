//! One handler per shell command.
//!
//! Each handler validates its argument shape, drives the volume service, and
//! reports every failing call site exactly once at the point of failure.
//! Handles opened here are closed on every exit path before returning.

use std::io::{Read, Write};

use tracing::debug;

use volsh_volume::{OpenMode, VolumeError, VolumeService};

use crate::console::Console;
use crate::diag::{self, CmdResult};
use crate::listing::ListingLine;
use crate::transfer;

/// `ls [path]`: lists the directory at `path`, defaulting to the root.
///
/// A failed entry read stops the iteration and marks the command failed, but
/// the directory handle is still closed.
pub fn list<V: VolumeService>(
    volume: &V,
    args: &[String],
    console: &mut Console<'_>,
) -> CmdResult {
    let path = match args {
        [] => "/",
        [path] => path.as_str(),
        _ => return Err(diag::usage(console.err, "ls <directory>")),
    };
    debug!(path, "ls");

    let dir = match volume.open_dir(path) {
        Ok(dir) => dir,
        Err(e) => return Err(diag::report(console.err, "open_dir", &e)),
    };

    let mut result = Ok(());
    loop {
        match volume.read_dir_next(dir) {
            Ok(entry) => {
                let line = ListingLine::from(&entry).render(console.emphasis);
                let _ = writeln!(console.out, "{}", line);
            }
            Err(VolumeError::EndOfDirectory) => break,
            Err(e) => {
                result = Err(diag::report(console.err, "read_dir_next", &e));
                break;
            }
        }
    }

    if let Err(e) = volume.close_dir(dir) {
        return Err(diag::report(console.err, "close_dir", &e));
    }
    result
}

/// `mkdir <path>`: creates one directory.
pub fn make_directory<V: VolumeService>(
    volume: &V,
    args: &[String],
    console: &mut Console<'_>,
) -> CmdResult {
    let path = match args {
        [path] => path.as_str(),
        _ => return Err(diag::usage(console.err, "mkdir <directory>")),
    };
    debug!(path, "mkdir");

    volume
        .make_dir(path)
        .map_err(|e| diag::report(console.err, "make_dir", &e))
}

/// `rm [-r] <path>`: removes a directory with `-r`, a file without.
///
/// The flag is accepted before the path only.
pub fn remove<V: VolumeService>(
    volume: &V,
    args: &[String],
    console: &mut Console<'_>,
) -> CmdResult {
    match args {
        [flag, path] if flag.as_str() == "-r" => {
            debug!(path = path.as_str(), recursive = true, "rm");
            volume
                .remove_dir(path)
                .map_err(|e| diag::report(console.err, "remove_dir", &e))
        }
        [path] => {
            debug!(path = path.as_str(), "rm");
            volume
                .remove_file(path)
                .map_err(|e| diag::report(console.err, "remove_file", &e))
        }
        _ => Err(diag::usage(console.err, "rm [-r] <directory/file name>")),
    }
}

/// `cat <path>`: streams a file to standard output.
pub fn read_file<V: VolumeService>(
    volume: &V,
    args: &[String],
    console: &mut Console<'_>,
) -> CmdResult {
    let path = match args {
        [path] => path.as_str(),
        _ => return Err(diag::usage(console.err, "cat <file>")),
    };
    debug!(path, "cat");

    let file = match volume.open_file(path, OpenMode::Read) {
        Ok(file) => file,
        Err(e) => return Err(diag::report(console.err, "open_file", &e)),
    };

    let result = transfer::drain_to_output(volume, file, console.out)
        .map(|_| ())
        .map_err(|e| diag::report_transfer(console.err, "read_chunk", &e));

    if let Err(e) = volume.close_file(file) {
        return Err(diag::report(console.err, "close_file", &e));
    }
    result
}

/// `write [-a] <path>`: fills a file from standard input, appending with
/// `-a`, truncating (or creating) without.
///
/// The flag is accepted before the path only. A transfer failure and a close
/// failure each force an overall failure on their own.
pub fn write_file<V: VolumeService>(
    volume: &V,
    args: &[String],
    input: &mut dyn Read,
    console: &mut Console<'_>,
) -> CmdResult {
    let (mode, path) = match args {
        [flag, path] if flag.as_str() == "-a" => (OpenMode::WriteAppend, path.as_str()),
        [path] => (OpenMode::WriteTruncate, path.as_str()),
        _ => return Err(diag::usage(console.err, "write [-a] <file name>")),
    };
    debug!(path, ?mode, "write");

    let file = match volume.open_file(path, mode) {
        Ok(file) => file,
        Err(e) => return Err(diag::report(console.err, "open_file", &e)),
    };

    let result = transfer::fill_from_input(volume, file, input)
        .map(|_| ())
        .map_err(|e| diag::report_transfer(console.err, "write_chunk", &e));

    if let Err(e) = volume.close_file(file) {
        return Err(diag::report(console.err, "close_file", &e));
    }
    result
}
