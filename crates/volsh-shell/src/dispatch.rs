//! Mount, command lookup, and the unconditional unmount.

use std::io::{Read, Write};
use std::path::Path;

use tracing::debug;

use volsh_volume::{VolumeImage, VolumeService};

use crate::command::CommandKind;
use crate::console::Console;
use crate::diag::{self, CmdResult, Reported};
use crate::handlers;

/// Runs one command against an already-mounted volume.
///
/// This is the dispatch seam below the mount lifecycle; any
/// [`VolumeService`] works here.
pub fn run_command<V: VolumeService>(
    volume: &V,
    kind: CommandKind,
    args: &[String],
    input: &mut dyn Read,
    console: &mut Console<'_>,
) -> CmdResult {
    match kind {
        CommandKind::List => handlers::list(volume, args, console),
        CommandKind::MakeDirectory => handlers::make_directory(volume, args, console),
        CommandKind::Remove => handlers::remove(volume, args, console),
        CommandKind::ReadFile => handlers::read_file(volume, args, console),
        CommandKind::WriteFile => handlers::write_file(volume, args, input, console),
    }
}

/// Mounts `image`, runs the named command, and unmounts.
///
/// A mount failure short-circuits with no unmount attempt. Once mounted, the
/// unmount happens no matter how lookup or the handler fared, and an unmount
/// failure overrides an otherwise successful outcome.
pub fn run(
    image: &Path,
    name: &str,
    args: &[String],
    input: &mut dyn Read,
    console: &mut Console<'_>,
) -> CmdResult {
    let volume = match VolumeImage::mount(image) {
        Ok(volume) => volume,
        Err(e) => return Err(diag::report(console.err, "mount", &e)),
    };

    let mut result = match CommandKind::lookup(name) {
        Some(kind) => {
            debug!(name, "dispatching");
            run_command(&volume, kind, args, input, console)
        }
        None => {
            let _ = writeln!(console.err, "Invalid command.");
            Err(Reported)
        }
    };

    if let Err(e) = volume.unmount() {
        result = Err(diag::report(console.err, "unmount", &e));
    }
    result
}
