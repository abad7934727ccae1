//! volsh CLI - single-shot command shell for volume images.
//!
//! Mounts the image named on the command line, runs one command against it,
//! and unmounts; the exit code reflects mount, command, and unmount alike.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use volsh_shell::{run, Console, Emphasis};

/// Single-shot command shell for volume images.
#[derive(Parser)]
#[command(name = "volsh")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Render directory names without terminal colors
    #[arg(long)]
    plain: bool,

    /// Volume image to mount
    image: PathBuf,

    /// Command to run: ls, mkdir, rm, cat or write
    command: String,

    /// Arguments for the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<ExitCode> {
    // Command flags like `rm -r` belong to the command, so argument errors
    // must not exit with clap's own status code.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return Ok(if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            });
        }
    };

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // Diagnostics and logs share stderr; stdout carries only listing lines
    // and raw file bytes.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let mut console = Console {
        out: &mut out,
        err: &mut err,
        emphasis: if cli.plain {
            Emphasis::Plain
        } else {
            Emphasis::Color
        },
    };

    let mut input = io::stdin().lock();
    Ok(
        match run(&cli.image, &cli.command, &cli.args, &mut input, &mut console) {
            Ok(()) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        },
    )
}
