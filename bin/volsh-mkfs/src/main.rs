//! volsh-mkfs - formats empty volume images for volsh.

use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use volsh_volume::VolumeImage;

/// Formats an empty volume image.
#[derive(Parser)]
#[command(name = "volsh-mkfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Reject writes once the volume holds this many content bytes
    #[arg(long)]
    capacity: Option<u64>,

    /// Overwrite an existing image
    #[arg(long)]
    force: bool,

    /// Path of the image to create
    image: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")?;

    if cli.image.exists() && !cli.force {
        bail!(
            "Image already exists at {:?}. Use --force to overwrite.",
            cli.image
        );
    }

    VolumeImage::create(&cli.image, cli.capacity)
        .with_context(|| format!("Failed to create image at {:?}", cli.image))?;

    println!("Created volume image at {:?}", cli.image);
    Ok(())
}
