//! Binary entrypoint for the kiosk media server.
//!
//! Delegates all logic to the library crate; no local modules here.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use media_kiosk::config::Config;

/// Simple CLI
#[derive(Debug, Parser)]
#[command(
    name = "media-kiosk",
    about = "HTTP control surface for a kiosk media display"
)]
struct Cli {
    /// Path to YAML config file; built-in defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    // map -v to log level
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("media_kiosk={level}").parse().unwrap())
        .add_directive("hyper=warn".parse().unwrap());
    fmt().with_env_filter(filter).with_target(true).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    let cfg = cfg.absolutized();

    media_kiosk::storage::ensure_directories(&[&cfg.video_directory, &cfg.image_directory])
        .context("preparing media directories")?;
    info!(
        videos = %cfg.video_directory.display(),
        images = %cfg.image_directory.display(),
        "media directories ready"
    );

    media_kiosk::web::run(cfg).await
}
