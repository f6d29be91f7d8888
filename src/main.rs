//! tzsort - timezone-aware photo and video organizer
//!
//! A CLI tool that sorts media files into date-based folders using EXIF
//! or container metadata timestamps, resolving the timezone from a fixed
//! zone, the host zone, or GPS coordinates.

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tzsort::{Cli, Config, Processor};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = setup_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "tzsort starting");

    if let Some(ref path) = cli.generate_config {
        std::fs::write(path, Config::sample_config())?;
        println!("Wrote sample configuration to {}", path.display());
        return Ok(());
    }

    let config = load_config(&cli)?;

    let mut processor = Processor::new(config);
    let stats = processor.run();

    println!("Finished with {} error(s)", stats.errors);
    if stats.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Load configuration from an optional TOML file, with CLI flags on top
fn load_config(cli: &Cli) -> Result<Config> {
    let base = match cli.config {
        Some(ref path) => {
            info!(config_file = %path.display(), "loading configuration from file");
            Config::load_from_file(path)?
        }
        None => Config::default(),
    };
    let config = cli.merge_with_config(base);

    if !config.source_dir.exists() {
        anyhow::bail!(
            "source directory does not exist: {}",
            config.source_dir.display()
        );
    }

    Ok(config)
}

/// Console logging on stderr, plus an optional non-blocking file layer
fn setup_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(cli.log_level.as_level().into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(env_filter);

    if let Some(ref log_path) = cli.log_file {
        let file = open_log_file(log_path)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);

        if cli.json_log {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        } else {
            registry
                .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
        Ok(Some(guard))
    } else {
        if cli.json_log {
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        } else {
            registry.with(fmt::layer().with_writer(std::io::stderr)).init();
        }
        Ok(None)
    }
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(file)
}
