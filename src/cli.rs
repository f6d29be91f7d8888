//! CLI argument parsing with clap

use crate::config::{CmpMode, Config, PlaceMode};
use crate::tz::TzMode;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

/// Organize photos and videos into date-based folders using EXIF or
/// container metadata timestamps.
///
/// Timestamps are resolved to a concrete timezone (fixed, host-local, or
/// GPS-derived) and files land at `<year>/<year>_<month>[/raw]` as relative
/// symlinks or timestamp-preserving copies.
#[derive(Parser, Debug)]
#[command(name = "tzsort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input directory containing media files (default: current directory)
    pub source_dir: Option<PathBuf>,

    /// Base output directory for sorted files (default: current directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Path to a TOML configuration file; CLI flags override its settings
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// Write a commented sample configuration file to this path and exit
    #[arg(long, value_name = "PATH")]
    pub generate_config: Option<PathBuf>,

    /// Copy files instead of creating symbolic links
    #[arg(long)]
    pub copy: bool,

    /// Duplicate check method: "shallow" (fast) or "hash" (accurate)
    #[arg(long, value_enum)]
    pub cmp_mode: Option<CmpMode>,

    /// Timezone for interpreting EXIF timestamps: "auto" (from GPS
    /// coordinates when available), "local" (host timezone), or an IANA
    /// name like "Asia/Tokyo"
    #[arg(long, value_parser = TzMode::from_str)]
    pub timezone: Option<TzMode>,

    /// Enable skipping of directories named in --skip-dirs
    #[arg(long)]
    pub enable_skip_dirs: bool,

    /// Directory names to skip (case-insensitive substring match against
    /// any path segment; used only with --enable-skip-dirs)
    #[arg(long, num_args = 0..)]
    pub skip_dirs: Vec<String>,

    /// Try EXIF extraction for sidecar files as well
    #[arg(long)]
    pub sidecar_exif: bool,

    /// Minimum log level to display
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Output log records as JSON
    #[arg(long)]
    pub json_log: bool,
}

/// Minimum level for log output
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_level(self) -> tracing::Level {
        match self {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

impl Cli {
    /// Merge CLI arguments over a base configuration; flags win.
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref source) = self.source_dir {
            config.source_dir = source.clone();
        }
        if let Some(ref output) = self.output_dir {
            config.output_dir = output.clone();
        }
        if self.copy {
            config.operation = PlaceMode::Copy;
        }
        if let Some(cmp_mode) = self.cmp_mode {
            config.cmp_mode = cmp_mode;
        }
        if let Some(timezone) = self.timezone {
            config.timezone = timezone;
        }
        if self.enable_skip_dirs {
            config.enable_skip_dirs = true;
        }
        if !self.skip_dirs.is_empty() {
            config.skip_dirs = self.skip_dirs.clone();
        }
        if self.sidecar_exif {
            config.sidecar_exif = true;
        }
        config
    }
}
