//! Sequential file processing pipeline
//!
//! Walks the source tree and runs each file through timestamp resolution,
//! destination planning and placement. Processing is strictly sequential:
//! the last-used timezone carries from file to file, so traversal order is
//! part of the observable behavior.

use crate::config::Config;
use crate::dest::plan_destination;
use crate::error::{Error, Result};
use crate::place::place_file;
use crate::time::resolve_timestamp;
use crate::time::video::{Ffprobe, MetadataProbe};
use crate::tz::TzResolver;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Counters for one pipeline run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunStats {
    /// Files linked or copied into the output tree
    pub placed: usize,
    /// Files whose content already existed at their destination
    pub duplicates: usize,
    /// Non-regular and near-empty files, silently ignored
    pub skipped: usize,
    /// Files that failed: unsupported type, no timestamp, bad year, or
    /// placement failure
    pub errors: usize,
}

impl RunStats {
    pub fn summary(&self) -> String {
        format!(
            "Placed: {}, Duplicates: {}, Skipped: {}, Errors: {}",
            self.placed, self.duplicates, self.skipped, self.errors
        )
    }
}

enum Outcome {
    Placed,
    Duplicate,
    Skipped,
}

/// Drives the per-file pipeline over a source tree
pub struct Processor {
    config: Config,
    resolver: TzResolver,
    probe: Box<dyn MetadataProbe>,
    stats: RunStats,
}

impl Processor {
    /// Processor seeded with the host timezone and the real ffprobe backend
    pub fn new(config: Config) -> Self {
        Self::with_parts(config, TzResolver::from_host(), Box::new(Ffprobe::default()))
    }

    /// Processor over explicit collaborators, used by tests to pin the
    /// timezone seed and substitute the probe
    pub fn with_parts(config: Config, resolver: TzResolver, probe: Box<dyn MetadataProbe>) -> Self {
        Self {
            config,
            resolver,
            probe,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Run the pipeline over the configured source directory
    pub fn run(&mut self) -> RunStats {
        info!(
            source = %self.config.source_dir.display(),
            output = %self.config.output_dir.display(),
            "scanning source directory"
        );
        let files = self.collect_files();
        info!(count = files.len(), "found files");

        for path in files {
            match self.process_one(&path) {
                Ok(Outcome::Placed) => self.stats.placed += 1,
                Ok(Outcome::Duplicate) => self.stats.duplicates += 1,
                Ok(Outcome::Skipped) => self.stats.skipped += 1,
                Err(err) => {
                    self.stats.errors += 1;
                    error!(path = %path.display(), %err, "failed to process file");
                }
            }
        }

        info!("{}", self.stats.summary());
        self.stats
    }

    /// All file candidates in traversal order, with skip-dir subtrees pruned
    fn collect_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.config.source_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| {
                if self.config.enable_skip_dirs
                    && entry.depth() > 0
                    && let Some(name) = entry.file_name().to_str()
                    && self.config.matches_skip_dir(name)
                {
                    warn!(
                        path = %entry.path().display(),
                        "skipped: name matches the skip list (timestamps may be altered or missing)"
                    );
                    return false;
                }
                true
            });

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(err) => warn!(%err, "directory traversal error"),
            }
        }
        files
    }

    fn process_one(&mut self, path: &Path) -> Result<Outcome> {
        let meta = match fs::metadata(path) {
            Ok(meta) if meta.is_file() => meta,
            _ => return Ok(Outcome::Skipped),
        };
        if meta.len() <= 1 {
            debug!(path = %path.display(), "skipping near-empty file");
            return Ok(Outcome::Skipped);
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        let Some(kind) = self.config.classify(&ext) else {
            return Err(Error::UnsupportedExtension {
                path: path.to_path_buf(),
            });
        };

        let resolved = resolve_timestamp(
            path,
            kind,
            &self.config,
            &mut self.resolver,
            self.probe.as_ref(),
        )?;

        let Some(dest) = plan_destination(path, &resolved.datetime, kind, &ext, &self.config)?
        else {
            return Ok(Outcome::Duplicate);
        };

        place_file(path, &dest, &resolved.datetime, &self.config)?;
        info!(
            source = %path.display(),
            dest = %dest.display(),
            time_source = ?resolved.source,
            "placed file"
        );
        Ok(Outcome::Placed)
    }
}
