//! Destination planning and collision resolution

use crate::compare::files_match;
use crate::config::{Config, MediaKind};
use crate::error::Result;
use chrono::{DateTime, Datelike};
use chrono_tz::Tz;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Compute the destination for a resolved file, creating its directory.
///
/// The directory is `<base>/<year>/<year>_<month>`, with a `raw` leaf for
/// sidecar files; the filename is the resolved local wall clock. Returns
/// `None` when an identical copy already occupies a candidate slot; distinct
/// content gets an `-NN` ordinal until a free or identical slot is found.
pub fn plan_destination(
    source: &Path,
    datetime: &DateTime<Tz>,
    kind: MediaKind,
    ext: &str,
    config: &Config,
) -> Result<Option<PathBuf>> {
    let base_dir = config
        .output_dir
        .join(datetime.year().to_string())
        .join(format!("{:04}_{:02}", datetime.year(), datetime.month()));
    let out_dir = match kind {
        MediaKind::Sidecar => base_dir.join("raw"),
        _ => base_dir,
    };
    fs::create_dir_all(&out_dir)?;

    let stem = datetime.format("%Y%m%d-%H%M%S").to_string();
    let mut candidate = out_dir.join(format!("{stem}.{ext}"));
    let mut ordinal = 1u32;
    while candidate.exists() {
        if files_match(source, &candidate, config.cmp_mode)? {
            debug!(
                source = %source.display(),
                existing = %candidate.display(),
                "identical content already placed"
            );
            return Ok(None);
        }
        candidate = out_dir.join(format!("{stem}-{ordinal:02}.{ext}"));
        ordinal += 1;
    }
    Ok(Some(candidate))
}
