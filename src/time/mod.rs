//! Timestamp resolution
//!
//! Produces one timezone-attached timestamp per media file:
//! - EXIF metadata for images, zoned via the configured timezone mode
//! - FFprobe container metadata for videos, zoned via the container's own
//!   location tag
//! - File system modification time as the fallback, tagged with the
//!   current last-used zone

pub mod exif;
pub mod video;

use crate::config::{Config, MediaKind};
use crate::error::{Error, Result};
use crate::tz::TzResolver;
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use self::video::MetadataProbe;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Timestamps whose local year is below this are treated as corrupt
/// metadata, not genuine dates
pub const MIN_VALID_YEAR: i32 = 1971;

/// Source of the resolved timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSource {
    /// Extracted from EXIF metadata
    Exif,
    /// Extracted from video container metadata via FFprobe
    VideoMetadata,
    /// From file system modification time
    FileSystem,
}

/// A timestamp with its timezone attached, ready for destination planning
#[derive(Debug, Clone)]
pub struct ResolvedTimestamp {
    pub datetime: DateTime<Tz>,
    pub source: TimeSource,
}

/// Resolve the canonical timestamp for one file.
///
/// Metadata extraction failures are soft and fall through to the mtime
/// fallback; only a file with no metadata and no readable mtime, or a
/// resolved year before 1971, is an error.
pub fn resolve_timestamp(
    path: &Path,
    kind: MediaKind,
    config: &Config,
    resolver: &mut TzResolver,
    probe: &dyn MetadataProbe,
) -> Result<ResolvedTimestamp> {
    let extracted = match kind {
        MediaKind::Image => image_timestamp(path, config, resolver),
        MediaKind::Video => video::read_video_metadata(path, probe, resolver)
            .map(|datetime| (datetime, TimeSource::VideoMetadata)),
        MediaKind::Sidecar if config.sidecar_exif => image_timestamp(path, config, resolver),
        MediaKind::Sidecar => None,
    };

    let (datetime, source) = match extracted {
        Some(found) => found,
        None => (mtime_timestamp(path, resolver)?, TimeSource::FileSystem),
    };

    if datetime.year() < MIN_VALID_YEAR {
        return Err(Error::TimestampOutOfRange {
            path: path.to_path_buf(),
            year: datetime.year(),
        });
    }

    Ok(ResolvedTimestamp { datetime, source })
}

/// EXIF wall-clock time plus a zone from the configured mode
fn image_timestamp(
    path: &Path,
    config: &Config,
    resolver: &mut TzResolver,
) -> Option<(DateTime<Tz>, TimeSource)> {
    let meta = exif::read_image_metadata(path);
    let naive = meta.datetime?;
    let zone = resolver.resolve(config.timezone, meta.gps);
    let zoned = naive.and_local_timezone(zone).earliest()?;
    debug!(?path, timestamp = %zoned, "extracted time from EXIF");
    Some((zoned, TimeSource::Exif))
}

/// File mtime rendered in the current last-used zone
fn mtime_timestamp(path: &Path, resolver: &TzResolver) -> Result<DateTime<Tz>> {
    let modified = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map_err(|e| Error::TimestampUnavailable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    let utc: DateTime<Utc> = modified.into();
    let fallback = utc.with_timezone(&resolver.last_used());
    info!(path = %path.display(), timestamp = %fallback, "using mtime fallback");
    Ok(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use filetime::FileTime;
    use std::io::Write;
    use super::video::{ProbeError, ProbeFormat};
    use tempfile::TempDir;

    struct NoProbe;

    impl MetadataProbe for NoProbe {
        fn probe(&self, _path: &Path) -> std::result::Result<ProbeFormat, ProbeError> {
            Err(ProbeError::NotFound)
        }
    }

    fn file_with_mtime(dir: &TempDir, name: &str, epoch: i64) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"sidecar payload").unwrap();
        drop(file);
        filetime::set_file_mtime(&path, FileTime::from_unix_time(epoch, 0)).unwrap();
        path
    }

    #[test]
    fn test_mtime_fallback_uses_last_used_zone() {
        let dir = TempDir::new().unwrap();
        let epoch = Utc
            .with_ymd_and_hms(2022, 3, 5, 10, 20, 30)
            .unwrap()
            .timestamp();
        let path = file_with_mtime(&dir, "index.xmz", epoch);

        let config = Config::default();
        let mut resolver = TzResolver::with_zone(Tz::Asia__Tokyo);
        let resolved =
            resolve_timestamp(&path, MediaKind::Sidecar, &config, &mut resolver, &NoProbe)
                .unwrap();

        assert_eq!(resolved.source, TimeSource::FileSystem);
        assert_eq!(resolved.datetime.timezone(), Tz::Asia__Tokyo);
        // 10:20:30 UTC is 19:20:30 in Tokyo
        assert_eq!(
            resolved.datetime.format("%Y%m%d-%H%M%S").to_string(),
            "20220305-192030"
        );
    }

    #[test]
    fn test_image_without_exif_falls_back_to_mtime() {
        let dir = TempDir::new().unwrap();
        let epoch = Utc
            .with_ymd_and_hms(2020, 5, 1, 10, 0, 0)
            .unwrap()
            .timestamp();
        let path = file_with_mtime(&dir, "not-really.jpg", epoch);

        let config = Config::default();
        let mut resolver = TzResolver::with_zone(Tz::UTC);
        let resolved =
            resolve_timestamp(&path, MediaKind::Image, &config, &mut resolver, &NoProbe).unwrap();

        assert_eq!(resolved.source, TimeSource::FileSystem);
        assert_eq!(
            resolved.datetime.format("%Y%m%d-%H%M%S").to_string(),
            "20200501-100000"
        );
    }

    #[test]
    fn test_year_1971_accepted() {
        let dir = TempDir::new().unwrap();
        let epoch = Utc
            .with_ymd_and_hms(1971, 1, 1, 12, 0, 0)
            .unwrap()
            .timestamp();
        let path = file_with_mtime(&dir, "old.xmz", epoch);

        let config = Config::default();
        let mut resolver = TzResolver::with_zone(Tz::UTC);
        let resolved =
            resolve_timestamp(&path, MediaKind::Sidecar, &config, &mut resolver, &NoProbe)
                .unwrap();
        assert_eq!(resolved.datetime.year(), 1971);
    }

    #[test]
    fn test_year_1970_rejected() {
        let dir = TempDir::new().unwrap();
        let epoch = Utc
            .with_ymd_and_hms(1970, 6, 1, 12, 0, 0)
            .unwrap()
            .timestamp();
        let path = file_with_mtime(&dir, "epoch.xmz", epoch);

        let config = Config::default();
        let mut resolver = TzResolver::with_zone(Tz::UTC);
        let result =
            resolve_timestamp(&path, MediaKind::Sidecar, &config, &mut resolver, &NoProbe);
        assert!(matches!(
            result,
            Err(Error::TimestampOutOfRange { year: 1970, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let config = Config::default();
        let mut resolver = TzResolver::with_zone(Tz::UTC);
        let result = resolve_timestamp(
            Path::new("/nonexistent/file.xmz"),
            MediaKind::Sidecar,
            &config,
            &mut resolver,
            &NoProbe,
        );
        assert!(matches!(result, Err(Error::TimestampUnavailable { .. })));
    }
}
