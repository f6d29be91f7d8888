//! File placement
//!
//! Default is a relative symbolic link from destination to source; copy mode
//! duplicates content and restores the resolved timestamp on the destination.

use crate::config::{Config, PlaceMode};
use crate::error::{Error, Result};
use chrono::{DateTime, Local, TimeZone};
use chrono_tz::Tz;
use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// Place `source` at `dest` according to the configured operation
pub fn place_file(
    source: &Path,
    dest: &Path,
    datetime: &DateTime<Tz>,
    config: &Config,
) -> Result<()> {
    let outcome = match config.operation {
        PlaceMode::Link => link_file(source, dest),
        PlaceMode::Copy => copy_file(source, dest, datetime),
    };
    outcome.map_err(|e| Error::Placement {
        src: source.to_path_buf(),
        dest: dest.to_path_buf(),
        message: e.to_string(),
    })
}

/// Symlink `dest` to the source, relativized against the destination
/// directory. Falls back to a copy when the OS refuses the link.
fn link_file(source: &Path, dest: &Path) -> io::Result<()> {
    let target = symlink_target(source, dest)?;
    match symlink(&target, dest) {
        Ok(()) => {
            debug!(dest = %dest.display(), target = %target.display(), "created symlink");
            Ok(())
        }
        Err(err) => {
            warn!(
                dest = %dest.display(),
                %err,
                "symlink failed, falling back to copy"
            );
            fs::copy(source, dest)?;
            preserve_source_mtime(source, dest);
            Ok(())
        }
    }
}

fn symlink_target(source: &Path, dest: &Path) -> io::Result<PathBuf> {
    let source = fs::canonicalize(source)?;
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    let parent = fs::canonicalize(parent)?;
    Ok(relative_path(&source, &parent))
}

#[cfg(unix)]
fn symlink(target: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(windows)]
fn symlink(target: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, dest)
}

/// Express `target` relative to the directory `base`
fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }
    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

/// Copy content, then stamp both access and modification time with the
/// resolved timestamp in the host's wall clock
fn copy_file(source: &Path, dest: &Path, datetime: &DateTime<Tz>) -> io::Result<()> {
    fs::copy(source, dest)?;
    let stamp = FileTime::from_unix_time(local_epoch(datetime), 0);
    if let Err(err) = filetime::set_file_times(dest, stamp, stamp) {
        warn!(
            dest = %dest.display(),
            %err,
            "failed to restore timestamps after copy"
        );
    }
    Ok(())
}

/// The resolved wall clock reinterpreted as host-local time, in epoch seconds
fn local_epoch(datetime: &DateTime<Tz>) -> i64 {
    Local
        .from_local_datetime(&datetime.naive_local())
        .earliest()
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| datetime.timestamp())
}

fn preserve_source_mtime(source: &Path, dest: &Path) {
    if let Ok(meta) = fs::metadata(source)
        && let Ok(mtime) = meta.modified()
    {
        let _ = filetime::set_file_mtime(dest, FileTime::from_system_time(mtime));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &[u8]) {
        let mut file = fs::File::create(path).unwrap();
        file.write_all(content).unwrap();
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/a/b/c.jpg"), Path::new("/a/b")),
            PathBuf::from("c.jpg")
        );
        assert_eq!(
            relative_path(Path::new("/a/src/c.jpg"), Path::new("/a/out/2020")),
            PathBuf::from("../../src/c.jpg")
        );
        assert_eq!(
            relative_path(Path::new("/a/b"), Path::new("/a/b")),
            PathBuf::from(".")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_link_mode_creates_relative_symlink() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("photo.jpg");
        write_file(&source, b"image bytes");
        let out_dir = dir.path().join("2020/2020_05");
        fs::create_dir_all(&out_dir).unwrap();
        let dest = out_dir.join("20200501-100000.jpg");

        let config = Config::default();
        let dt = Tz::UTC.with_ymd_and_hms(2020, 5, 1, 10, 0, 0).unwrap();
        place_file(&source, &dest, &dt, &config).unwrap();

        let link = fs::read_link(&dest).unwrap();
        assert!(link.is_relative());
        // The link resolves back to the source file
        assert_eq!(
            fs::canonicalize(&dest).unwrap(),
            fs::canonicalize(&source).unwrap()
        );
        assert_eq!(fs::read(&dest).unwrap(), b"image bytes");
    }

    #[test]
    fn test_copy_mode_restores_resolved_timestamp() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("photo.jpg");
        write_file(&source, b"image bytes");
        let dest = dir.path().join("20200501-100000.jpg");

        let config = Config {
            operation: PlaceMode::Copy,
            ..Config::default()
        };
        let dt = Tz::UTC.with_ymd_and_hms(2020, 5, 1, 10, 0, 0).unwrap();
        place_file(&source, &dest, &dt, &config).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"image bytes");
        let mtime = FileTime::from_last_modification_time(&fs::metadata(&dest).unwrap());
        assert_eq!(mtime.unix_seconds(), local_epoch(&dt));
    }

    #[test]
    fn test_placement_error_reports_both_paths() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.jpg");
        let dest = dir.path().join("nonexistent-dir/out.jpg");
        let config = Config::default();
        let dt = Tz::UTC.with_ymd_and_hms(2020, 5, 1, 10, 0, 0).unwrap();

        let result = place_file(&missing, &dest, &dt, &config);
        assert!(matches!(result, Err(Error::Placement { .. })));
    }
}
