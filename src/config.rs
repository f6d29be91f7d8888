//! Configuration types for the media sorter

use crate::error::{Error, Result};
use crate::tz::TzMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How files are materialized at their destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlaceMode {
    /// Create relative symbolic links, falling back to copy on failure
    #[default]
    Link,
    /// Copy content and restore the resolved timestamp on the destination
    Copy,
}

/// Duplicate check method for destination collisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CmpMode {
    /// Size and mtime heuristic, no content read (fast)
    #[default]
    Shallow,
    /// Full SHA-256 digest comparison (accurate)
    Hash,
}

/// Category a media file belongs to, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    /// Companion files (camera indexes, logs, edits) without their own
    /// timestamp metadata; placed under a `raw` subdirectory
    Sidecar,
}

/// Runtime configuration for the sorter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned recursively for media files
    pub source_dir: PathBuf,

    /// Base output directory for the sorted tree
    pub output_dir: PathBuf,

    /// Link vs copy placement
    pub operation: PlaceMode,

    /// Duplicate check method for destination collisions
    pub cmp_mode: CmpMode,

    /// Timezone for interpreting EXIF wall-clock timestamps
    pub timezone: TzMode,

    /// Apply the skip-dir name list during traversal
    pub enable_skip_dirs: bool,

    /// Directory names pruned from traversal (case-insensitive substring
    /// match against any path segment)
    pub skip_dirs: Vec<String>,

    /// Attempt EXIF extraction for sidecar files too
    pub sidecar_exif: bool,

    /// Supported image extensions
    pub image_extensions: Vec<String>,

    /// Supported video extensions
    pub video_extensions: Vec<String>,

    /// Supported sidecar extensions
    pub sidecar_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            operation: PlaceMode::default(),
            cmp_mode: CmpMode::default(),
            timezone: TzMode::default(),
            enable_skip_dirs: false,
            skip_dirs: vec![],
            sidecar_exif: false,
            image_extensions: vec![
                "jpg".into(), "jpeg".into(), "png".into(), "bmp".into(),
                "gif".into(), "tiff".into(), "tif".into(),
            ],
            video_extensions: vec![
                "mp4".into(), "mov".into(), "m4v".into(), "3gp".into(),
                "3g2".into(), "avi".into(), "mts".into(), "mkv".into(),
                "flv".into(), "m2ts".into(), "mpg".into(), "vob".into(),
                "wmv".into(),
            ],
            sidecar_extensions: vec![
                "arw".into(), "mrw".into(), "cpi".into(), "thm".into(),
                "clpi".into(), "mpls".into(), "bdmv".into(), "spi".into(),
                "spd".into(), "bup".into(), "ifo".into(), "xml".into(),
                "xmz".into(), "trl".into(), "mht".into(),
            ],
        }
    }
}

impl Config {
    /// Classify a (lowercased) extension into a media kind
    pub fn classify(&self, ext: &str) -> Option<MediaKind> {
        let ext = ext.to_lowercase();
        if self.image_extensions.iter().any(|e| e == &ext) {
            Some(MediaKind::Image)
        } else if self.video_extensions.iter().any(|e| e == &ext) {
            Some(MediaKind::Video)
        } else if self.sidecar_extensions.iter().any(|e| e == &ext) {
            Some(MediaKind::Sidecar)
        } else {
            None
        }
    }

    /// Whether a path segment matches the skip-dir list
    pub fn matches_skip_dir(&self, segment: &str) -> bool {
        let segment = segment.to_lowercase();
        self.skip_dirs
            .iter()
            .any(|name| !name.is_empty() && segment.contains(&name.to_lowercase()))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("failed to parse '{}': {}", path.display(), e))
        })
    }

    /// Generate a commented sample configuration file
    pub fn sample_config() -> String {
        r#"# tzsort configuration file
# This file uses TOML format (https://toml.io)

# Input directory, scanned recursively for media files
source_dir = "."

# Base output directory for the sorted tree
output_dir = "/media/sorted"

# File placement: "link" (relative symbolic links) or "copy"
# Copies get their access and modification times set to the resolved timestamp
operation = "link"

# Duplicate check method for destination collisions
# - shallow: size and mtime heuristic, no content read (default)
# - hash: full SHA-256 digest comparison
cmp_mode = "shallow"

# Timezone for interpreting EXIF timestamps
# - "auto": determine the zone from GPS coordinates when available
# - "local": the last-resolved zone, initially the host timezone (default)
# - an IANA name like "Asia/Tokyo" or "America/New_York"
timezone = "local"

# Skip directories whose name matches an entry in skip_dirs
# (case-insensitive substring match against any path segment)
enable_skip_dirs = false
skip_dirs = ["LINE", "Facebook"]

# Also try EXIF extraction for sidecar files
sidecar_exif = false

# Supported file extensions (customize as needed)
image_extensions = ["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif"]
video_extensions = ["mp4", "mov", "m4v", "3gp", "3g2", "avi", "mts", "mkv", "flv", "m2ts", "mpg", "vob", "wmv"]
sidecar_extensions = ["arw", "mrw", "cpi", "thm", "clpi", "mpls", "bdmv", "spi", "spd", "bup", "ifo", "xml", "xmz", "trl", "mht"]
"#
        .to_string()
    }
}
