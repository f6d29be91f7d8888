//! Video metadata extraction via FFprobe
//!
//! Container creation times are absolute UTC instants, so the video path
//! resolves its own timezone from the container's location tag instead of
//! going through the wall-clock timezone modes.

use crate::geo::{self, GeoCoordinate};
use crate::tz::TzResolver;
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// How long a single ffprobe invocation may run before being killed
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Cached FFprobe availability check
static FFPROBE_AVAILABLE: OnceLock<bool> = OnceLock::new();

fn is_ffprobe_available() -> bool {
    *FFPROBE_AVAILABLE.get_or_init(|| Command::new("ffprobe").arg("-version").output().is_ok())
}

/// Container-level metadata a probe returns
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeFormat {
    #[serde(default)]
    pub tags: ProbeTags,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeTags {
    pub creation_time: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "location-eng")]
    pub location_eng: Option<String>,
}

#[derive(Default, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: ProbeFormat,
}

/// Why a probe produced no metadata
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("ffprobe not found in PATH")]
    NotFound,

    #[error("failed to run ffprobe: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffprobe did not finish within {0:?}")]
    Timeout(Duration),

    #[error("ffprobe exited with {status}")]
    Failed { status: std::process::ExitStatus },

    #[error("malformed ffprobe output: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Container metadata source
///
/// The production implementation shells out to ffprobe; tests substitute
/// canned output instead of spawning a subprocess.
pub trait MetadataProbe {
    fn probe(&self, path: &Path) -> Result<ProbeFormat, ProbeError>;
}

/// The real ffprobe subprocess, with a bounded runtime
pub struct Ffprobe {
    timeout: Duration,
}

impl Default for Ffprobe {
    fn default() -> Self {
        Self {
            timeout: PROBE_TIMEOUT,
        }
    }
}

impl MetadataProbe for Ffprobe {
    fn probe(&self, path: &Path) -> Result<ProbeFormat, ProbeError> {
        if !is_ffprobe_available() {
            return Err(ProbeError::NotFound);
        }

        let mut child = Command::new("ffprobe")
            .args([
                "-hide_banner",
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() > self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProbeError::Timeout(self.timeout));
            }
            std::thread::sleep(Duration::from_millis(25));
        };
        if !status.success() {
            return Err(ProbeError::Failed { status });
        }

        let mut stdout = Vec::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_end(&mut stdout)?;
        }
        let output: ProbeOutput = serde_json::from_slice(&stdout)?;
        Ok(output.format)
    }
}

/// Extract a zoned creation time from video container metadata.
///
/// When the container also carries a location, the UTC instant is rendered
/// in the zone at those coordinates; otherwise it stays in UTC. All
/// failures are soft.
pub fn read_video_metadata(
    path: &Path,
    probe: &dyn MetadataProbe,
    resolver: &TzResolver,
) -> Option<DateTime<Tz>> {
    let format = match probe.probe(path) {
        Ok(format) => format,
        Err(err) => {
            debug!(?path, %err, "video probe failed");
            return None;
        }
    };

    let created = format
        .tags
        .creation_time
        .as_deref()
        .and_then(parse_creation_time)?;

    let zone = format
        .tags
        .location
        .as_deref()
        .or(format.tags.location_eng.as_deref())
        .and_then(|raw| location_zone(raw, resolver))
        .unwrap_or(Tz::UTC);

    Some(created.with_timezone(&zone))
}

/// Parse the container creation-time format "YYYY-MM-DDTHH:MM:SS.ffffffZ"
fn parse_creation_time(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S%.fZ")
        .ok()
        .map(|dt| dt.and_utc())
}

/// Zone at the coordinates in an ISO 6709 location string.
///
/// The coordinate round-trips through the DMS form so rounding matches the
/// EXIF GPS path. A malformed string is an explicit `None`, never a stale
/// zone.
fn location_zone(raw: &str, resolver: &TzResolver) -> Option<Tz> {
    let coord = match geo::parse_location(raw) {
        Some(coord) => coord,
        None => {
            warn!(location = raw, "location parse failed");
            return None;
        }
    };

    let (lat_d, lat_m, lat_s) = geo::decimal_to_dms(coord.latitude);
    let (lon_d, lon_m, lon_s) = geo::decimal_to_dms(coord.longitude);
    let lat_ref = if coord.latitude >= 0.0 { 'N' } else { 'S' };
    let lon_ref = if coord.longitude >= 0.0 { 'E' } else { 'W' };
    let snapped = GeoCoordinate::new(
        geo::dms_to_decimal(lat_d, lat_m, lat_s, lat_ref),
        geo::dms_to_decimal(lon_d, lon_m, lon_s, lon_ref),
    );

    resolver.lookup(snapped)
}
