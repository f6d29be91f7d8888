//! Geographic coordinate helpers
//!
//! Conversions between decimal degrees and the degree/minute/second form
//! used by EXIF GPS tags, plus the ISO 6709 location string format found
//! in video container metadata.

/// A position in decimal degrees, used only as input to timezone lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Convert a degree/minute/second triple with its hemisphere reference to
/// decimal degrees. `S` and `W` hemispheres yield negative values.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: char) -> f64 {
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    match hemisphere {
        'S' | 'W' => -value,
        _ => value,
    }
}

/// Split decimal degrees into whole degrees, whole minutes and fractional
/// seconds, with seconds rounded to six decimal places. The sign is dropped;
/// callers carry it as a hemisphere reference.
pub fn decimal_to_dms(value: f64) -> (f64, f64, f64) {
    let value = value.abs();
    let degrees = value.trunc();
    let minutes_full = (value - degrees) * 60.0;
    let minutes = minutes_full.trunc();
    let seconds = ((minutes_full - minutes) * 60.0 * 1e6).round() / 1e6;
    (degrees, minutes, seconds)
}

/// Parse an ISO 6709 location string such as `+28.3576-80.6501/`.
///
/// The latitude sign leads the string and the longitude starts at the second
/// sign character. Anything malformed parses to `None`.
pub fn parse_location(raw: &str) -> Option<GeoCoordinate> {
    let loc = raw.trim().trim_end_matches('/');
    let first = loc.chars().next()?;
    if first != '+' && first != '-' {
        return None;
    }
    let split = loc[1..].find(['+', '-']).map(|i| i + 1)?;
    let latitude: f64 = loc[..split].parse().ok()?;
    let longitude: f64 = loc[split..].parse().ok()?;
    if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
        return None;
    }
    Some(GeoCoordinate::new(latitude, longitude))
}
