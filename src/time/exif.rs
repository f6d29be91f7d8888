//! EXIF timestamp and GPS extraction for images

use crate::geo::{GeoCoordinate, dms_to_decimal};
use chrono::NaiveDateTime;
use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::trace;

/// EXIF tags to try for the capture time, in priority order
const DATE_TAGS: &[Tag] = &[
    Tag::DateTimeOriginal,  // When the original image was taken
    Tag::DateTime,          // File change date/time
    Tag::DateTimeDigitized, // When the image was digitized
];

/// Timestamp and coordinate pulled out of an image's EXIF block
///
/// Absent or unreadable tags leave the fields `None`; extraction itself
/// never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageMetadata {
    /// Wall-clock capture time with no timezone encoded
    pub datetime: Option<NaiveDateTime>,
    /// GPS position, when the tag block carries one
    pub gps: Option<GeoCoordinate>,
}

/// Read the EXIF block of an image file.
///
/// Unreadable files and non-image content produce an empty result.
pub fn read_image_metadata(path: &Path) -> ImageMetadata {
    let exif = match open_exif(path) {
        Some(exif) => exif,
        None => return ImageMetadata::default(),
    };
    ImageMetadata {
        datetime: extract_datetime(&exif, path),
        gps: extract_gps(&exif),
    }
}

fn open_exif(path: &Path) -> Option<Exif> {
    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    Reader::new().read_from_container(&mut reader).ok()
}

fn extract_datetime(exif: &Exif, path: &Path) -> Option<NaiveDateTime> {
    for tag in DATE_TAGS {
        if let Some(field) = exif.get_field(*tag, In::PRIMARY)
            && let Some(datetime) = parse_exif_datetime(&field.display_value().to_string())
        {
            trace!(?path, ?tag, "found EXIF date");
            return Some(datetime);
        }
    }
    None
}

/// Parse the EXIF datetime pattern "YYYY:MM:DD HH:MM:SS"
fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');

    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y:%m:%d %H:%M:%S") {
        return Some(dt);
    }

    // kamadak-exif renders DateTime values with dashes
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()
}

fn extract_gps(exif: &Exif) -> Option<GeoCoordinate> {
    let latitude = coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
    let longitude = coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?;
    Some(GeoCoordinate::new(latitude, longitude))
}

/// One signed coordinate from a DMS triple plus its hemisphere reference
fn coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let triple = dms_components(&exif.get_field(value_tag, In::PRIMARY)?.value)?;
    let hemisphere = hemisphere(exif.get_field(ref_tag, In::PRIMARY)?)?;
    Some(dms_to_decimal(triple[0], triple[1], triple[2], hemisphere))
}

/// A degree/minute/second triple from a GPS tag value.
///
/// Cameras write rationals, which convert by numerator/denominator
/// division; plain numeric forms are accepted too.
fn dms_components(value: &Value) -> Option<[f64; 3]> {
    fn nth(value: &Value, i: usize) -> Option<f64> {
        match value {
            Value::Rational(v) => {
                let r = v.get(i)?;
                (r.denom != 0).then(|| f64::from(r.num) / f64::from(r.denom))
            }
            Value::SRational(v) => {
                let r = v.get(i)?;
                (r.denom != 0).then(|| f64::from(r.num) / f64::from(r.denom))
            }
            Value::Double(v) => v.get(i).copied(),
            Value::Float(v) => v.get(i).map(|f| f64::from(*f)),
            Value::Short(v) => v.get(i).map(|n| f64::from(*n)),
            Value::Long(v) => v.get(i).map(|n| f64::from(*n)),
            _ => None,
        }
    }
    Some([nth(value, 0)?, nth(value, 1)?, nth(value, 2)?])
}

/// Hemisphere reference marker (N/S/E/W) from a GPS ref tag
fn hemisphere(field: &exif::Field) -> Option<char> {
    field
        .display_value()
        .to_string()
        .trim()
        .trim_matches('"')
        .chars()
        .next()
        .filter(|c| matches!(c, 'N' | 'S' | 'E' | 'W'))
}

/// Minimal little-endian TIFF holding a single ASCII DateTime entry
/// (tag 0x0132) in IFD0, enough for the reader to sniff and parse.
#[cfg(test)]
pub(crate) fn tiff_with_datetime(datetime: &str) -> Vec<u8> {
    let mut value = datetime.as_bytes().to_vec();
    value.push(0);

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"II\x2a\x00");
    bytes.extend_from_slice(&8u32.to_le_bytes()); // IFD0 offset
    bytes.extend_from_slice(&1u16.to_le_bytes()); // entry count
    bytes.extend_from_slice(&0x0132u16.to_le_bytes()); // DateTime
    bytes.extend_from_slice(&2u16.to_le_bytes()); // ASCII
    bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&26u32.to_le_bytes()); // value offset
    bytes.extend_from_slice(&0u32.to_le_bytes()); // no next IFD
    bytes.extend_from_slice(&value);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_exif_datetime() {
        let dt = parse_exif_datetime("2020:05:01 10:00:00").unwrap();
        assert_eq!(dt.year(), 2020);
        assert_eq!(dt.month(), 5);
        assert_eq!(dt.day(), 1);
        assert_eq!(dt.hour(), 10);
        assert_eq!(dt.minute(), 0);
        assert_eq!(dt.second(), 0);

        // With quotes
        let dt = parse_exif_datetime("\"2020:05:01 10:00:00\"").unwrap();
        assert_eq!(dt.year(), 2020);

        // Dash-rendered form
        let dt = parse_exif_datetime("2020-05-01 10:00:00").unwrap();
        assert_eq!(dt.year(), 2020);

        // Invalid input
        assert!(parse_exif_datetime("invalid").is_none());
        assert!(parse_exif_datetime("2020:13:01 10:00:00").is_none());
    }

    #[test]
    fn test_dms_components_rational() {
        let value = Value::Rational(vec![
            exif::Rational { num: 28, denom: 1 },
            exif::Rational { num: 21, denom: 1 },
            exif::Rational {
                num: 2736,
                denom: 100,
            },
        ]);
        let triple = dms_components(&value).unwrap();
        assert_eq!(triple[0], 28.0);
        assert_eq!(triple[1], 21.0);
        assert!((triple[2] - 27.36).abs() < 1e-9);
    }

    #[test]
    fn test_dms_components_plain_numbers() {
        let value = Value::Double(vec![139.0, 45.0, 5.76]);
        let triple = dms_components(&value).unwrap();
        assert_eq!(triple[0], 139.0);
        assert!((triple[2] - 5.76).abs() < 1e-9);
    }

    #[test]
    fn test_dms_components_rejects_short_or_zero_denom() {
        let short = Value::Rational(vec![exif::Rational { num: 28, denom: 1 }]);
        assert!(dms_components(&short).is_none());

        let zero_denom = Value::Rational(vec![
            exif::Rational { num: 28, denom: 0 },
            exif::Rational { num: 21, denom: 1 },
            exif::Rational { num: 27, denom: 1 },
        ]);
        assert!(dms_components(&zero_denom).is_none());
    }

    #[test]
    fn test_read_image_metadata_from_container() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("photo.tif");
        std::fs::write(&path, tiff_with_datetime("2020:05:01 10:00:00")).unwrap();

        let meta = read_image_metadata(&path);
        let dt = meta.datetime.unwrap();
        assert_eq!(dt.year(), 2020);
        assert_eq!(dt.month(), 5);
        assert_eq!(dt.day(), 1);
        assert_eq!(dt.hour(), 10);
        assert!(meta.gps.is_none());
    }

    #[test]
    fn test_unreadable_file_is_soft_failure() {
        let meta = read_image_metadata(Path::new("/nonexistent/file.jpg"));
        assert!(meta.datetime.is_none());
        assert!(meta.gps.is_none());
    }
}
