//! Timezone mode and resolution
//!
//! The resolver owns the one piece of cross-file state in the pipeline: the
//! zone the most recent successful GPS lookup resolved to. Files without a
//! better signal inherit it, so processing order matters.

use crate::error::Error;
use crate::geo::GeoCoordinate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use tzf_rs::DefaultFinder;

/// How wall-clock timestamps get a timezone attached
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TzMode {
    /// Look the zone up from GPS coordinates when present, UTC otherwise
    Auto,
    /// Use the last-resolved zone (initially the host timezone)
    Local,
    /// A fixed IANA zone given at configuration time
    Fixed(Tz),
}

impl Default for TzMode {
    fn default() -> Self {
        TzMode::Local
    }
}

impl FromStr for TzMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(TzMode::Auto),
            "local" => Ok(TzMode::Local),
            _ => Tz::from_str(s)
                .map(TzMode::Fixed)
                .map_err(|_| Error::InvalidTimezone(s.to_string())),
        }
    }
}

impl fmt::Display for TzMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TzMode::Auto => f.write_str("auto"),
            TzMode::Local => f.write_str("local"),
            TzMode::Fixed(tz) => f.write_str(tz.name()),
        }
    }
}

impl TryFrom<String> for TzMode {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TzMode> for String {
    fn from(mode: TzMode) -> Self {
        mode.to_string()
    }
}

/// Resolves timezones for extracted timestamps
///
/// Holds the last zone a GPS lookup produced, seeded from the host timezone
/// at startup (UTC when the host zone cannot be determined). Only a
/// successful `Auto` lookup writes the cell; every other path is a read.
pub struct TzResolver {
    last_used: Tz,
    finder: DefaultFinder,
}

impl TzResolver {
    /// Resolver seeded with the host timezone
    pub fn from_host() -> Self {
        Self::with_zone(host_zone())
    }

    /// Resolver seeded with an explicit zone
    pub fn with_zone(zone: Tz) -> Self {
        Self {
            last_used: zone,
            finder: DefaultFinder::new(),
        }
    }

    /// The most recently resolved zone
    pub fn last_used(&self) -> Tz {
        self.last_used
    }

    /// Resolve a zone for a naive timestamp according to `mode`.
    ///
    /// `Auto` without a usable coordinate degrades to UTC, not to the
    /// last-used zone, and leaves the state untouched.
    pub fn resolve(&mut self, mode: TzMode, geo: Option<GeoCoordinate>) -> Tz {
        match mode {
            TzMode::Fixed(tz) => tz,
            TzMode::Local => self.last_used,
            TzMode::Auto => match geo.and_then(|g| self.lookup(g)) {
                Some(tz) => {
                    self.last_used = tz;
                    tz
                }
                None => Tz::UTC,
            },
        }
    }

    /// Pure coordinate-to-zone lookup; does not touch the last-used state
    pub fn lookup(&self, geo: GeoCoordinate) -> Option<Tz> {
        let name = self.finder.get_tz_name(geo.longitude, geo.latitude);
        if name.is_empty() {
            return None;
        }
        match Tz::from_str(name) {
            Ok(tz) => {
                debug!(
                    name,
                    latitude = geo.latitude,
                    longitude = geo.longitude,
                    "resolved timezone from coordinates"
                );
                Some(tz)
            }
            Err(_) => None,
        }
    }
}

fn host_zone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| Tz::from_str(&name).ok())
        .unwrap_or(Tz::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("auto".parse::<TzMode>().unwrap(), TzMode::Auto);
        assert_eq!("Local".parse::<TzMode>().unwrap(), TzMode::Local);
        assert_eq!(
            "Asia/Tokyo".parse::<TzMode>().unwrap(),
            TzMode::Fixed(Tz::Asia__Tokyo)
        );
        assert!("Not/AZone".parse::<TzMode>().is_err());
    }

    #[test]
    fn test_fixed_and_local_are_pure_reads() {
        let mut resolver = TzResolver::with_zone(Tz::Europe__Berlin);
        assert_eq!(
            resolver.resolve(TzMode::Fixed(Tz::America__New_York), None),
            Tz::America__New_York
        );
        assert_eq!(resolver.resolve(TzMode::Local, None), Tz::Europe__Berlin);
        assert_eq!(resolver.last_used(), Tz::Europe__Berlin);
    }

    #[test]
    fn test_auto_without_coordinate_degrades_to_utc() {
        let mut resolver = TzResolver::with_zone(Tz::Europe__Berlin);
        assert_eq!(resolver.resolve(TzMode::Auto, None), Tz::UTC);
        // State must not move to UTC on the degraded path
        assert_eq!(resolver.last_used(), Tz::Europe__Berlin);
    }

    #[test]
    fn test_auto_lookup_updates_last_used() {
        let mut resolver = TzResolver::with_zone(Tz::UTC);
        let tokyo = GeoCoordinate::new(35.6580, 139.7516);
        assert_eq!(resolver.resolve(TzMode::Auto, Some(tokyo)), Tz::Asia__Tokyo);
        assert_eq!(resolver.last_used(), Tz::Asia__Tokyo);
    }

    #[test]
    fn test_lookup_is_pure() {
        let resolver = TzResolver::with_zone(Tz::UTC);
        let nyc = GeoCoordinate::new(40.7128, -74.0060);
        assert_eq!(resolver.lookup(nyc), Some(Tz::America__New_York));
        assert_eq!(resolver.last_used(), Tz::UTC);
    }
}
