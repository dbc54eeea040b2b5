//! Fix types: single timestamped position observations.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

use super::VesselId;

/// What kind of report produced a fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceEvent {
    /// Position update only.
    Sighting,
    /// The vessel left port.
    Departure,
    /// The vessel entered port.
    Arrival,
}

impl SourceEvent {
    /// Parse an event name, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sighting" => Some(Self::Sighting),
            "departure" => Some(Self::Departure),
            "arrival" => Some(Self::Arrival),
            _ => None,
        }
    }
}

impl fmt::Display for SourceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sighting => "sighting",
            Self::Departure => "departure",
            Self::Arrival => "arrival",
        })
    }
}

/// A single timestamped position observation for a vessel.
///
/// Immutable once recorded. Build through [`Fix::new`] so coordinates are checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fix {
    pub vessel_id: VesselId,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: Timestamp,
    pub source_event: SourceEvent,
}

impl Fix {
    /// Creates a fix, rejecting NaN and out-of-range coordinates.
    pub fn new(
        vessel_id: impl Into<VesselId>,
        latitude: f64,
        longitude: f64,
        timestamp: Timestamp,
        source_event: SourceEvent,
    ) -> Result<Self> {
        let fix = Self {
            vessel_id: vessel_id.into(),
            latitude,
            longitude,
            timestamp,
            source_event,
        };
        fix.validate()?;
        Ok(fix)
    }

    /// Checks that the coordinates are finite and on the globe.
    ///
    /// Boundary values (±90, ±180) are valid.
    pub fn validate(&self) -> Result<()> {
        validate_coordinates(self.latitude, self.longitude)
    }
}

/// Rejects coordinates that would poison projection math.
pub(crate) fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
    let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
    if lat_ok && lon_ok {
        Ok(())
    } else {
        Err(ForecastError::OutOfRangeFix {
            latitude,
            longitude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        "2024-03-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn accepts_boundary_coordinates() {
        assert!(Fix::new("Jin1", 90.0, -180.0, ts(), SourceEvent::Sighting).is_ok());
        assert!(Fix::new("Jin1", -90.0, 180.0, ts(), SourceEvent::Sighting).is_ok());
    }

    #[test]
    fn rejects_nan_and_out_of_range() {
        for (lat, lon) in [(f64::NAN, 0.0), (0.0, f64::NAN), (90.1, 0.0), (0.0, -180.5)] {
            let err = Fix::new("Jin1", lat, lon, ts(), SourceEvent::Sighting).unwrap_err();
            assert!(matches!(err, ForecastError::OutOfRangeFix { .. }));
        }
    }

    #[test]
    fn parses_events_case_insensitively() {
        assert_eq!(SourceEvent::parse("Departure"), Some(SourceEvent::Departure));
        assert_eq!(SourceEvent::parse(" ARRIVAL "), Some(SourceEvent::Arrival));
        assert_eq!(SourceEvent::parse("sighting"), Some(SourceEvent::Sighting));
        assert_eq!(SourceEvent::parse("refit"), None);
    }
}
