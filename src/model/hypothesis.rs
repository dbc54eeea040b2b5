//! Heading hypotheses: candidate courses used when true heading is unknown.

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// One candidate heading/speed assumption.
///
/// Weights are relative plausibilities, not probabilities, unless the
/// engine is configured to normalize them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingHypothesis {
    /// Compass bearing in `[0, 360)`.
    pub bearing_degrees: f64,
    /// Speed in `(0, max_speed]`.
    pub speed_kmh: f64,
    /// Relative plausibility in `(0, 1]`.
    pub weight: f64,
}

impl HeadingHypothesis {
    pub fn new(bearing_degrees: f64, speed_kmh: f64, weight: f64) -> Self {
        Self {
            bearing_degrees,
            speed_kmh,
            weight,
        }
    }

    /// Checks every field against its domain.
    pub fn validate(&self, max_speed_kmh: f64) -> Result<()> {
        if !(self.bearing_degrees.is_finite() && (0.0..360.0).contains(&self.bearing_degrees)) {
            return Err(ForecastError::InvalidHypothesis(format!(
                "bearing {} outside [0, 360)",
                self.bearing_degrees
            )));
        }
        if !(self.speed_kmh > 0.0 && self.speed_kmh <= max_speed_kmh) {
            return Err(ForecastError::InvalidHypothesis(format!(
                "speed {} km/h outside (0, {max_speed_kmh}]",
                self.speed_kmh
            )));
        }
        if !(self.weight > 0.0 && self.weight <= 1.0) {
            return Err(ForecastError::InvalidHypothesis(format!(
                "weight {} outside (0, 1]",
                self.weight
            )));
        }
        Ok(())
    }
}

/// Scales weights so they sum to 1.
pub(crate) fn normalize_weights(hypotheses: &mut [HeadingHypothesis]) {
    let total: f64 = hypotheses.iter().map(|h| h.weight).sum();
    if total > 0.0 {
        for h in hypotheses {
            h.weight /= total;
        }
    }
}

/// Where a track's hypothesis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisBasis {
    /// Course and speed inferred from the last two fixes.
    Inferred,
    /// Supplied by the caller.
    Supplied,
    /// One of the configured default bearings.
    FanOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_domains() {
        assert!(HeadingHypothesis::new(0.0, 10.0, 1.0).validate(20.0).is_ok());
        assert!(HeadingHypothesis::new(359.9, 20.0, 0.1).validate(20.0).is_ok());

        let bad = [
            HeadingHypothesis::new(360.0, 10.0, 1.0),
            HeadingHypothesis::new(-1.0, 10.0, 1.0),
            HeadingHypothesis::new(f64::NAN, 10.0, 1.0),
            HeadingHypothesis::new(90.0, 0.0, 1.0),
            HeadingHypothesis::new(90.0, 20.5, 1.0),
            HeadingHypothesis::new(90.0, 10.0, 0.0),
            HeadingHypothesis::new(90.0, 10.0, 1.5),
        ];
        for h in bad {
            assert!(
                matches!(h.validate(20.0), Err(ForecastError::InvalidHypothesis(_))),
                "{h:?} should be rejected"
            );
        }
    }

    #[test]
    fn normalizes_weights_to_one() {
        let mut hs = vec![
            HeadingHypothesis::new(0.0, 10.0, 1.0),
            HeadingHypothesis::new(90.0, 10.0, 0.5),
            HeadingHypothesis::new(180.0, 10.0, 0.5),
        ];
        normalize_weights(&mut hs);
        let total: f64 = hs.iter().map(|h| h.weight).sum();
        approx::assert_relative_eq!(total, 1.0);
        approx::assert_relative_eq!(hs[0].weight, 0.5);
    }
}
