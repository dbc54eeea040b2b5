//! Heading estimation from a vessel's fixes: the latest leg for the forecast
//! engine, and statistics over every leg for the ensemble.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SpeedRange;
use crate::error::{ForecastError, Result};
use crate::geo::{self, Position};
use crate::model::VesselState;

/// Course and speed inferred from the last two fixes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingEstimate {
    pub bearing_degrees: f64,
    /// Speed after clamping into the plausible range.
    pub speed_kmh: f64,
    /// Speed as measured, before clamping.
    pub raw_speed_kmh: f64,
    pub distance_km: f64,
    pub elapsed_h: f64,
}

impl HeadingEstimate {
    /// Whether the measured speed was clamped.
    pub fn clamped(&self) -> bool {
        self.speed_kmh != self.raw_speed_kmh
    }
}

/// Course and speed summarized over every time-ordered leg of a history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStatistics {
    /// Legs with positive elapsed time. Legs between fixes sharing a
    /// timestamp are skipped.
    pub legs: usize,
    /// Mean leg speed, clamped into the plausible range.
    pub mean_speed_kmh: f64,
    /// Population standard deviation of leg speeds.
    pub speed_std_kmh: f64,
    /// Circular mean of leg bearings.
    pub mean_bearing_degrees: f64,
    /// Circular standard deviation of leg bearings, at most 180.
    pub bearing_std_deg: f64,
}

/// Derives course and speed from a vessel's history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingEstimator {
    speed_range: SpeedRange,
}

impl HeadingEstimator {
    pub fn new(speed_range: SpeedRange) -> Self {
        Self { speed_range }
    }

    /// Estimates heading from the two most recent fixes.
    ///
    /// Returns `Ok(None)` for a single-fix history: there is no heading to
    /// infer and the caller should fan out over hypotheses. Fails with
    /// [`ForecastError::InsufficientData`] when the two fixes are not
    /// strictly time-ordered.
    pub fn estimate(&self, state: &VesselState) -> Result<Option<HeadingEstimate>> {
        let Some((prev, last)) = state.last_two() else {
            return Ok(None);
        };

        let elapsed_h = last.timestamp.duration_since(prev.timestamp).as_secs_f64() / 3600.0;
        if elapsed_h <= 0.0 {
            return Err(ForecastError::InsufficientData {
                vessel: state.vessel_id().clone(),
                reason: format!(
                    "fixes at {} and {} are not strictly time-ordered",
                    prev.timestamp, last.timestamp
                ),
            });
        }

        let from = Position::new(prev.latitude, prev.longitude);
        let to = Position::new(last.latitude, last.longitude);
        let distance_km = geo::distance_km(from, to);
        let raw_speed_kmh = distance_km / elapsed_h;
        let speed_kmh = self.speed_range.clamp(raw_speed_kmh);

        if speed_kmh != raw_speed_kmh {
            warn!(
                vessel = %state.vessel_id(),
                raw_speed_kmh,
                speed_kmh,
                "inferred speed outside plausible range, clamped"
            );
        }

        Ok(Some(HeadingEstimate {
            bearing_degrees: geo::initial_bearing(from, to),
            speed_kmh,
            raw_speed_kmh,
            distance_km,
            elapsed_h,
        }))
    }

    /// Speed and bearing statistics over the whole history.
    ///
    /// `None` when no pair of consecutive fixes is strictly time-ordered.
    pub fn course_statistics(&self, state: &VesselState) -> Option<CourseStatistics> {
        let legs: Vec<(f64, f64)> = state
            .history()
            .windows(2)
            .filter_map(|pair| {
                let (prev, next) = (&pair[0], &pair[1]);
                let elapsed_h =
                    next.timestamp.duration_since(prev.timestamp).as_secs_f64() / 3600.0;
                if elapsed_h <= 0.0 {
                    return None;
                }
                let from = Position::new(prev.latitude, prev.longitude);
                let to = Position::new(next.latitude, next.longitude);
                Some((geo::distance_km(from, to) / elapsed_h, geo::initial_bearing(from, to)))
            })
            .collect();
        if legs.is_empty() {
            return None;
        }

        let n = legs.len() as f64;
        let mean_speed = legs.iter().map(|&(speed, _)| speed).sum::<f64>() / n;
        let variance = legs
            .iter()
            .map(|&(speed, _)| (speed - mean_speed).powi(2))
            .sum::<f64>()
            / n;

        let (sin, cos) = legs.iter().fold((0.0, 0.0), |(sin, cos), &(_, bearing)| {
            let b = f64::to_radians(bearing);
            (sin + b.sin(), cos + b.cos())
        });
        let resultant = (sin.hypot(cos) / n).min(1.0);
        let bearing_std_deg = if resultant > 0.0 {
            (-2.0 * resultant.ln()).sqrt().to_degrees().min(180.0)
        } else {
            180.0
        };

        debug!(
            vessel = %state.vessel_id(),
            legs = legs.len(),
            mean_speed,
            bearing_std_deg,
            "course statistics"
        );

        Some(CourseStatistics {
            legs: legs.len(),
            mean_speed_kmh: self.speed_range.clamp(mean_speed),
            speed_std_kmh: variance.sqrt(),
            mean_bearing_degrees: geo::normalize_bearing(sin.atan2(cos).to_degrees()),
            bearing_std_deg,
        })
    }
}
