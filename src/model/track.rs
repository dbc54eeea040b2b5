//! Forecast track types: the artifact handed to visualization.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{HeadingHypothesis, HypothesisBasis, VesselId};
use crate::heading::HeadingEstimate;

/// A single forecast position and its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub timestamp: Timestamp,
    pub latitude: f64,
    pub longitude: f64,
    pub uncertainty_radius_km: f64,
}

/// One forecast track for one hypothesis.
///
/// Immutable once produced: a new request always yields new tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastTrack {
    pub vessel_id: VesselId,
    /// Index of the hypothesis within the forecast that produced this track.
    pub hypothesis_id: usize,
    pub hypothesis: HeadingHypothesis,
    pub basis: HypothesisBasis,
    /// Points from forecast start to horizon, inclusive.
    pub points: Vec<ForecastPoint>,
    /// The basis time of the forecast: the timestamp of the last fix.
    pub generated_at: Timestamp,
    /// Course and speed measured from the last two fixes, for inferred tracks.
    /// Shows whether the speed was clamped and what was actually observed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<HeadingEstimate>,
}

/// A positional uncertainty disc for one hypothesis at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertaintyDisc {
    pub hypothesis_id: usize,
    pub weight: f64,
    pub timestamp: Timestamp,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl ForecastTrack {
    /// The uncertainty discs along this track, one per point.
    pub fn discs(&self) -> impl Iterator<Item = UncertaintyDisc> + '_ {
        self.points.iter().map(|p| self.disc(p))
    }

    /// The final forecast point.
    pub fn end(&self) -> Option<&ForecastPoint> {
        self.points.last()
    }

    fn disc(&self, point: &ForecastPoint) -> UncertaintyDisc {
        UncertaintyDisc {
            hypothesis_id: self.hypothesis_id,
            weight: self.hypothesis.weight,
            timestamp: point.timestamp,
            latitude: point.latitude,
            longitude: point.longitude,
            radius_km: point.uncertainty_radius_km,
        }
    }
}

/// Every hypothesis's disc at step `index`.
///
/// The union of these discs is the cone footprint at that instant;
/// merging them into an envelope is left to the renderer.
pub fn discs_at(tracks: &[ForecastTrack], index: usize) -> Vec<UncertaintyDisc> {
    tracks
        .iter()
        .filter_map(|t| t.points.get(index).map(|p| t.disc(p)))
        .collect()
}
