//! Forecast orchestration: from a vessel state to a cone of forecast tracks.
//!
//! The engine decides which heading hypotheses apply, then walks each one
//! from the last fix to the horizon. Position advances from the previous
//! forecast point so bearing jitter compounds into a random walk, while the
//! uncertainty radius is taken from total elapsed time since forecast start.
//!
//! The engine holds no mutable state. Every call is independent and, for a
//! given state, configuration and seed, reproduces the same tracks.

use std::collections::BTreeMap;

use jiff::{SignedDuration, Timestamp};
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::error::{ForecastError, Result};
use crate::fleet::Fleet;
use crate::geo::Position;
use crate::heading::{HeadingEstimate, HeadingEstimator};
use crate::model::{
    ForecastPoint, ForecastTrack, HeadingHypothesis, HypothesisBasis, VesselId, VesselState,
    normalize_weights,
};
use crate::projector::{KinematicProjector, hypothesis_seed};
use crate::uncertainty::UncertaintyModel;

/// Upper bound on points per track, keeping every forecast's cost bounded.
pub const MAX_STEPS: usize = 100_000;

/// Orchestrates heading estimation, projection and uncertainty growth.
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    estimator: HeadingEstimator,
    projector: KinematicProjector,
    uncertainty: UncertaintyModel,
    default_bearings: Vec<f64>,
    default_speed_kmh: f64,
    max_speed_kmh: f64,
    normalize_weights: bool,
    seed: u64,
    step_h: f64,
    horizon_h: f64,
    horizon_tolerance: f64,
    max_horizon_h: f64,
}

impl ForecastEngine {
    /// Builds an engine from a configuration, validating it first.
    pub fn new(config: &Config) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            estimator: HeadingEstimator::new(config.speed_clamp_range),
            projector: KinematicProjector::new(config.perturbation_magnitude_deg),
            uncertainty: UncertaintyModel::from_config(config),
            default_bearings: config.default_hypothesis_bearings.clone(),
            default_speed_kmh: config.default_speed_kmh,
            max_speed_kmh: config.speed_clamp_range.max,
            normalize_weights: config.normalize_weights,
            seed: config.random_seed,
            step_h: config.step_h,
            horizon_h: config.horizon_h,
            horizon_tolerance: config.horizon_tolerance,
            max_horizon_h: config.max_horizon_h,
        })
    }

    /// The same engine with a different random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn uncertainty(&self) -> &UncertaintyModel {
        &self.uncertainty
    }

    /// Number of tracks produced when heading is unknown and no hypotheses are supplied.
    pub fn default_hypothesis_count(&self) -> usize {
        self.default_bearings.len()
    }

    /// Forecast with the configured horizon and step.
    pub fn forecast_with_defaults(
        &self,
        state: &VesselState,
        hypotheses: Option<&[HeadingHypothesis]>,
    ) -> Result<Vec<ForecastTrack>> {
        self.forecast(state, self.horizon_h, self.step_h, hypotheses)
    }

    /// Forecasts a vessel's movement out to `horizon_h` in steps of `step_h`.
    ///
    /// - In port: no track (empty list).
    /// - Heading inferable from the last two fixes: exactly one track.
    /// - Otherwise: one track per supplied hypothesis, or per configured
    ///   default bearing when none are supplied.
    pub fn forecast(
        &self,
        state: &VesselState,
        horizon_h: f64,
        step_h: f64,
        hypotheses: Option<&[HeadingHypothesis]>,
    ) -> Result<Vec<ForecastTrack>> {
        let steps = step_count(horizon_h, step_h, self.horizon_tolerance, self.max_horizon_h)
            .map_err(ForecastError::InvalidHorizon)?;

        if state.in_port() {
            debug!(vessel = %state.vessel_id(), "vessel in port, no track to project");
            return Ok(Vec::new());
        }

        let (basis, mut hypotheses, estimate) = self.hypotheses_for(state, hypotheses)?;
        if self.normalize_weights {
            normalize_weights(&mut hypotheses);
        }

        info!(
            vessel = %state.vessel_id(),
            basis = ?basis,
            tracks = hypotheses.len(),
            steps,
            "forecasting"
        );

        hypotheses
            .iter()
            .enumerate()
            .map(|(id, h)| {
                let mut track = self.track(state, id, *h, basis, steps, step_h)?;
                track.estimate = estimate;
                Ok(track)
            })
            .collect()
    }

    /// Forecasts every vessel in the fleet with the configured horizon and step.
    ///
    /// Each vessel's result is independent: one failure does not stop the rest.
    pub fn forecast_fleet(&self, fleet: &Fleet) -> BTreeMap<VesselId, Result<Vec<ForecastTrack>>> {
        fleet
            .vessels()
            .map(|state| {
                (
                    state.vessel_id().clone(),
                    self.forecast_with_defaults(state, None),
                )
            })
            .collect()
    }

    /// Picks the hypotheses for a forecast and records where they came from,
    /// along with the estimate an inferred hypothesis was built from.
    fn hypotheses_for(
        &self,
        state: &VesselState,
        supplied: Option<&[HeadingHypothesis]>,
    ) -> Result<(HypothesisBasis, Vec<HeadingHypothesis>, Option<HeadingEstimate>)> {
        if let Some(estimate) = self.infer(state)? {
            if supplied.is_some() {
                debug!(
                    vessel = %state.vessel_id(),
                    "heading inferred, supplied hypotheses not used"
                );
            }
            let inferred =
                HeadingHypothesis::new(estimate.bearing_degrees, estimate.speed_kmh, 1.0);
            return Ok((HypothesisBasis::Inferred, vec![inferred], Some(estimate)));
        }

        match supplied {
            Some([]) => Err(ForecastError::InvalidHypothesis(
                "supplied hypothesis list is empty".to_string(),
            )),
            Some(list) => {
                for h in list {
                    h.validate(self.max_speed_kmh)?;
                }
                Ok((HypothesisBasis::Supplied, list.to_vec(), None))
            }
            None => {
                debug!(
                    vessel = %state.vessel_id(),
                    bearings = self.default_bearings.len(),
                    "heading unknown, fanning out over default bearings"
                );
                let fan = self
                    .default_bearings
                    .iter()
                    .map(|&b| HeadingHypothesis::new(b, self.default_speed_kmh, 1.0))
                    .collect();
                Ok((HypothesisBasis::FanOut, fan, None))
            }
        }
    }

    /// Runs the estimator, treating unordered fixes as an unknown heading.
    fn infer(&self, state: &VesselState) -> Result<Option<HeadingEstimate>> {
        match self.estimator.estimate(state) {
            Err(err @ ForecastError::InsufficientData { .. }) => {
                warn!(%err, "falling back to hypothesis fan-out");
                Ok(None)
            }
            other => other,
        }
    }

    fn track(
        &self,
        state: &VesselState,
        hypothesis_id: usize,
        hypothesis: HeadingHypothesis,
        basis: HypothesisBasis,
        steps: usize,
        step_h: f64,
    ) -> Result<ForecastTrack> {
        let origin = state.last_fix();
        let start = origin.timestamp;
        let mut run = self.projector.run(hypothesis_seed(self.seed, hypothesis_id));

        let mut position = Position::new(origin.latitude, origin.longitude);
        let mut points = Vec::with_capacity(steps + 1);
        for i in 0..=steps {
            let elapsed_h = i as f64 * step_h;
            if i > 0 {
                position = run.advance(
                    position,
                    hypothesis.bearing_degrees,
                    hypothesis.speed_kmh,
                    step_h,
                )?;
            }
            points.push(ForecastPoint {
                timestamp: offset(start, elapsed_h)?,
                latitude: position.latitude,
                longitude: position.longitude,
                uncertainty_radius_km: self.uncertainty.radius_km(elapsed_h)?,
            });
        }

        Ok(ForecastTrack {
            vessel_id: state.vessel_id().clone(),
            hypothesis_id,
            hypothesis,
            basis,
            points,
            generated_at: start,
            estimate: None,
        })
    }
}

/// `start` plus `hours`, to the millisecond.
pub(crate) fn offset(start: Timestamp, hours: f64) -> Result<Timestamp> {
    #[allow(clippy::cast_possible_truncation)]
    let millis = (hours * 3_600_000.0).round() as i64;
    start
        .checked_add(SignedDuration::from_millis(millis))
        .map_err(|e| ForecastError::Timestamp(e.to_string()))
}

/// Number of steps from 0 to `horizon_h`, checking that `step_h` divides it.
pub(crate) fn step_count(
    horizon_h: f64,
    step_h: f64,
    tolerance: f64,
    max_horizon_h: f64,
) -> core::result::Result<usize, String> {
    if !(step_h.is_finite() && step_h > 0.0) {
        return Err(format!("step {step_h} h must be positive"));
    }
    if !(horizon_h.is_finite() && horizon_h > 0.0) {
        return Err(format!("horizon {horizon_h} h must be positive"));
    }
    if horizon_h > max_horizon_h {
        return Err(format!("horizon {horizon_h} h exceeds the maximum of {max_horizon_h} h"));
    }
    let ratio = horizon_h / step_h;
    let whole = ratio.round();
    if whole < 1.0 || (ratio - whole).abs() > tolerance {
        return Err(format!("step {step_h} h does not evenly divide horizon {horizon_h} h"));
    }
    if whole > MAX_STEPS as f64 {
        return Err(format!("{whole} steps exceeds the limit of {MAX_STEPS}"));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = whole as usize;
    Ok(steps)
}
