//! Kinematic projection: advancing a position along a course.
//!
//! The deterministic core is great-circle dead reckoning. A projection run
//! optionally jitters each step's bearing by a bounded uniform offset drawn
//! from an RNG seeded for that run, so the same seed always yields the same track.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ForecastError, Result};
use crate::geo::{self, Position};
use crate::model::validate_coordinates;

/// Great-circle dead reckoning with optional per-step bearing jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicProjector {
    perturbation_deg: f64,
}

impl KinematicProjector {
    /// A projector whose runs jitter bearings by up to `perturbation_deg` each step.
    pub fn new(perturbation_deg: f64) -> Self {
        Self { perturbation_deg }
    }

    /// A projector that never perturbs.
    pub fn deterministic() -> Self {
        Self::new(0.0)
    }

    pub fn perturbation_deg(&self) -> f64 {
        self.perturbation_deg
    }

    /// Where `origin` ends up after `duration_h` at `speed_kmh` on `bearing_deg`.
    ///
    /// Inputs are checked before any trigonometry so NaN never reaches the output.
    pub fn project(
        &self,
        origin: Position,
        bearing_deg: f64,
        speed_kmh: f64,
        duration_h: f64,
    ) -> Result<Position> {
        validate_coordinates(origin.latitude, origin.longitude)?;
        if !bearing_deg.is_finite() {
            return Err(ForecastError::InvalidHypothesis(format!(
                "bearing {bearing_deg} is not finite"
            )));
        }
        if !(speed_kmh.is_finite() && speed_kmh >= 0.0) {
            return Err(ForecastError::InvalidHypothesis(format!(
                "speed {speed_kmh} km/h is not a non-negative number"
            )));
        }
        if !(duration_h.is_finite() && duration_h >= 0.0) {
            return Err(ForecastError::InvalidHorizon(format!(
                "duration {duration_h} h is not a non-negative number"
            )));
        }
        Ok(geo::destination(origin, bearing_deg, speed_kmh * duration_h))
    }

    /// Starts a seeded run. Runs with equal seeds produce equal tracks.
    pub fn run(&self, seed: u64) -> ProjectionRun {
        ProjectionRun {
            projector: *self,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

/// One seeded sequence of projection steps.
///
/// Owns its RNG, so concurrent runs never share random state.
#[derive(Debug, Clone)]
pub struct ProjectionRun {
    projector: KinematicProjector,
    rng: StdRng,
}

impl ProjectionRun {
    /// Advances one step, jittering the bearing when perturbation is enabled.
    pub fn advance(
        &mut self,
        from: Position,
        bearing_deg: f64,
        speed_kmh: f64,
        duration_h: f64,
    ) -> Result<Position> {
        let bearing = self.jitter(bearing_deg);
        self.projector.project(from, bearing, speed_kmh, duration_h)
    }

    /// The bearing with this step's random offset applied.
    pub fn jitter(&mut self, bearing_deg: f64) -> f64 {
        let m = self.projector.perturbation_deg;
        if m > 0.0 {
            geo::normalize_bearing(bearing_deg + self.rng.random_range(-m..=m))
        } else {
            bearing_deg
        }
    }

    /// A uniform draw in `[low, high]` from this run's RNG.
    pub(crate) fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high > low {
            self.rng.random_range(low..=high)
        } else {
            low
        }
    }
}

/// Derives the seed for one hypothesis of one forecast run.
pub(crate) fn hypothesis_seed(run_seed: u64, hypothesis_id: usize) -> u64 {
    run_seed ^ (hypothesis_id as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}
