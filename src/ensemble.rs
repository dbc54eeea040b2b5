//! Monte Carlo confidence rings around an inferred course.
//!
//! A cloud of particles leaves the last fix. Every step each particle draws
//! its own speed and bearing around the course observed over the vessel's
//! whole history and advances. A step that would end on land turns 45 degrees
//! at a time until it ends in water. The cloud's centroid and the distances
//! that enclose a given share of particles are reported per step as rings.

use jiff::Timestamp;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{Config, ConfigError, EnsembleConfig, SpeedRange};
use crate::engine::{offset, step_count};
use crate::error::{ForecastError, Result};
use crate::geo::{self, Position};
use crate::heading::{CourseStatistics, HeadingEstimator};
use crate::land::LandMask;
use crate::model::{VesselId, VesselState};
use crate::projector::{KinematicProjector, ProjectionRun};

/// Turn applied when a step would end on land.
const LAND_TURN_DEG: f64 = 45.0;
/// Headings tried per step: the drawn one and seven turns.
const HEADINGS_PER_STEP: u32 = 8;

/// Radius enclosing `level` of the particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceRing {
    pub level: f64,
    pub radius_km: f64,
}

/// The particle cloud at one forecast time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleStep {
    pub timestamp: Timestamp,
    pub latitude: f64,
    pub longitude: f64,
    pub rings: Vec<ConfidenceRing>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsembleForecast {
    pub vessel_id: VesselId,
    pub particles: usize,
    pub course: CourseStatistics,
    /// Bearing half-width actually sampled: the configured or observed spread.
    pub bearing_spread_deg: f64,
    /// Speed half-width actually sampled, in km/h.
    pub speed_spread_kmh: f64,
    pub steps: Vec<EnsembleStep>,
    pub generated_at: Timestamp,
}

/// Seeded particle simulator.
#[derive(Debug, Clone)]
pub struct Ensemble {
    settings: EnsembleConfig,
    estimator: HeadingEstimator,
    land: LandMask,
    speed_range: SpeedRange,
    seed: u64,
    horizon_tolerance: f64,
    max_horizon_h: f64,
}

impl Ensemble {
    pub fn new(config: &Config) -> core::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            settings: config.ensemble.clone(),
            estimator: HeadingEstimator::new(config.speed_clamp_range),
            land: LandMask::new(
                config.ensemble.land_boxes.clone(),
                config.ensemble.water_boxes.clone(),
            ),
            speed_range: config.speed_clamp_range,
            seed: config.random_seed,
            horizon_tolerance: config.horizon_tolerance,
            max_horizon_h: config.max_horizon_h,
        })
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Simulates the particle cloud out to `horizon_h`.
    ///
    /// Any vessel not in port qualifies, unknown status included, as long as
    /// its history holds at least one time-ordered leg. Anything else is
    /// [`ForecastError::InsufficientData`].
    pub fn run(
        &self,
        state: &VesselState,
        horizon_h: f64,
        step_h: f64,
    ) -> Result<EnsembleForecast> {
        let steps = step_count(horizon_h, step_h, self.horizon_tolerance, self.max_horizon_h)
            .map_err(ForecastError::InvalidHorizon)?;

        let insufficient = |reason: &str| ForecastError::InsufficientData {
            vessel: state.vessel_id().clone(),
            reason: reason.to_string(),
        };
        if state.in_port() {
            return Err(insufficient("vessel is in port"));
        }
        let Some(course) = self.estimator.course_statistics(state) else {
            return Err(insufficient("no time-ordered pair of fixes to sample a course from"));
        };

        let origin = state.last_fix();
        let start = origin.timestamp;
        let n = self.settings.particles;
        let bearing_spread = self.settings.bearing_spread_deg.max(course.bearing_std_deg);
        let speed_spread = (self.settings.speed_spread * course.mean_speed_kmh)
            .max(course.speed_std_kmh);

        info!(
            vessel = %state.vessel_id(),
            particles = n,
            steps,
            legs = course.legs,
            bearing_spread,
            speed_spread,
            "running ensemble"
        );

        let mut run = KinematicProjector::deterministic().run(self.seed);
        let mut cloud = vec![Position::new(origin.latitude, origin.longitude); n];
        let mut out = Vec::with_capacity(steps + 1);
        out.push(self.summarize(&cloud, offset(start, 0.0)?));

        for i in 1..=steps {
            for particle in &mut cloud {
                let speed = self.speed_range.clamp(
                    course.mean_speed_kmh + run.uniform(-speed_spread, speed_spread),
                );
                let bearing = geo::normalize_bearing(
                    course.mean_bearing_degrees + run.uniform(-bearing_spread, bearing_spread),
                );
                *particle = self.step(&mut run, *particle, bearing, speed, step_h)?;
            }
            let at = offset(start, i as f64 * step_h)?;
            out.push(self.summarize(&cloud, at));
        }

        Ok(EnsembleForecast {
            vessel_id: state.vessel_id().clone(),
            particles: n,
            course,
            bearing_spread_deg: bearing_spread,
            speed_spread_kmh: speed_spread,
            steps: out,
            generated_at: start,
        })
    }

    /// Advances one particle, turning away from land. A particle with land
    /// on every heading holds its position for the step.
    fn step(
        &self,
        run: &mut ProjectionRun,
        from: Position,
        bearing: f64,
        speed_kmh: f64,
        step_h: f64,
    ) -> Result<Position> {
        if self.land.is_empty() {
            return run.advance(from, bearing, speed_kmh, step_h);
        }
        for turn in 0..HEADINGS_PER_STEP {
            let heading = geo::normalize_bearing(bearing + f64::from(turn) * LAND_TURN_DEG);
            let next = run.advance(from, heading, speed_kmh, step_h)?;
            if !self.land.is_land(next) {
                return Ok(next);
            }
        }
        debug!(
            latitude = from.latitude,
            longitude = from.longitude,
            "land on every heading, particle holds"
        );
        Ok(from)
    }

    fn summarize(&self, cloud: &[Position], timestamp: Timestamp) -> EnsembleStep {
        let center = geo::centroid(cloud).unwrap_or(cloud[0]);
        let mut distances: Vec<f64> =
            cloud.iter().map(|p| geo::distance_km(center, *p)).collect();
        distances.sort_by(f64::total_cmp);

        let rings = self
            .settings
            .confidence_levels
            .iter()
            .map(|&level| ConfidenceRing {
                level,
                radius_km: quantile(&distances, level),
            })
            .collect();

        EnsembleStep {
            timestamp,
            latitude: center.latitude,
            longitude: center.longitude,
            rings,
        }
    }
}

/// The sorted-distance entry at `level` of the way through.
fn quantile(sorted: &[f64], level: f64) -> f64 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let idx = (sorted.len() as f64 * level) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    use crate::land::BoundingBox;
    use crate::model::{Fix, SourceEvent, VesselStatus};

    fn at(hours: i64) -> Timestamp {
        Timestamp::from_second(1_700_000_000 + hours * 3600).unwrap()
    }

    fn northbound() -> VesselState {
        // 0.09 degrees of latitude in an hour: about 10 km/h due north.
        VesselState::from_fixes([
            Fix::new("Jin1", 20.0, 115.0, at(0), SourceEvent::Departure).unwrap(),
            Fix::new("Jin1", 20.09, 115.0, at(1), SourceEvent::Sighting).unwrap(),
        ])
        .unwrap()
        .unwrap()
    }

    fn vessel(fixes: &[(i64, f64, f64, SourceEvent)]) -> VesselState {
        VesselState::from_fixes(
            fixes
                .iter()
                .map(|&(h, lat, lon, ev)| Fix::new("Jin1", lat, lon, at(h), ev).unwrap()),
        )
        .unwrap()
        .unwrap()
    }

    fn settings() -> EnsembleConfig {
        EnsembleConfig {
            particles: 200,
            ..EnsembleConfig::default()
        }
    }

    fn ensemble_with(settings: EnsembleConfig) -> Ensemble {
        let config = Config {
            ensemble: settings,
            ..Config::default()
        };
        Ensemble::new(&config).unwrap()
    }

    fn ensemble() -> Ensemble {
        ensemble_with(settings())
    }

    #[test]
    fn rings_grow_and_nest() {
        let forecast = ensemble().run(&northbound(), 24.0, 6.0).unwrap();
        assert_eq!(forecast.particles, 200);
        assert_eq!(forecast.steps.len(), 5);

        let first = &forecast.steps[0];
        assert_eq!(first.timestamp, at(1));
        assert_eq!(first.rings.len(), 2);
        assert_abs_diff_eq!(first.rings[0].radius_km, 0.0, epsilon = 1e-6);

        let last = forecast.steps.last().unwrap();
        assert_eq!(last.timestamp, at(25));
        assert!(last.latitude > 20.09, "centroid should drift north");
        assert!(last.rings[0].radius_km > 0.0);
        assert!(last.rings[0].radius_km <= last.rings[1].radius_km);
        assert!(
            forecast.steps[4].rings[1].radius_km > forecast.steps[1].rings[1].radius_km,
            "cloud should spread over time"
        );
    }

    #[test]
    fn same_seed_same_cloud() {
        let a = ensemble().with_seed(9).run(&northbound(), 12.0, 3.0).unwrap();
        let b = ensemble().with_seed(9).run(&northbound(), 12.0, 3.0).unwrap();
        let c = ensemble().with_seed(10).run(&northbound(), 12.0, 3.0).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.steps, c.steps);
    }

    #[test]
    fn needs_an_inferable_heading() {
        let fix = Fix::new("Jin1", 20.0, 115.0, at(0), SourceEvent::Departure).unwrap();
        let single = VesselState::new(fix).unwrap();
        assert!(matches!(
            ensemble().run(&single, 12.0, 3.0),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn unknown_status_is_treated_as_at_sea() {
        let sightings = vessel(&[
            (0, 20.0, 115.0, SourceEvent::Sighting),
            (1, 20.09, 115.0, SourceEvent::Sighting),
        ]);
        assert_eq!(sightings.status(), VesselStatus::Unknown);
        let forecast = ensemble().run(&sightings, 12.0, 3.0).unwrap();
        assert_eq!(forecast.steps.len(), 5);
    }

    #[test]
    fn in_port_is_insufficient() {
        let docked = vessel(&[
            (0, 18.2, 109.5, SourceEvent::Departure),
            (5, 18.3, 109.6, SourceEvent::Arrival),
        ]);
        assert!(matches!(
            ensemble().run(&docked, 12.0, 3.0),
            Err(ForecastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn samples_around_the_whole_history() {
        // Zigzag north: the last leg heads north-west, the history due north.
        let zigzag = vessel(&[
            (0, 10.0, 140.0, SourceEvent::Departure),
            (1, 10.06, 140.06, SourceEvent::Sighting),
            (2, 10.12, 140.0, SourceEvent::Sighting),
            (3, 10.18, 140.06, SourceEvent::Sighting),
            (4, 10.24, 140.0, SourceEvent::Sighting),
        ]);
        let forecast = ensemble().run(&zigzag, 24.0, 6.0).unwrap();
        assert_eq!(forecast.course.legs, 4);
        // Observed spread of about 47 degrees beats the configured 30.
        assert!(forecast.bearing_spread_deg > 45.0, "{}", forecast.bearing_spread_deg);
        assert_eq!(forecast.bearing_spread_deg, forecast.course.bearing_std_deg);

        let last = forecast.steps.last().unwrap();
        assert!(last.latitude > 11.0, "centroid should head north, got {}", last.latitude);
        assert!(
            (last.longitude - 140.0).abs() < 0.3,
            "centroid should not follow the last leg west, got {}",
            last.longitude
        );
    }

    #[test]
    fn configured_spread_is_a_floor() {
        let forecast = ensemble().run(&northbound(), 12.0, 3.0).unwrap();
        assert_eq!(forecast.bearing_spread_deg, 30.0);
        assert_abs_diff_eq!(
            forecast.speed_spread_kmh,
            0.4 * forecast.course.mean_speed_kmh,
            epsilon = 1e-12
        );
    }

    #[test]
    fn particles_turn_away_from_land() {
        // A wide coast just north of the vessel, which is heading north.
        let coast = BoundingBox::new(10.05, 30.0, 130.0, 150.0);
        let heading_north = vessel(&[
            (0, 9.9, 140.0, SourceEvent::Departure),
            (1, 10.0, 140.0, SourceEvent::Sighting),
        ]);

        let open_sea = ensemble().run(&heading_north, 24.0, 6.0).unwrap();
        assert!(open_sea.steps.last().unwrap().latitude > 10.5);

        let avoiding = ensemble_with(EnsembleConfig {
            land_boxes: vec![coast],
            ..settings()
        })
        .run(&heading_north, 24.0, 6.0)
        .unwrap();
        for step in &avoiding.steps {
            assert!(step.latitude < 10.06, "centroid on land: {}", step.latitude);
        }
    }

    #[test]
    fn water_boxes_let_particles_through() {
        let coast = BoundingBox::new(10.05, 30.0, 130.0, 150.0);
        let strait = BoundingBox::new(10.0, 30.0, 139.0, 141.0);
        let heading_north = vessel(&[
            (0, 9.9, 140.0, SourceEvent::Departure),
            (1, 10.0, 140.0, SourceEvent::Sighting),
        ]);
        let forecast = ensemble_with(EnsembleConfig {
            land_boxes: vec![coast],
            water_boxes: vec![strait],
            ..settings()
        })
        .run(&heading_north, 12.0, 3.0)
        .unwrap();
        assert!(forecast.steps.last().unwrap().latitude > 10.1);
    }

    #[test]
    fn particles_boxed_in_by_land_hold_position() {
        let island = BoundingBox::new(5.0, 15.0, 135.0, 145.0);
        let stranded = vessel(&[
            (0, 9.9, 140.0, SourceEvent::Departure),
            (1, 10.0, 140.0, SourceEvent::Sighting),
        ]);
        let forecast = ensemble_with(EnsembleConfig {
            land_boxes: vec![island],
            ..settings()
        })
        .run(&stranded, 12.0, 3.0)
        .unwrap();
        for step in &forecast.steps {
            assert_abs_diff_eq!(step.latitude, 10.0, epsilon = 1e-9);
            assert_abs_diff_eq!(step.longitude, 140.0, epsilon = 1e-9);
            assert_abs_diff_eq!(step.rings[1].radius_km, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn rejects_bad_horizon() {
        assert!(matches!(
            ensemble().run(&northbound(), 10.0, 3.0),
            Err(ForecastError::InvalidHorizon(_))
        ));
    }

    #[test]
    fn quantile_picks_sorted_entry() {
        let d = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        assert_eq!(quantile(&d, 0.67), 7.0);
        assert_eq!(quantile(&d, 0.90), 10.0);
        assert_eq!(quantile(&d, 0.999), 10.0);
    }
}
