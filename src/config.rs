//! drift configuration.
//!
//! Loaded from `--config <path>` or `~/.drift/config.toml`. Every option
//! has a default, so a missing default file simply means defaults.
//! Values are validated here so a bad option fails before any forecast runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::step_count;
use crate::land::BoundingBox;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// An inclusive plausible speed band, in km/h.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: f64,
    pub max: f64,
}

impl SpeedRange {
    /// Clamps `speed` into the band.
    pub fn clamp(&self, speed: f64) -> f64 {
        speed.clamp(self.min, self.max)
    }
}

/// Monte Carlo ensemble settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EnsembleConfig {
    /// Number of simulated particles.
    pub particles: usize,
    /// Minimum half-width of the uniform bearing spread per step. A wider
    /// observed spread in the vessel's history takes over.
    pub bearing_spread_deg: f64,
    /// Minimum half-width of the uniform speed spread, as a fraction of the
    /// mean speed. A wider observed spread takes over.
    pub speed_spread: f64,
    /// Confidence levels reported as rings, each in `(0, 1)`.
    pub confidence_levels: Vec<f64>,
    /// Regions particles steer around. Empty by default.
    pub land_boxes: Vec<BoundingBox>,
    /// Water inside land boxes, such as gulfs and straits.
    pub water_boxes: Vec<BoundingBox>,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            particles: 500,
            bearing_spread_deg: 30.0,
            speed_spread: 0.4,
            confidence_levels: vec![0.67, 0.90],
            land_boxes: Vec::new(),
            water_boxes: Vec::new(),
        }
    }
}

/// drift configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Uncertainty radius at forecast start: report imprecision.
    pub base_uncertainty_km: f64,
    /// Linear growth of the uncertainty radius.
    pub drift_rate_km_per_h: f64,
    /// Operational-range ceiling for the uncertainty radius, off by default.
    /// Growth is linear until the radius reaches the cap, then holds.
    pub uncertainty_cap_km: Option<f64>,
    /// Speed assigned to fan-out hypotheses.
    pub default_speed_kmh: f64,
    /// Bearings fanned out over when heading is unknown.
    pub default_hypothesis_bearings: Vec<f64>,
    /// Per-step bearing jitter half-width. Zero disables perturbation.
    pub perturbation_magnitude_deg: f64,
    pub random_seed: u64,
    pub step_h: f64,
    pub horizon_h: f64,
    /// Inferred speeds are clamped into this band.
    pub speed_clamp_range: SpeedRange,
    /// Scale hypothesis weights to sum to 1.
    pub normalize_weights: bool,
    /// How far `horizon_h / step_h` may sit from a whole number.
    pub horizon_tolerance: f64,
    pub max_horizon_h: f64,
    /// Vessels kept at ingestion. Empty keeps all.
    pub tracked_vessels: Vec<String>,
    pub ensemble: EnsembleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_uncertainty_km: 5.0,
            drift_rate_km_per_h: 3.0,
            uncertainty_cap_km: None,
            default_speed_kmh: 10.0,
            default_hypothesis_bearings: evenly_spaced_bearings(8),
            perturbation_magnitude_deg: 0.0,
            random_seed: 0,
            step_h: 3.0,
            horizon_h: 48.0,
            speed_clamp_range: SpeedRange {
                min: 1.0,
                max: 20.0,
            },
            normalize_weights: false,
            horizon_tolerance: 1e-6,
            max_horizon_h: 720.0,
            tracked_vessels: Vec::new(),
            ensemble: EnsembleConfig::default(),
        }
    }
}

/// `n` compass bearings evenly spaced from north.
pub fn evenly_spaced_bearings(n: usize) -> Vec<f64> {
    (0..n).map(|i| i as f64 * 360.0 / n as f64).collect()
}

impl Config {
    /// Load config from `path`, or from `~/.drift/config.toml` when `None`.
    ///
    /// An explicit path must exist. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        let config: Self =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    /// The default config file path: `~/.drift/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".drift").join("config.toml"))
    }

    /// Checks every option against its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("base-uncertainty-km", self.base_uncertainty_km)?;
        positive("drift-rate-km-per-h", self.drift_rate_km_per_h)?;
        if let Some(cap) = self.uncertainty_cap_km
            && !(cap.is_finite() && cap > self.base_uncertainty_km)
        {
            return Err(invalid(
                "uncertainty-cap-km",
                format!("{cap} must exceed base-uncertainty-km"),
            ));
        }

        let range = self.speed_clamp_range;
        let finite = range.min.is_finite() && range.max.is_finite();
        if !(finite && range.min > 0.0 && range.min <= range.max) {
            return Err(invalid(
                "speed-clamp-range",
                format!("need 0 < min <= max, got [{}, {}]", range.min, range.max),
            ));
        }
        positive("default-speed-kmh", self.default_speed_kmh)?;
        if self.default_speed_kmh > range.max {
            return Err(invalid(
                "default-speed-kmh",
                format!(
                    "{} exceeds the speed clamp maximum {}",
                    self.default_speed_kmh, range.max
                ),
            ));
        }

        if self.default_hypothesis_bearings.is_empty() {
            return Err(invalid("default-hypothesis-bearings", "must not be empty".into()));
        }
        if let Some(b) = self
            .default_hypothesis_bearings
            .iter()
            .find(|b| !(b.is_finite() && (0.0..360.0).contains(*b)))
        {
            return Err(invalid(
                "default-hypothesis-bearings",
                format!("{b} outside [0, 360)"),
            ));
        }

        let m = self.perturbation_magnitude_deg;
        if !(m.is_finite() && (0.0..180.0).contains(&m)) {
            return Err(invalid("perturbation-magnitude-deg", format!("{m} outside [0, 180)")));
        }

        let tol = self.horizon_tolerance;
        if !(tol > 0.0 && tol < 0.5) {
            return Err(invalid("horizon-tolerance", format!("{tol} outside (0, 0.5)")));
        }
        positive("max-horizon-h", self.max_horizon_h)?;
        step_count(self.horizon_h, self.step_h, tol, self.max_horizon_h)
            .map_err(|reason| invalid("horizon-h", reason))?;

        self.validate_ensemble()
    }

    fn validate_ensemble(&self) -> Result<(), ConfigError> {
        let e = &self.ensemble;
        if e.particles == 0 {
            return Err(invalid("ensemble.particles", "must be at least 1".into()));
        }
        if !(e.bearing_spread_deg.is_finite() && (0.0..180.0).contains(&e.bearing_spread_deg)) {
            return Err(invalid(
                "ensemble.bearing-spread-deg",
                format!("{} outside [0, 180)", e.bearing_spread_deg),
            ));
        }
        if !(e.speed_spread.is_finite() && (0.0..1.0).contains(&e.speed_spread)) {
            return Err(invalid(
                "ensemble.speed-spread",
                format!("{} outside [0, 1)", e.speed_spread),
            ));
        }
        if let Some(level) = e
            .confidence_levels
            .iter()
            .find(|l| !(**l > 0.0 && **l < 1.0))
        {
            return Err(invalid(
                "ensemble.confidence-levels",
                format!("{level} outside (0, 1)"),
            ));
        }
        for (field, boxes) in [
            ("ensemble.land-boxes", &e.land_boxes),
            ("ensemble.water-boxes", &e.water_boxes),
        ] {
            for b in boxes {
                b.validate().map_err(|reason| invalid(field, reason))?;
            }
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be positive")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn invalid_field(config: &Config) -> &'static str {
        match config.validate() {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected invalid config, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
        assert_eq!(
            Config::default().default_hypothesis_bearings,
            vec![0.0, 45.0, 90.0, 135.0, 180.0, 225.0, 270.0, 315.0]
        );
    }

    #[test]
    fn rejects_out_of_range_options() {
        let cases: Vec<(fn(&mut Config), &str)> = vec![
            (|c| c.base_uncertainty_km = 0.0, "base-uncertainty-km"),
            (|c| c.drift_rate_km_per_h = f64::NAN, "drift-rate-km-per-h"),
            (|c| c.uncertainty_cap_km = Some(2.0), "uncertainty-cap-km"),
            (|c| c.speed_clamp_range.min = 30.0, "speed-clamp-range"),
            (|c| c.default_speed_kmh = 25.0, "default-speed-kmh"),
            (|c| c.default_hypothesis_bearings.clear(), "default-hypothesis-bearings"),
            (|c| c.default_hypothesis_bearings.push(360.0), "default-hypothesis-bearings"),
            (|c| c.perturbation_magnitude_deg = -1.0, "perturbation-magnitude-deg"),
            (|c| c.step_h = 5.0, "horizon-h"),
            (|c| c.horizon_h = 1000.0, "horizon-h"),
            (|c| c.horizon_tolerance = 0.0, "horizon-tolerance"),
            (|c| c.ensemble.particles = 0, "ensemble.particles"),
            (|c| c.ensemble.confidence_levels = vec![1.0], "ensemble.confidence-levels"),
            (
                |c| c.ensemble.land_boxes = vec![BoundingBox::new(25.5, 22.0, 120.0, 122.0)],
                "ensemble.land-boxes",
            ),
            (
                |c| c.ensemble.water_boxes = vec![BoundingBox::new(18.0, 21.0, 109.0, 200.0)],
                "ensemble.water-boxes",
            ),
        ];
        for (mutate, field) in cases {
            let mut config = Config::default();
            mutate(&mut config);
            assert_eq!(invalid_field(&config), field);
        }
    }

    #[test]
    fn capped_growth_is_valid() {
        let config = Config {
            uncertainty_cap_km: Some(250.0),
            ..Config::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn loads_partial_file_over_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "drift-rate-km-per-h = 4.5\n\
             random-seed = 42\n\
             default-hypothesis-bearings = [0.0, 90.0, 180.0, 270.0]\n\
             \n\
             [speed-clamp-range]\n\
             min = 2.0\n\
             max = 30.0\n\
             \n\
             [ensemble]\n\
             particles = 50\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.drift_rate_km_per_h, 4.5);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.default_hypothesis_bearings.len(), 4);
        assert_eq!(config.speed_clamp_range.max, 30.0);
        assert_eq!(config.ensemble.particles, 50);
        assert_eq!(config.ensemble.confidence_levels, vec![0.67, 0.90]);
        assert_eq!(config.base_uncertainty_km, 5.0);
    }

    #[test]
    fn loads_land_boxes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[[ensemble.land-boxes]]\n\
             min-lat = 22.0\n\
             max-lat = 25.5\n\
             min-lon = 120.0\n\
             max-lon = 122.0\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(
            config.ensemble.land_boxes,
            vec![BoundingBox::new(22.0, 25.5, 120.0, 122.0)]
        );
        assert!(config.ensemble.water_boxes.is_empty());
        assert_eq!(config.ensemble.particles, 500);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn invalid_values_fail_at_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "step-h = 7.0\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "horizon-h", .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "step-h = \"six\"\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
