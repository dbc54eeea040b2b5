//! Uncertainty growth: how far the vessel may have strayed from the track.
//!
//! The radius starts at the base uncertainty (report imprecision) and grows
//! linearly at the drift rate. When an operational-range cap is configured,
//! growth stays linear until the radius reaches the cap and holds there.

use crate::config::Config;
use crate::error::{ForecastError, Result};

/// Maps elapsed forecast time to an uncertainty radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UncertaintyModel {
    base_km: f64,
    drift_rate_km_per_h: f64,
    cap_km: Option<f64>,
}

impl UncertaintyModel {
    /// Values are expected to have passed [`Config::validate`].
    pub fn new(base_km: f64, drift_rate_km_per_h: f64, cap_km: Option<f64>) -> Self {
        Self {
            base_km,
            drift_rate_km_per_h,
            cap_km,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.base_uncertainty_km,
            config.drift_rate_km_per_h,
            config.uncertainty_cap_km,
        )
    }

    pub fn base_km(&self) -> f64 {
        self.base_km
    }

    pub fn cap_km(&self) -> Option<f64> {
        self.cap_km
    }

    /// Radius after `elapsed_h` hours since forecast start.
    ///
    /// Non-decreasing in `elapsed_h`; `radius_km(0.0)` is exactly the base.
    pub fn radius_km(&self, elapsed_h: f64) -> Result<f64> {
        if !(elapsed_h.is_finite() && elapsed_h >= 0.0) {
            return Err(ForecastError::InvalidHorizon(format!(
                "elapsed time {elapsed_h} h is not a non-negative number"
            )));
        }

        let linear = self.base_km + self.drift_rate_km_per_h * elapsed_h;
        Ok(self.cap_km.map_or(linear, |cap| linear.min(cap)))
    }

    /// Elapsed time at which capped growth reaches the cap.
    pub fn saturation_h(&self) -> Option<f64> {
        self.cap_km.map(|cap| (cap - self.base_km) / self.drift_rate_km_per_h)
    }
}
