//! Errors raised by the forecasting core.

use crate::model::VesselId;

/// Errors that can occur while recording fixes or producing a forecast.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    /// Heading cannot be inferred from the history.
    /// Recoverable: the engine falls back to hypothesis fan-out.
    #[error("insufficient data for vessel {vessel}: {reason}")]
    InsufficientData { vessel: VesselId, reason: String },

    /// Step/horizon mismatch or non-positive values.
    #[error("invalid horizon: {0}")]
    InvalidHorizon(String),

    /// NaN or out-of-range coordinates.
    #[error("fix out of range: latitude {latitude}, longitude {longitude}")]
    OutOfRangeFix { latitude: f64, longitude: f64 },

    /// A heading hypothesis outside its domain.
    #[error("invalid hypothesis: {0}")]
    InvalidHypothesis(String),

    /// A fix earlier than the last recorded one.
    #[error("fix for vessel {vessel} at {timestamp} precedes last fix at {last}")]
    OutOfOrderFix {
        vessel: VesselId,
        timestamp: jiff::Timestamp,
        last: jiff::Timestamp,
    },

    /// A fix recorded against another vessel's state.
    #[error("fix for vessel {found} cannot be recorded on vessel {expected}")]
    VesselMismatch { expected: VesselId, found: VesselId },

    #[error("timestamp arithmetic failed: {0}")]
    Timestamp(String),
}

pub type Result<T> = core::result::Result<T, ForecastError>;
