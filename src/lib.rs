//! drift: vessel movement forecasting.
//!
//! Given a vessel's recent position fixes, produce a cone of forecast tracks:
//! one per heading hypothesis, each point carrying an uncertainty radius that
//! grows with elapsed time.

pub mod config;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod fleet;
pub mod geo;
pub mod heading;
pub mod ingest;
pub mod land;
pub mod model;
pub mod projector;
pub mod uncertainty;

pub use config::{Config, ConfigError};
pub use engine::ForecastEngine;
pub use ensemble::{Ensemble, EnsembleForecast};
pub use error::{ForecastError, Result};
pub use fleet::{Fleet, StatusReport};
pub use ingest::IngestError;
