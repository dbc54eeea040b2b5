//! Core data model for drift.
//!
//! These types are the records that flow through the forecasting core:
//! fixes, vessel states, heading hypotheses and forecast tracks.

mod fix;
mod hypothesis;
mod track;
mod vessel;

pub use fix::{Fix, SourceEvent};
pub(crate) use fix::validate_coordinates;
pub use hypothesis::{HeadingHypothesis, HypothesisBasis};
pub(crate) use hypothesis::normalize_weights;
pub use track::{ForecastPoint, ForecastTrack, UncertaintyDisc, discs_at};
pub use vessel::{VesselId, VesselState, VesselStatus};
