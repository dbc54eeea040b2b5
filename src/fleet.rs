//! Fleet: every tracked vessel's state, keyed by id.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ForecastError, Result};
use crate::model::{Fix, VesselId, VesselState, VesselStatus};

/// A fix the fleet refused, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedFix {
    pub fix: Fix,
    pub error: ForecastError,
}

/// Summary counts across the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub total: usize,
    pub at_sea: usize,
    pub in_port: usize,
    pub unknown: usize,
    pub vessel_ids: Vec<VesselId>,
}

/// The set of tracked vessels.
///
/// Iteration order is by vessel id, so reports and fleet forecasts are stable.
#[derive(Debug, Clone, Default)]
pub struct Fleet {
    vessels: BTreeMap<VesselId, VesselState>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one fix, starting a new vessel state on first sight.
    pub fn record(&mut self, fix: Fix) -> Result<()> {
        if let Some(state) = self.vessels.get_mut(&fix.vessel_id) {
            return state.record(fix);
        }
        info!(vessel = %fix.vessel_id, "tracking new vessel");
        let id = fix.vessel_id.clone();
        self.vessels.insert(id, VesselState::new(fix)?);
        Ok(())
    }

    /// Records a batch of fixes in order.
    ///
    /// Fixes that cannot be recorded are returned, never dropped silently.
    pub fn ingest(&mut self, fixes: impl IntoIterator<Item = Fix>) -> Vec<RejectedFix> {
        let mut rejected = Vec::new();
        for fix in fixes {
            if let Err(error) = self.record(fix.clone()) {
                warn!(vessel = %fix.vessel_id, %error, "fix rejected");
                rejected.push(RejectedFix { fix, error });
            }
        }
        rejected
    }

    pub fn get(&self, id: &VesselId) -> Option<&VesselState> {
        self.vessels.get(id)
    }

    pub fn vessels(&self) -> impl Iterator<Item = &VesselState> {
        self.vessels.values()
    }

    pub fn len(&self) -> usize {
        self.vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }

    pub fn at_sea(&self) -> Vec<&VesselState> {
        self.with_status(VesselStatus::AtSea)
    }

    pub fn in_port(&self) -> Vec<&VesselState> {
        self.with_status(VesselStatus::InPort)
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport {
            total: self.len(),
            at_sea: self.at_sea().len(),
            in_port: self.in_port().len(),
            unknown: self.with_status(VesselStatus::Unknown).len(),
            vessel_ids: self.vessels.keys().cloned().collect(),
        }
    }

    fn with_status(&self, status: VesselStatus) -> Vec<&VesselState> {
        self.vessels().filter(|v| v.status() == status).collect()
    }
}
