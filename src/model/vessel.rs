//! Vessel types: identity, history and derived status.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

use super::{Fix, SourceEvent};

/// A tracked vessel's identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VesselId(String);

impl VesselId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VesselId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for VesselId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Where a vessel is believed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VesselStatus {
    AtSea,
    InPort,
    Unknown,
}

impl VesselStatus {
    /// The status after observing `event`. Sightings leave it unchanged.
    fn after(self, event: SourceEvent) -> Self {
        match event {
            SourceEvent::Departure => Self::AtSea,
            SourceEvent::Arrival => Self::InPort,
            SourceEvent::Sighting => self,
        }
    }
}

/// A vessel's identity and its chronological fix history.
///
/// Never empty: a state is created from its first fix, and `last_fix`
/// always equals the final entry of `history`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselState {
    vessel_id: VesselId,
    last_fix: Fix,
    history: Vec<Fix>,
    status: VesselStatus,
}

impl VesselState {
    /// Starts tracking a vessel from its first fix.
    pub fn new(first: Fix) -> Result<Self> {
        first.validate()?;
        let status = VesselStatus::Unknown.after(first.source_event);
        Ok(Self {
            vessel_id: first.vessel_id.clone(),
            last_fix: first.clone(),
            history: vec![first],
            status,
        })
    }

    /// Builds a state from a batch of fixes for one vessel, in order.
    ///
    /// Returns `Ok(None)` for an empty batch.
    pub fn from_fixes(fixes: impl IntoIterator<Item = Fix>) -> Result<Option<Self>> {
        let mut fixes = fixes.into_iter();
        let Some(first) = fixes.next() else {
            return Ok(None);
        };
        let mut state = Self::new(first)?;
        for fix in fixes {
            state.record(fix)?;
        }
        Ok(Some(state))
    }

    /// Appends a fix to the history and updates the derived status.
    ///
    /// Fixes must belong to this vessel and must not precede the last fix.
    /// Equal timestamps are accepted here; the heading estimator rejects them.
    pub fn record(&mut self, fix: Fix) -> Result<()> {
        fix.validate()?;
        if fix.vessel_id != self.vessel_id {
            return Err(ForecastError::VesselMismatch {
                expected: self.vessel_id.clone(),
                found: fix.vessel_id,
            });
        }
        if fix.timestamp < self.last_fix.timestamp {
            return Err(ForecastError::OutOfOrderFix {
                vessel: self.vessel_id.clone(),
                timestamp: fix.timestamp,
                last: self.last_fix.timestamp,
            });
        }
        self.status = self.status.after(fix.source_event);
        self.last_fix = fix.clone();
        self.history.push(fix);
        Ok(())
    }

    pub fn vessel_id(&self) -> &VesselId {
        &self.vessel_id
    }

    pub fn last_fix(&self) -> &Fix {
        &self.last_fix
    }

    pub fn history(&self) -> &[Fix] {
        &self.history
    }

    pub fn status(&self) -> VesselStatus {
        self.status
    }

    pub fn at_sea(&self) -> bool {
        self.status == VesselStatus::AtSea
    }

    pub fn in_port(&self) -> bool {
        self.status == VesselStatus::InPort
    }

    /// The two most recent fixes, oldest first, when at least two exist.
    pub fn last_two(&self) -> Option<(&Fix, &Fix)> {
        match self.history.as_slice() {
            [.., prev, last] => Some((prev, last)),
            _ => None,
        }
    }
}
