//! CSV ingestion of position reports.
//!
//! Accepts the column names seen in the wild (`sub_id`, `lat`, `time`, ...)
//! alongside the canonical ones. Extra columns are ignored. Fixes come out
//! sorted by vessel, then time, ready to feed a [`Fleet`](crate::fleet::Fleet).

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ForecastError;
use crate::model::{Fix, SourceEvent};

/// Errors raised while reading fixes from CSV.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("row {row}: unknown event {event:?}")]
    UnknownEvent { row: usize, event: String },

    #[error("row {row}: unparseable timestamp {value:?}")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: {source}")]
    Fix {
        row: usize,
        #[source]
        source: ForecastError,
    },
}

/// One CSV row before validation.
#[derive(Debug, Deserialize)]
struct FixRecord {
    #[serde(alias = "sub_id", alias = "id", alias = "submarine_id")]
    vessel_id: String,
    #[serde(alias = "time")]
    timestamp: String,
    #[serde(alias = "lat")]
    latitude: f64,
    #[serde(alias = "lon")]
    longitude: f64,
    #[serde(default, alias = "event_type")]
    event: Option<String>,
}

impl FixRecord {
    fn into_fix(self, row: usize) -> Result<Fix, IngestError> {
        let source_event = match self.event.as_deref().map(str::trim) {
            None | Some("") => SourceEvent::Sighting,
            Some(name) => SourceEvent::parse(name).ok_or_else(|| IngestError::UnknownEvent {
                row,
                event: name.to_string(),
            })?,
        };
        let timestamp = parse_timestamp(&self.timestamp).ok_or(IngestError::Timestamp {
            row,
            value: self.timestamp,
        })?;
        Fix::new(
            self.vessel_id,
            self.latitude,
            self.longitude,
            timestamp,
            source_event,
        )
        .map_err(|source| IngestError::Fix { row, source })
    }
}

/// RFC 3339, or a civil date-time without offset taken as UTC.
fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    if let Ok(ts) = value.parse::<Timestamp>() {
        return Some(ts);
    }
    let civil: DateTime = value.parse().ok()?;
    civil.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp())
}

/// Reads fixes from CSV with a header row.
///
/// Fails on the first bad row; `row` counts data rows from 1.
pub fn read_fixes<R: Read>(reader: R) -> Result<Vec<Fix>, IngestError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut fixes = Vec::new();
    for (i, record) in csv.deserialize::<FixRecord>().enumerate() {
        fixes.push(record?.into_fix(i + 1)?);
    }

    fixes.sort_by(|a, b| {
        a.vessel_id
            .cmp(&b.vessel_id)
            .then(a.timestamp.cmp(&b.timestamp))
    });
    debug!(fixes = fixes.len(), "read fixes");
    Ok(fixes)
}

/// Reads fixes from a CSV file.
pub fn load_csv(path: &Path) -> Result<Vec<Fix>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let fixes = read_fixes(file)?;
    info!(path = %path.display(), fixes = fixes.len(), "loaded fixes");
    Ok(fixes)
}

/// Keeps fixes for the listed vessels. An empty list keeps everything.
pub fn filter_tracked(fixes: Vec<Fix>, tracked: &[String]) -> Vec<Fix> {
    if tracked.is_empty() {
        return fixes;
    }
    let before = fixes.len();
    let kept: Vec<Fix> = fixes
        .into_iter()
        .filter(|f| tracked.iter().any(|t| t == f.vessel_id.as_str()))
        .collect();
    if kept.len() < before {
        debug!(dropped = before - kept.len(), "dropped fixes for untracked vessels");
    }
    kept
}
