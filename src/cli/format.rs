//! Output formatting for CLI display.

use std::fmt::Write;

use drift::fleet::Fleet;
use drift::heading::HeadingEstimate;
use drift::model::{ForecastTrack, HypothesisBasis, VesselId, VesselState, VesselStatus};

fn format_status(status: VesselStatus) -> &'static str {
    match status {
        VesselStatus::AtSea => "at sea",
        VesselStatus::InPort => "in port",
        VesselStatus::Unknown => "unknown",
    }
}

fn format_basis(basis: HypothesisBasis) -> &'static str {
    match basis {
        HypothesisBasis::Inferred => "inferred heading",
        HypothesisBasis::Supplied => "supplied hypotheses",
        HypothesisBasis::FanOut => "default fan-out",
    }
}

/// One line per vessel under a header of status counts.
pub(super) fn format_fleet(fleet: &Fleet) -> String {
    let report = fleet.status_report();
    let mut out = format!(
        "{} vessel(s): {} at sea, {} in port, {} unknown\n",
        report.total, report.at_sea, report.in_port, report.unknown
    );

    let width = fleet
        .vessels()
        .map(|v| v.vessel_id().as_str().len())
        .max()
        .unwrap_or(0);
    for vessel in fleet.vessels() {
        let _ = writeln!(out, "{}", format_vessel(vessel, width));
    }
    out
}

fn format_vessel(vessel: &VesselState, width: usize) -> String {
    let last = vessel.last_fix();
    format!(
        "{:<width$}  {:<7}  {}  {:.4}, {:.4}  ({} fix{})",
        vessel.vessel_id().as_str(),
        format_status(vessel.status()),
        last.timestamp,
        last.latitude,
        last.longitude,
        vessel.history().len(),
        if vessel.history().len() == 1 { "" } else { "es" },
    )
}

/// Short description of a single-vessel forecast for stderr.
pub(super) fn format_forecast_summary(vessel: &VesselId, tracks: &[ForecastTrack]) -> String {
    let Some(first) = tracks.first() else {
        return format!("no tracks for {vessel} (in port)");
    };
    let until = first
        .end()
        .map_or_else(String::new, |p| format!(" until {}", p.timestamp));
    let clamped = first
        .estimate
        .filter(HeadingEstimate::clamped)
        .map_or_else(String::new, |e| {
            format!(" (speed clamped from {:.1} km/h)", e.raw_speed_kmh)
        });
    format!(
        "{} track(s) for {vessel} from {}{until}{clamped}",
        tracks.len(),
        format_basis(first.basis)
    )
}
