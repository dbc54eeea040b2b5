//! CLI interface for drift.
//!
//! Every subcommand reads position reports from a CSV file, builds the fleet,
//! and writes structured output: JSON to `--out` (if given) or stdout, with a
//! human-readable summary on stderr when writing to a file.
//!
//! - `drift forecast`: forecast tracks for one vessel or the whole fleet.
//! - `drift fleet`: status report: who is at sea, who is in port.
//! - `drift ensemble`: Monte Carlo confidence rings for one vessel.

mod format;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

use drift::config::Config;
use drift::ensemble::Ensemble;
use drift::engine::ForecastEngine;
use drift::fleet::Fleet;
use drift::ingest;
use drift::model::{ForecastTrack, HeadingHypothesis, VesselId};

use format::{format_fleet, format_forecast_summary};

/// drift: forecast where tracked vessels may be now.
#[derive(Debug, Parser)]
#[command(name = "drift", after_long_help = USAGE_HELP)]
pub struct Cli {
    /// Config file. Defaults to `~/.drift/config.toml` when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity: `-v` info, `-vv` debug.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

const USAGE_HELP: &str = r#"Input CSV columns:
  vessel_id (or sub_id, id, submarine_id), timestamp (or time),
  latitude (or lat), longitude (or lon), event (or event_type; optional)

Examples:
  drift fleet --input reports.csv
  drift forecast --input reports.csv --vessel Jin1 --horizon 48 --step 3
  drift forecast --input reports.csv --vessel Jin3 --hypothesis 45:12:0.6 --hypothesis 200:8:0.4
  drift ensemble --input reports.csv --vessel Jin1 --out rings.json"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast tracks for one vessel, or every vessel when `--vessel` is omitted.
    ///
    /// One track when heading can be inferred from the last two fixes,
    /// otherwise one per `--hypothesis` (or per configured default bearing).
    /// Vessels in port get no tracks.
    Forecast {
        #[command(flatten)]
        input: InputArgs,

        /// Forecast only this vessel. Output is then a JSON array of tracks
        /// instead of an object keyed by vessel id.
        #[arg(long)]
        vessel: Option<String>,

        /// Heading hypothesis `BEARING:SPEED[:WEIGHT]`, used when heading
        /// cannot be inferred. Can be specified multiple times.
        #[arg(long = "hypothesis", value_parser = parse_hypothesis)]
        hypotheses: Vec<HeadingHypothesis>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Summarize the fleet: counts by status and each vessel's last fix.
    Fleet {
        #[command(flatten)]
        input: InputArgs,

        /// Print the status report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Simulate a particle cloud around the inferred course of one vessel.
    ///
    /// Reports the cloud centroid and confidence radii at each step.
    Ensemble {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long)]
        vessel: String,

        /// Number of particles (overrides config).
        #[arg(long)]
        particles: Option<usize>,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Debug, clap::Args)]
pub struct InputArgs {
    /// CSV file of position reports.
    #[arg(long)]
    input: PathBuf,
}

/// Horizon, step, seed and output overrides shared by forecasting commands.
#[derive(Debug, clap::Args)]
pub struct RunArgs {
    /// Forecast horizon in hours (overrides config).
    #[arg(long)]
    horizon: Option<f64>,

    /// Step between forecast points in hours (overrides config).
    #[arg(long)]
    step: Option<f64>,

    /// Random seed (overrides config).
    #[arg(long)]
    seed: Option<u64>,

    /// Write the JSON output to this file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl RunArgs {
    /// The config with this run's overrides applied.
    fn apply(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(h) = self.horizon {
            config.horizon_h = h;
        }
        if let Some(s) = self.step {
            config.step_h = s;
        }
        if let Some(seed) = self.seed {
            config.random_seed = seed;
        }
        config
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: &Config) -> Result<(), String> {
    match cli.command {
        Command::Forecast {
            input,
            vessel,
            hypotheses,
            run,
        } => cmd_forecast(config, &input.input, vessel.as_deref(), &hypotheses, &run),
        Command::Fleet { input, json } => cmd_fleet(config, &input.input, json),
        Command::Ensemble {
            input,
            vessel,
            particles,
            run,
        } => cmd_ensemble(config, &input.input, &vessel, particles, &run),
    }
}

fn cmd_forecast(
    config: &Config,
    input: &Path,
    vessel: Option<&str>,
    hypotheses: &[HeadingHypothesis],
    run: &RunArgs,
) -> Result<(), String> {
    let config = run.apply(config);
    let engine = ForecastEngine::new(&config).map_err(|e| format!("invalid settings: {e}"))?;
    let fleet = load_fleet(&config, input)?;
    let supplied = (!hypotheses.is_empty()).then_some(hypotheses);

    if let Some(id) = vessel {
        let state = fleet
            .get(&VesselId::from(id))
            .ok_or_else(|| format!("no fixes for vessel '{id}' in {}", input.display()))?;
        let tracks = engine
            .forecast_with_defaults(state, supplied)
            .map_err(|e| format!("forecast failed: {e}"))?;
        let summary = format_forecast_summary(state.vessel_id(), &tracks);
        return emit(&tracks, run.out.as_deref(), &summary);
    }

    let results: BTreeMap<VesselId, drift::Result<Vec<ForecastTrack>>> = match supplied {
        None => engine.forecast_fleet(&fleet),
        Some(list) => fleet
            .vessels()
            .map(|s| {
                (
                    s.vessel_id().clone(),
                    engine.forecast_with_defaults(s, Some(list)),
                )
            })
            .collect(),
    };

    let mut forecasts: BTreeMap<VesselId, Vec<ForecastTrack>> = BTreeMap::new();
    for (id, result) in results {
        match result {
            Ok(tracks) => {
                forecasts.insert(id, tracks);
            }
            Err(e) => {
                warn!(vessel = %id, error = %e, "forecast failed");
                eprintln!("Skipped {id}: {e}");
            }
        }
    }

    let track_count: usize = forecasts.values().map(Vec::len).sum();
    let summary = format!("{track_count} track(s) for {} vessel(s)", forecasts.len());
    emit(&forecasts, run.out.as_deref(), &summary)
}

fn cmd_fleet(config: &Config, input: &Path, json: bool) -> Result<(), String> {
    let fleet = load_fleet(config, input)?;
    if json {
        return emit(&fleet.status_report(), None, "");
    }
    print!("{}", format_fleet(&fleet));
    Ok(())
}

fn cmd_ensemble(
    config: &Config,
    input: &Path,
    vessel: &str,
    particles: Option<usize>,
    run: &RunArgs,
) -> Result<(), String> {
    let mut config = run.apply(config);
    if let Some(n) = particles {
        config.ensemble.particles = n;
    }
    let ensemble = Ensemble::new(&config).map_err(|e| format!("invalid settings: {e}"))?;
    let fleet = load_fleet(&config, input)?;

    let state = fleet
        .get(&VesselId::from(vessel))
        .ok_or_else(|| format!("no fixes for vessel '{vessel}' in {}", input.display()))?;
    let forecast = ensemble
        .run(state, config.horizon_h, config.step_h)
        .map_err(|e| format!("ensemble failed: {e}"))?;

    let summary = format!(
        "{} particles, {} steps for {vessel}",
        forecast.particles,
        forecast.steps.len()
    );
    emit(&forecast, run.out.as_deref(), &summary)
}

/// Load fixes, keep tracked vessels, and build the fleet.
///
/// Rejected fixes are reported on stderr; they do not fail the command.
fn load_fleet(config: &Config, input: &Path) -> Result<Fleet, String> {
    let fixes = ingest::load_csv(input).map_err(|e| format!("failed to read fixes: {e}"))?;
    let fixes = ingest::filter_tracked(fixes, &config.tracked_vessels);

    let mut fleet = Fleet::new();
    let rejected = fleet.ingest(fixes);
    for r in &rejected {
        eprintln!("Rejected fix for {} at {}: {}", r.fix.vessel_id, r.fix.timestamp, r.error);
    }
    if fleet.is_empty() {
        return Err(format!("no usable fixes in {}", input.display()));
    }
    Ok(fleet)
}

/// Write `value` as pretty JSON to `out`, or stdout.
fn emit<T: Serialize>(value: &T, out: Option<&Path>, summary: &str) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("failed to serialize output: {e}"))?;

    match out {
        Some(path) => {
            fs::write(path, &json)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Wrote {summary} → {}", path.display());
        }
        None => {
            println!("{json}");
        }
    }

    Ok(())
}

/// Parse `BEARING:SPEED[:WEIGHT]`, weight defaulting to 1.
fn parse_hypothesis(s: &str) -> Result<HeadingHypothesis, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let number = |field: &str, v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|_| format!("{field} '{v}' is not a number"))
    };
    match parts.as_slice() {
        [bearing, speed] => Ok(HeadingHypothesis::new(
            number("bearing", bearing)?,
            number("speed", speed)?,
            1.0,
        )),
        [bearing, speed, weight] => Ok(HeadingHypothesis::new(
            number("bearing", bearing)?,
            number("speed", speed)?,
            number("weight", weight)?,
        )),
        _ => Err(format!("expected BEARING:SPEED[:WEIGHT], got '{s}'")),
    }
}
