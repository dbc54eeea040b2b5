mod cli;

use std::env;
use std::process;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use drift::Config;

fn main() {
    let cli = cli::Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(cli, &config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// `DRIFT_LOG` sets the floor; each `-v` raises it one level.
fn log_level(verbose: u8) -> Level {
    let base = env::var("DRIFT_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::WARN);
    let from_flag = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // Level orders more verbose as greater.
    base.max(from_flag)
}
