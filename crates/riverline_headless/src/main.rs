//! Headless battle runner CLI.
//!
//! Runs seeded battles to completion without rendering and prints a
//! per-battle summary, optionally as JSON for CI consumption.
//!
//! ```text
//! riverline_headless --matches 10 --seed 42 --duration-secs 120
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod runner;

use runner::run_battle;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "riverline_headless", about = "Run headless Riverline battles")]
struct Args {
    /// Number of battles to run.
    #[arg(long, default_value_t = 1)]
    matches: u32,

    /// Base RNG seed; battle N runs with seed + N.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Match duration in seconds.
    #[arg(long, default_value_t = 180)]
    duration_secs: u64,

    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,

    /// Emit one JSON summary per line instead of human-readable text.
    #[arg(long)]
    json: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut failures = 0u32;

    for n in 0..args.matches {
        let seed = args.seed + u64::from(n);
        match run_battle(seed, args.duration_secs * 1000, args.tick_ms) {
            Ok(summary) => {
                if args.json {
                    match serde_json::to_string(&summary) {
                        Ok(line) => println!("{line}"),
                        Err(e) => eprintln!("failed to serialize summary: {e}"),
                    }
                } else {
                    println!(
                        "seed {:>4}  {:?}  {} ticks, {} player / {} opponent deployments",
                        summary.seed,
                        summary.outcome,
                        summary.ticks,
                        summary.player_deployments,
                        summary.opponent_deployments,
                    );
                }
            }
            Err(e) => {
                eprintln!("battle with seed {seed} failed: {e}");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
}
