//! Calor command-line interface.
//!
//! Relax a randomly initialised n x n field to steady state across a worker
//! team:
//! ```sh
//! calor 1026 0                 # pairwise transfers, auto-sized team
//! calor 1026 1 --workers 8     # collective transfers, fixed team
//! calor 18 0 --seed 7 --json run.json
//! ```

mod report;

use anyhow::Context;
use calor_compute::{relax, ExchangeMode, SessionConfig};
use calor_core::field::Field;
use calor_core::partition::PartitionPlan;
use calor_core::types::RelaxParams;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "calor")]
#[command(about = "Distributed Jacobi relaxation of a 2D scalar field")]
#[command(version)]
struct Cli {
    /// Grid dimension n (n >= 3; sizes of the form 2^k + 2 split evenly
    /// across any power-of-two worker team).
    size: usize,

    /// Communication mode: 0 = pairwise point-to-point, 1 = collective.
    mode: ExchangeMode,

    /// Worker team size; defaults to the available parallelism, clamped to
    /// the largest team the grid splits across.
    #[arg(short, long)]
    workers: Option<usize>,

    /// Convergence threshold on the normalised per-sweep residual.
    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,

    /// Hard cap on relaxation sweeps.
    #[arg(long, default_value_t = 100)]
    max_sweeps: usize,

    /// Upper bound (exclusive) for the random initial cell values.
    #[arg(long, default_value_t = 100.0)]
    max_value: f32,

    /// Seed for the random field; omitted means OS entropy.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the run summary as JSON to this path.
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let workers = match cli.workers {
        Some(requested) => requested,
        None => default_workers(cli.size),
    };
    let config = SessionConfig {
        workers,
        mode: cli.mode,
        params: RelaxParams {
            tolerance: cli.tolerance,
            max_sweeps: cli.max_sweeps,
        },
    };

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let field = Field::random(cli.size, cli.max_value, &mut rng)
        .context("allocating the initial grid")?;

    println!(
        "Grid {0}x{0}, {1} workers, {2} transfers",
        cli.size, workers, cli.mode
    );
    let outcome = relax(field, &config).context("relaxation session failed")?;

    report::print_summary(&outcome);
    if let Some(path) = &cli.json {
        report::write_json(&outcome, &config, cli.size, path)?;
    }
    Ok(())
}

/// The largest worker team not exceeding the available parallelism that the
/// grid splits across cleanly.
fn default_workers(n: usize) -> usize {
    let available = std::thread::available_parallelism()
        .map(|parallelism| parallelism.get())
        .unwrap_or(1);
    (1..=available)
        .rev()
        .find(|&workers| PartitionPlan::new(workers, n).is_ok())
        .unwrap_or(1)
}
