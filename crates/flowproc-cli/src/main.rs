//! Command-line runner: reads a packet-trace dataset, replays it through
//! the dispatch engine, and prints an end-of-run report.
//!
//! ```bash
//! flowproc dataset.txt
//! flowproc dataset.txt --seed 7 --pool-size 10000
//! ```

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use flowproc_core::{Engine, EngineConfig, PoolSizes};
use flowproc_common::SystemClock;

mod dataset;
mod error;
mod report;
mod workload;

use dataset::Dataset;
use error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "flowproc")]
#[command(author = "flowproc")]
#[command(version = "0.1.0")]
#[command(about = "Flow-classification packet dispatcher", long_about = None)]
struct Cli {
    /// Path to the packet-trace dataset
    #[arg(default_value = "dataset.txt")]
    dataset: PathBuf,

    /// Override the priority queue's drop-decision RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the flow arena's total capacity (large-flow pool only)
    #[arg(long)]
    pool_size: Option<usize>,

    /// Override the priority queue's ring-buffer capacity
    #[arg(long)]
    queue_capacity: Option<usize>,
}

fn run(cli: Cli) -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let mut config = EngineConfig::default();
    if let Some(seed) = cli.seed {
        config.rng_seed = seed;
    }
    if let Some(pool_size) = cli.pool_size {
        config.pools = PoolSizes {
            large: pool_size,
            bursty: 0,
            micro: 0,
        };
    }
    if let Some(queue_capacity) = cli.queue_capacity {
        config.queue_capacity = queue_capacity;
    }

    let dataset = Dataset::load(&cli.dataset)?;
    tracing::info!(
        packets = dataset.packets.len(),
        known = dataset.known_keys.len(),
        ip_range = dataset.ip_range,
        "dataset loaded"
    );

    let mut engine = Engine::try_new(config, SystemClock, workload::BusyWork)?;
    for key in &dataset.known_keys {
        engine.prepopulate_known(*key);
    }

    let start = Instant::now();
    for key in &dataset.packets {
        engine.process_packet(*key);
    }
    let elapsed = start.elapsed();

    let stats = flowproc_core::EngineStats::collect(&mut engine);
    println!("{}", report::render(&stats, elapsed, dataset.ip_range));

    Ok(())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help / --version: clap wants these on stdout with exit 0,
        // which isn't the CLI-misuse case below.
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            eprintln!("Error: {}", CliError::InvalidArgument(err.to_string()));
            std::process::exit(1);
        }
    };
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
