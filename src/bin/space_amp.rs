//! Space amplification experiment binary

use anyhow::Result;
use clap::Parser;
use lsm_bench::common::{format_bytes, init_tracing, Config};
use lsm_bench::space_amp::{parse_block_sizes, SpaceAmpExperiment, SpaceAmpResult};
use lsm_bench::Dataset;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lsm-space-amp")]
#[command(about = "Measure RocksDB space amplification across table block sizes")]
#[command(version)]
struct Args {
    /// Comma-separated block sizes in bytes (default 4096,...,65536)
    #[arg(long = "block_sizes", allow_hyphen_values = true)]
    block_sizes: Option<String>,

    /// Directory holding one store per block size
    #[arg(long = "db_root")]
    db_root: Option<PathBuf>,

    /// Keep the stores after the run
    #[arg(long = "keep_dbs")]
    keep_dbs: bool,

    /// Random reads per block size (0 skips the read probe)
    #[arg(long = "read_ops")]
    read_ops: Option<u64>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long = "log_level")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load config from file, then override with CLI arguments
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(csv) = &args.block_sizes {
        config.space_amp.block_sizes = parse_block_sizes(csv)?;
    }
    if let Some(db_root) = args.db_root {
        config.space_amp.db_root = db_root;
    }
    if args.keep_dbs {
        config.space_amp.keep_dbs = true;
    }
    if let Some(read_ops) = args.read_ops {
        config.space_amp.read_ops = read_ops;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    init_tracing(&config.log_level);

    let dataset = Dataset::full();
    let experiment =
        SpaceAmpExperiment::new(config.space_amp, dataset).with_overrides(config.engine);
    let results = experiment.run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_table(&dataset, &results);
    }

    Ok(())
}

fn print_table(dataset: &Dataset, results: &[SpaceAmpResult]) {
    println!(
        "Raw payload bytes: {} ({} entries)",
        dataset.raw_payload_bytes(),
        dataset.entry_count()
    );
    println!(
        "{:<12}{:>16}{:>12}{:>18}{:>14}{:>12}",
        "Block Size", "Total SST", "Amplif.", "Est. Keys", "Table Mem", "Reads/s"
    );
    for r in results {
        println!(
            "{:<12}{:>16}{:>12.2}{:>18}{:>14}{:>12.0}",
            format_bytes(r.block_size as u64),
            format_bytes(r.total_sst_bytes),
            r.amplification,
            r.estimated_keys,
            format_bytes(r.table_readers_mem),
            r.read_ops_per_sec
        );
    }
}
