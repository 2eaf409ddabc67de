//! Merge vs read-modify-write benchmark binary

use anyhow::Result;
use clap::Parser;
use lsm_bench::common::{init_tracing, Config};
use lsm_bench::merge_bench::StrategyReport;
use lsm_bench::MergeBench;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "lsm-merge-bench")]
#[command(about = "Compare RocksDB merge operator and read-modify-write under mixed workloads")]
#[command(version)]
struct Args {
    /// Directory holding the per-strategy stores
    #[arg(long = "db_root")]
    db_root: Option<PathBuf>,

    /// Number of counter keys
    #[arg(long)]
    keys: Option<u64>,

    /// Worker threads per phase
    #[arg(long)]
    threads: Option<usize>,

    /// Seconds per workload mix
    #[arg(long)]
    seconds: Option<u64>,

    /// Run only this mix (10/90, 50/50 or 90/10)
    #[arg(long)]
    mix: Option<String>,

    /// Base seed for worker RNGs
    #[arg(long)]
    seed: Option<u64>,

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
    let bench = &mut config.merge_bench;
    if let Some(db_root) = args.db_root {
        bench.db_root = db_root;
    }
    if let Some(keys) = args.keys {
        bench.key_space = keys;
    }
    if let Some(threads) = args.threads {
        bench.threads = threads;
    }
    if let Some(seconds) = args.seconds {
        bench.phase_duration = Duration::from_secs(seconds);
    }
    if let Some(mix) = args.mix {
        bench.mix = mix;
    }
    if args.seed.is_some() {
        bench.seed = args.seed;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    init_tracing(&config.log_level);

    let reports = MergeBench::new(config.merge_bench)
        .with_overrides(config.engine)
        .run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            print_report(report);
        }
    }

    Ok(())
}

fn print_report(report: &StrategyReport) {
    println!("== {} ==", report.strategy);
    println!(
        "{:>10}{:>15}{:>15}{:>20}",
        "Mix", "Reads/s", "Writes/s", "Merge Ops/Key"
    );
    for phase in &report.phases {
        println!(
            "{:>10}{:>15.0}{:>15.0}{:>20.2}",
            phase.workload.name,
            phase.metrics.read_ops_per_sec,
            phase.metrics.write_ops_per_sec,
            phase.metrics.avg_merge_ops_per_key
        );
    }
    println!(
        "Counters: expected {}, resolved {}, lost {}",
        report.expected_total, report.resolved_total, report.lost_updates
    );
}
