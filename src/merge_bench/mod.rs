//! Merge vs read-modify-write concurrency benchmark
//!
//! Each write strategy gets one fresh store, prepopulated with a zero counter
//! per key. Every selected workload mix then runs as a time-bounded phase:
//!
//! ```text
//! Setup ──► Running ──► Joined ──► Aggregated
//!           (N worker threads share the engine, no external lock)
//! ```
//!
//! After the last phase every counter is read back, which forces merge
//! resolution and shows how many read-modify-write increments were lost.

pub mod metrics;
pub mod worker;
pub mod workload;

pub use metrics::{aggregate, sum_stats, PhaseMetrics, PhaseReport, StrategyReport};
pub use worker::{run_worker, PhasePlan, WorkerStats};
pub use workload::{catalog, select_workloads, Workload, WriteStrategy};

use crate::common::{deserialize_duration, serialize_duration, Error, Result};
use crate::engine::{
    decode_counter, encode_counter, CounterMerge, Engine, EngineOptions, EngineOverrides,
    MergeStrategy, RocksEngine,
};
use crate::loader::BATCH_SIZE;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeBenchConfig {
    /// Parent directory of the per-strategy stores
    pub db_root: PathBuf,

    /// Number of counter keys, "0" through "key_space - 1"
    pub key_space: u64,

    /// Worker threads per phase
    pub threads: usize,

    /// Wall-clock length of each phase
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub phase_duration: Duration,

    /// Exact workload mix name; empty runs every mix
    pub mix: String,

    /// Base seed for worker RNGs; entropy when unset
    pub seed: Option<u64>,
}

impl Default for MergeBenchConfig {
    fn default() -> Self {
        Self {
            db_root: PathBuf::from("./merge_bench_runs"),
            key_space: 10_000,
            threads: 8,
            phase_duration: Duration::from_secs(15),
            mix: String::new(),
            seed: None,
        }
    }
}

impl MergeBenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.key_space == 0 {
            return Err(Error::InvalidConfig("key space must be positive".into()));
        }
        if self.threads == 0 {
            return Err(Error::InvalidConfig("thread count must be positive".into()));
        }
        if self.phase_duration.is_zero() {
            return Err(Error::InvalidConfig("phase duration must be positive".into()));
        }
        self.deadline_from(Instant::now())?;
        Ok(())
    }

    /// End of a phase starting at `start`.
    pub fn deadline_from(&self, start: Instant) -> Result<Instant> {
        start.checked_add(self.phase_duration).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "phase duration out of range: {}s",
                self.phase_duration.as_secs()
            ))
        })
    }
}

/// Write a zero counter under every key of the key space.
pub fn prepopulate<E: Engine>(engine: &E, key_space: u64) -> Result<()> {
    let zero = encode_counter(0);
    let mut batch: Vec<(String, &[u8])> = Vec::with_capacity(BATCH_SIZE);
    for index in 0..key_space {
        batch.push((index.to_string(), zero.as_slice()));
        if batch.len() >= BATCH_SIZE {
            engine.write_batch(&batch)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        engine.write_batch(&batch)?;
    }
    tracing::debug!(key_space, "Prepopulated counters");
    Ok(())
}

/// Read every counter back and sum them. Missing keys count as zero.
pub fn sum_counters<E: Engine>(engine: &E, key_space: u64) -> Result<u64> {
    let mut total = 0u64;
    for index in 0..key_space {
        if let Some(value) = engine.get(index.to_string().as_bytes())? {
            total += decode_counter(&value);
        }
    }
    Ok(total)
}

fn worker_rng(seed: Option<u64>, worker: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker as u64)),
        None => StdRng::from_entropy(),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Operand for one write. Merge writes need the operator the engine was
/// opened with; read-modify-write ignores it.
fn write_delta(strategy: WriteStrategy, merge: Option<&dyn MergeStrategy>) -> Result<Vec<u8>> {
    match (strategy, merge) {
        (WriteStrategy::Merge, Some(merge)) => Ok(merge.delta()),
        (WriteStrategy::Merge, None) => Err(Error::InvalidConfig(
            "merge writes need a merge strategy".into(),
        )),
        (WriteStrategy::ReadModifyWrite, _) => Ok(Vec::new()),
    }
}

/// Run one workload mix against a prepopulated engine.
///
/// The first worker error or panic ends the phase for every worker and is
/// returned in place of a report.
pub fn run_phase<E: Engine>(
    engine: &E,
    config: &MergeBenchConfig,
    strategy: WriteStrategy,
    merge: Option<&dyn MergeStrategy>,
    workload: &Workload,
) -> Result<PhaseReport> {
    config.validate()?;
    let delta = write_delta(strategy, merge)?;

    tracing::debug!(mix = %workload.name, %strategy, state = "setup", "Phase");
    let start = Instant::now();
    let plan = PhasePlan::new(
        strategy,
        workload.read_ratio,
        config.key_space,
        config.deadline_from(start)?,
        delta,
    );

    tracing::debug!(mix = %workload.name, threads = config.threads, state = "running", "Phase");
    let joined: Vec<std::thread::Result<Result<WorkerStats>>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..config.threads)
            .map(|worker| {
                let plan = &plan;
                let mut rng = worker_rng(config.seed, worker);
                scope.spawn(move || run_worker(engine, plan, &mut rng))
            })
            .collect();
        handles.into_iter().map(|handle| handle.join()).collect()
    });
    let elapsed = start.elapsed();

    tracing::debug!(mix = %workload.name, state = "joined", "Phase");
    let mut stats = Vec::with_capacity(joined.len());
    for (worker, outcome) in joined.into_iter().enumerate() {
        match outcome {
            Ok(Ok(worker_stats)) => stats.push(worker_stats),
            Ok(Err(err)) => {
                tracing::error!(worker, error = %err, "Worker failed");
                return Err(err);
            }
            Err(payload) => {
                return Err(Error::WorkerPanicked(format!(
                    "worker {}: {}",
                    worker,
                    panic_message(payload.as_ref())
                )))
            }
        }
    }

    let totals = sum_stats(&stats);
    let metrics = aggregate(&totals, elapsed, config.key_space, strategy);
    tracing::info!(
        mix = %workload.name,
        %strategy,
        reads = totals.reads,
        writes = totals.writes,
        read_ops_per_sec = metrics.read_ops_per_sec as u64,
        write_ops_per_sec = metrics.write_ops_per_sec as u64,
        state = "aggregated",
        "Phase finished"
    );
    Ok(PhaseReport {
        workload: workload.clone(),
        totals,
        elapsed_secs: elapsed.as_secs_f64(),
        metrics,
    })
}

/// Prepopulate, run every mix in order on the same engine, then read back.
pub fn run_workloads<E: Engine>(
    engine: &E,
    config: &MergeBenchConfig,
    strategy: WriteStrategy,
    merge: Option<&dyn MergeStrategy>,
    workloads: &[Workload],
) -> Result<StrategyReport> {
    config.validate()?;
    write_delta(strategy, merge)?;
    prepopulate(engine, config.key_space)?;

    let mut phases = Vec::with_capacity(workloads.len());
    for workload in workloads {
        phases.push(run_phase(engine, config, strategy, merge, workload)?);
    }

    let expected_total: u64 = phases.iter().map(|phase| phase.totals.writes).sum();
    let resolved_total = sum_counters(engine, config.key_space)?;
    let lost_updates = expected_total.saturating_sub(resolved_total);
    if lost_updates > 0 {
        tracing::info!(%strategy, expected_total, resolved_total, lost_updates, "Lost updates observed");
    }

    Ok(StrategyReport {
        strategy,
        key_space: config.key_space,
        phases,
        expected_total,
        resolved_total,
        lost_updates,
    })
}

/// Full benchmark over RocksDB: one fresh store per write strategy.
pub struct MergeBench {
    config: MergeBenchConfig,
    overrides: EngineOverrides,
    merge: Arc<dyn MergeStrategy>,
}

impl MergeBench {
    pub fn new(config: MergeBenchConfig) -> Self {
        Self {
            config,
            overrides: EngineOverrides::default(),
            merge: Arc::new(CounterMerge),
        }
    }

    pub fn with_overrides(mut self, overrides: EngineOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Read-modify-write first, then merge, each over the selected mixes.
    pub fn run(&self) -> Result<Vec<StrategyReport>> {
        self.config.validate()?;
        let workloads = select_workloads(&self.config.mix)?;
        [WriteStrategy::ReadModifyWrite, WriteStrategy::Merge]
            .into_iter()
            .map(|strategy| self.run_strategy(strategy, &workloads))
            .collect()
    }

    pub fn run_strategy(
        &self,
        strategy: WriteStrategy,
        workloads: &[Workload],
    ) -> Result<StrategyReport> {
        let db_path = self.config.db_root.join(strategy.dir_name());
        if db_path.exists() {
            std::fs::remove_dir_all(&db_path)?;
        }
        std::fs::create_dir_all(&self.config.db_root)?;

        tracing::info!(
            %strategy,
            path = %db_path.display(),
            key_space = self.config.key_space,
            threads = self.config.threads,
            "Starting benchmark"
        );
        let options = EngineOptions::merge_bench().with_overrides(&self.overrides);
        let operator = strategy.uses_merge().then(|| Arc::clone(&self.merge));
        let engine = RocksEngine::create(&db_path, &options, operator.clone())?;

        let report = run_workloads(
            &engine,
            &self.config,
            strategy,
            operator.as_deref(),
            workloads,
        )?;

        engine.close();
        std::fs::remove_dir_all(&db_path)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(MergeBenchConfig::default().validate().is_ok());

        let config = MergeBenchConfig {
            key_space: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = MergeBenchConfig {
            threads: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MergeBenchConfig {
            phase_duration: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = MergeBenchConfig {
            phase_duration: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_write_delta_follows_strategy() {
        let delta = write_delta(WriteStrategy::Merge, Some(&CounterMerge)).unwrap();
        assert_eq!(decode_counter(&delta), 1);
        assert!(write_delta(WriteStrategy::ReadModifyWrite, None)
            .unwrap()
            .is_empty());
        assert!(matches!(
            write_delta(WriteStrategy::Merge, None),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_seeded_worker_rngs_differ_per_worker() {
        use rand::Rng;
        let a: u64 = worker_rng(Some(7), 0).gen();
        let b: u64 = worker_rng(Some(7), 0).gen();
        let c: u64 = worker_rng(Some(7), 1).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
