//! Benchmark worker loop

use super::workload::WriteStrategy;
use crate::common::Result;
use crate::engine::{decode_counter, encode_counter, Engine};
use rand::Rng;
use serde::Serialize;
use std::ops::AddAssign;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Counters owned by a single worker for the length of one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub reads: u64,
    pub writes: u64,
    pub merge_operands: u64,
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, other: Self) {
        self.reads += other.reads;
        self.writes += other.writes;
        self.merge_operands += other.merge_operands;
    }
}

/// What every worker of a phase does, shared by reference.
#[derive(Debug)]
pub struct PhasePlan {
    pub strategy: WriteStrategy,
    pub read_ratio: f64,
    pub key_space: u64,
    pub deadline: Instant,
    /// Operand for one merge write; empty for read-modify-write
    pub delta: Vec<u8>,
    /// Raised by the first worker that fails or panics
    pub stop: AtomicBool,
}

impl PhasePlan {
    pub fn new(
        strategy: WriteStrategy,
        read_ratio: f64,
        key_space: u64,
        deadline: Instant,
        delta: Vec<u8>,
    ) -> Self {
        Self {
            strategy,
            read_ratio,
            key_space,
            deadline,
            delta,
            stop: AtomicBool::new(false),
        }
    }

    /// Whether workers should start another iteration.
    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::Relaxed) && Instant::now() < self.deadline
    }

    /// End the phase early for every worker.
    pub fn abort(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// Aborts the phase if the owning worker unwinds.
struct AbortOnPanic<'a>(&'a PhasePlan);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.abort();
        }
    }
}

/// Run operations until the deadline passes or the phase is aborted.
///
/// Both are checked before each iteration, so a worker overshoots by at most
/// one operation. Any engine failure other than a missing key on read ends
/// the worker with that error and aborts its siblings.
pub fn run_worker<E, R>(engine: &E, plan: &PhasePlan, rng: &mut R) -> Result<WorkerStats>
where
    E: Engine,
    R: Rng,
{
    let _guard = AbortOnPanic(plan);
    let result = drive(engine, plan, rng);
    if result.is_err() {
        plan.abort();
    }
    result
}

fn drive<E, R>(engine: &E, plan: &PhasePlan, rng: &mut R) -> Result<WorkerStats>
where
    E: Engine,
    R: Rng,
{
    let mut stats = WorkerStats::default();
    while plan.is_running() {
        let pick: f64 = rng.gen();
        let key = rng.gen_range(0..plan.key_space).to_string();

        if pick < plan.read_ratio {
            engine.get(key.as_bytes())?;
            stats.reads += 1;
            continue;
        }

        match plan.strategy {
            WriteStrategy::Merge => {
                engine.merge(key.as_bytes(), &plan.delta)?;
                stats.merge_operands += 1;
            }
            WriteStrategy::ReadModifyWrite => {
                // Two separate operations: concurrent increments may be lost.
                let current = engine
                    .get(key.as_bytes())?
                    .map(|value| decode_counter(&value))
                    .unwrap_or(0);
                engine.put(key.as_bytes(), &encode_counter(current + 1))?;
            }
        }
        stats.writes += 1;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let mut total = WorkerStats::default();
        total += WorkerStats {
            reads: 3,
            writes: 2,
            merge_operands: 2,
        };
        total += WorkerStats {
            reads: 1,
            writes: 5,
            merge_operands: 0,
        };
        assert_eq!(
            total,
            WorkerStats {
                reads: 4,
                writes: 7,
                merge_operands: 2,
            }
        );
    }

    #[test]
    fn test_abort_stops_the_plan() {
        let plan = PhasePlan::new(
            WriteStrategy::ReadModifyWrite,
            0.5,
            10,
            Instant::now() + std::time::Duration::from_secs(60),
            Vec::new(),
        );
        assert!(plan.is_running());
        plan.abort();
        assert!(!plan.is_running());
    }
}
