//! Phase-level aggregation of worker counters

use super::worker::WorkerStats;
use super::workload::{Workload, WriteStrategy};
use crate::common::elapsed_secs;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseMetrics {
    pub read_ops_per_sec: f64,
    pub write_ops_per_sec: f64,
    /// Merge operands issued per key; 0 for read-modify-write
    pub avg_merge_ops_per_key: f64,
}

/// Result of one workload mix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseReport {
    pub workload: Workload,
    pub totals: WorkerStats,
    pub elapsed_secs: f64,
    pub metrics: PhaseMetrics,
}

/// Result of all mixes for one write strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyReport {
    pub strategy: WriteStrategy,
    pub key_space: u64,
    pub phases: Vec<PhaseReport>,
    /// Increments issued across every phase
    pub expected_total: u64,
    /// Sum of all counters read back after the last phase
    pub resolved_total: u64,
    pub lost_updates: u64,
}

/// Sum the counters of every joined worker.
pub fn sum_stats(stats: &[WorkerStats]) -> WorkerStats {
    let mut total = WorkerStats::default();
    for worker in stats {
        total += *worker;
    }
    total
}

/// Turn phase totals into per-second rates over the measured wall time.
pub fn aggregate(
    totals: &WorkerStats,
    elapsed: Duration,
    key_space: u64,
    strategy: WriteStrategy,
) -> PhaseMetrics {
    let seconds = elapsed_secs(elapsed);
    let avg_merge_ops_per_key = if strategy.uses_merge() && key_space > 0 {
        totals.merge_operands as f64 / key_space as f64
    } else {
        0.0
    };
    PhaseMetrics {
        read_ops_per_sec: totals.reads as f64 / seconds,
        write_ops_per_sec: totals.writes as f64 / seconds,
        avg_merge_ops_per_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(reads: u64, writes: u64, merge_operands: u64) -> WorkerStats {
        WorkerStats {
            reads,
            writes,
            merge_operands,
        }
    }

    #[test]
    fn test_sum_stats() {
        let total = sum_stats(&[stats(10, 5, 5), stats(20, 15, 15), stats(0, 0, 0)]);
        assert_eq!(total, stats(30, 20, 20));
        assert_eq!(sum_stats(&[]), WorkerStats::default());
    }

    #[test]
    fn test_merge_rates() {
        let totals = stats(3_000, 1_000, 1_000);
        let metrics = aggregate(&totals, Duration::from_secs(2), 500, WriteStrategy::Merge);
        assert_eq!(metrics.read_ops_per_sec, 1_500.0);
        assert_eq!(metrics.write_ops_per_sec, 500.0);
        assert_eq!(metrics.avg_merge_ops_per_key, 2.0);
    }

    #[test]
    fn test_rmw_reports_no_merge_operands() {
        let totals = stats(100, 100, 0);
        let metrics = aggregate(
            &totals,
            Duration::from_secs(1),
            10,
            WriteStrategy::ReadModifyWrite,
        );
        assert_eq!(metrics.write_ops_per_sec, 100.0);
        assert_eq!(metrics.avg_merge_ops_per_key, 0.0);
    }

    #[test]
    fn test_zero_elapsed_is_floored() {
        let metrics = aggregate(&stats(1, 0, 0), Duration::ZERO, 1, WriteStrategy::Merge);
        assert!(metrics.read_ops_per_sec.is_finite());
        assert!(metrics.read_ops_per_sec > 0.0);
    }
}
