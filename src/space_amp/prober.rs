//! Random point-read throughput probe

use crate::common::{elapsed_secs, Error, Result};
use crate::dataset::{fill_key, Dataset, KEY_SIZE};
use crate::engine::Engine;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

/// Fixed seed so every run samples the same index sequence.
pub const PROBE_SEED: u64 = 0xC0FFEE;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadProbe {
    pub reads: u64,
    pub elapsed: Duration,
    pub ops_per_sec: f64,
}

impl ReadProbe {
    fn skipped() -> Self {
        Self {
            reads: 0,
            elapsed: Duration::ZERO,
            ops_per_sec: 0.0,
        }
    }
}

/// Issue `read_ops` uniformly random point reads over `dataset`.
///
/// The engine should be opened read-only with cache fill and checksum
/// verification off. Every key of the dataset must be present: a miss means
/// the loader and prober disagree and aborts the probe.
pub fn probe_reads<E: Engine>(engine: &E, dataset: &Dataset, read_ops: u64) -> Result<ReadProbe> {
    if read_ops == 0 {
        return Ok(ReadProbe::skipped());
    }
    let entry_count = dataset.entry_count();
    if entry_count == 0 {
        return Err(Error::InvalidConfig(
            "cannot probe reads on an empty dataset".into(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(PROBE_SEED);
    let mut key = [0u8; KEY_SIZE];

    let start = Instant::now();
    for _ in 0..read_ops {
        let index = rng.gen_range(0..entry_count);
        fill_key(index, &mut key);
        if engine.get(&key)?.is_none() {
            return Err(Error::NotFound(String::from_utf8_lossy(&key).into_owned()));
        }
    }
    let elapsed = start.elapsed();

    let probe = ReadProbe {
        reads: read_ops,
        elapsed,
        ops_per_sec: read_ops as f64 / elapsed_secs(elapsed),
    };
    tracing::info!(
        reads = probe.reads,
        ops_per_sec = probe.ops_per_sec as u64,
        "Read probe finished"
    );
    Ok(probe)
}
