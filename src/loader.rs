//! Bulk loader
//!
//! Streams the deterministic dataset into a fresh engine in fixed-size
//! batches, then forces everything to its final on-disk layout.

use crate::common::Result;
use crate::dataset::{fill_key, fill_value, Dataset, Key, Value, KEY_SIZE, VALUE_SIZE};
use crate::engine::Engine;
use std::time::{Duration, Instant};

/// Entries per write batch.
pub const BATCH_SIZE: usize = 1_000;

/// Progress is logged every tenth of the dataset.
const PROGRESS_STEPS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadReport {
    pub entries: u64,
    pub batches: u64,
    pub elapsed: Duration,
}

/// Write every dataset entry, then flush and compact the full range.
///
/// Size measurements are only meaningful after this returns: until the
/// flush and compaction finish the engine may still hold entries in write
/// buffers or unmerged intermediate files.
pub fn bulk_load<E: Engine>(engine: &E, dataset: &Dataset) -> Result<LoadReport> {
    let start = Instant::now();
    let total = dataset.entry_count();
    let progress_every = (total / PROGRESS_STEPS).max(1);

    let mut batch: Vec<(Key, Value)> = Vec::with_capacity(BATCH_SIZE);
    let mut batches = 0u64;

    for index in 0..total {
        let mut key = [0u8; KEY_SIZE];
        let mut value = [0u8; VALUE_SIZE];
        fill_key(index, &mut key);
        fill_value(index, &mut value);
        batch.push((key, value));

        if batch.len() >= BATCH_SIZE {
            engine.write_batch(&batch)?;
            batch.clear();
            batches += 1;
        }
        if (index + 1) % progress_every == 0 {
            tracing::debug!(written = index + 1, total, "Bulk load progress");
        }
    }
    if !batch.is_empty() {
        engine.write_batch(&batch)?;
        batches += 1;
    }

    tracing::debug!(entries = total, batches, "Ingest complete, flushing");
    engine.flush()?;
    tracing::debug!("Flush complete, compacting full range");
    engine.compact_all()?;

    let report = LoadReport {
        entries: total,
        batches,
        elapsed: start.elapsed(),
    };
    tracing::info!(
        entries = report.entries,
        batches = report.batches,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Bulk load finished"
    );
    Ok(report)
}
