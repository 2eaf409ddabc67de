//! Storage engine adapter
//!
//! The harness drives the engine only through the [`Engine`] trait. The
//! RocksDB implementation lives in [`rocks`]; the merge reduction it
//! registers is a [`MergeStrategy`] object from [`merge`].

pub mod merge;
pub mod rocks;

pub use merge::{decode_counter, encode_counter, CounterMerge, MergeStrategy};
pub use rocks::RocksEngine;

use crate::common::Result;
use serde::{Deserialize, Serialize};

/// Operations the benchmarks need from an LSM engine.
///
/// Implementations are shared by reference across worker threads, so every
/// operation takes `&self` and relies on the engine's own per-operation
/// concurrency guarantees.
pub trait Engine: Send + Sync {
    /// Apply a batch of puts atomically with write-ahead logging disabled.
    fn write_batch<K, V>(&self, entries: &[(K, V)]) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>;

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Record a merge operand for `key`; resolution is deferred.
    fn merge(&self, key: &[u8], operand: &[u8]) -> Result<()>;

    /// Point lookup. `Ok(None)` means not found.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Flush in-memory writes and wait for completion.
    fn flush(&self) -> Result<()>;

    /// Compact the whole key range.
    fn compact_all(&self) -> Result<()>;

    fn int_property(&self, property: Property) -> Result<Option<u64>>;
}

/// Integer properties reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    TotalSstFilesSize,
    EstimateNumKeys,
    EstimateTableReadersMem,
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::TotalSstFilesSize => "rocksdb.total-sst-files-size",
            Property::EstimateNumKeys => "rocksdb.estimate-num-keys",
            Property::EstimateTableReadersMem => "rocksdb.estimate-table-readers-mem",
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const MIB: usize = 1024 * 1024;

/// Engine tuning for one experiment instance.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Table block size; `None` keeps the engine default.
    pub block_size: Option<usize>,
    pub block_cache: bool,
    /// `false` disables compression at every level, bottommost included.
    pub compression: bool,
    pub write_buffer_size: usize,
    pub max_write_buffer_number: i32,
    pub target_file_size_base: u64,
    pub max_background_jobs: i32,
    /// Spread background work over this many threads.
    pub parallelism: Option<i32>,
    pub optimize_level_style_compaction: bool,
    pub level_compaction_dynamic_level_bytes: bool,
    pub disable_auto_compactions: bool,
    /// Direct I/O for reads, flushes and compactions.
    pub use_direct_io: bool,
    pub compaction_readahead_size: usize,
    /// Disable the WAL for point writes (batches never use it).
    pub disable_wal: bool,
    pub fill_cache: bool,
    pub verify_checksums: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            block_size: None,
            block_cache: true,
            compression: false,
            write_buffer_size: 64 * MIB,
            max_write_buffer_number: 2,
            target_file_size_base: 64 * MIB as u64,
            max_background_jobs: 2,
            parallelism: None,
            optimize_level_style_compaction: false,
            level_compaction_dynamic_level_bytes: false,
            disable_auto_compactions: false,
            use_direct_io: false,
            compaction_readahead_size: 2 * MIB,
            disable_wal: false,
            fill_cache: true,
            verify_checksums: true,
        }
    }
}

impl EngineOptions {
    /// Profile for the space-amplification experiment.
    ///
    /// No block cache, no filter policy, no compression, so the measured size
    /// reflects block layout only.
    pub fn space_amp(block_size: usize) -> Self {
        Self {
            block_size: Some(block_size),
            block_cache: false,
            compression: false,
            write_buffer_size: 256 * MIB,
            max_write_buffer_number: 4,
            target_file_size_base: 512 * MIB as u64,
            // 4 compactions + 2 flushes
            max_background_jobs: 6,
            parallelism: None,
            optimize_level_style_compaction: false,
            level_compaction_dynamic_level_bytes: true,
            disable_auto_compactions: false,
            use_direct_io: true,
            compaction_readahead_size: 2 * MIB,
            disable_wal: true,
            fill_cache: false,
            verify_checksums: false,
        }
    }

    /// Profile for the merge vs read-modify-write benchmark.
    pub fn merge_bench() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get() as i32)
            .unwrap_or(1);
        Self {
            block_size: None,
            block_cache: true,
            compression: false,
            write_buffer_size: 512 * MIB,
            max_write_buffer_number: 2,
            target_file_size_base: 512 * MIB as u64,
            max_background_jobs: parallelism.max(2),
            parallelism: Some(parallelism),
            optimize_level_style_compaction: true,
            level_compaction_dynamic_level_bytes: false,
            disable_auto_compactions: true,
            use_direct_io: true,
            compaction_readahead_size: 2 * MIB,
            disable_wal: false,
            fill_cache: false,
            verify_checksums: true,
        }
    }

    /// Patch host-specific knobs from configuration.
    pub fn with_overrides(mut self, overrides: &EngineOverrides) -> Self {
        if let Some(direct) = overrides.use_direct_io {
            self.use_direct_io = direct;
        }
        if let Some(size) = overrides.write_buffer_size {
            self.write_buffer_size = size;
        }
        if let Some(count) = overrides.max_write_buffer_number {
            self.max_write_buffer_number = count;
        }
        if let Some(size) = overrides.target_file_size_base {
            self.target_file_size_base = size;
        }
        if let Some(jobs) = overrides.max_background_jobs {
            self.max_background_jobs = jobs;
        }
        if let Some(size) = overrides.compaction_readahead_size {
            self.compaction_readahead_size = size;
        }
        self
    }
}

/// Engine settings that depend on the host rather than on the experiment.
///
/// Direct I/O, for instance, is unavailable on tmpfs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOverrides {
    pub use_direct_io: Option<bool>,
    pub write_buffer_size: Option<usize>,
    pub max_write_buffer_number: Option<i32>,
    pub target_file_size_base: Option<u64>,
    pub max_background_jobs: Option<i32>,
    pub compaction_readahead_size: Option<usize>,
}
