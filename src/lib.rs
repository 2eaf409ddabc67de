//! # lsm-bench
//!
//! Two controlled experiments against an LSM storage engine (RocksDB):
//! - **Space amplification**: on-disk SST size versus raw payload for a set
//!   of table block sizes, over an identical 4 GiB synthetic dataset.
//! - **Merge vs read-modify-write**: throughput and lost updates of the
//!   engine-native merge operator against an explicit get/increment/put,
//!   across read/write mixes.
//!
//! ## Architecture
//!
//! ```text
//!  lsm-space-amp                      lsm-merge-bench
//!       │                                   │
//! ┌─────▼──────────────┐          ┌─────────▼───────────┐
//! │ SpaceAmpExperiment │          │ MergeBench          │
//! │  ├─ bulk_load      │          │  ├─ prepopulate     │
//! │  └─ probe_reads    │          │  ├─ run_phase ×N    │
//! └─────┬──────────────┘          │  │   (worker pool)  │
//!       │   dataset (key/value    │  └─ aggregate       │
//!       │   generator)            └─────────┬───────────┘
//!       └──────────────┬────────────────────┘
//!                ┌─────▼──────┐
//!                │ Engine     │ RocksEngine + MergeStrategy
//!                └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Block sizes 4 KiB..64 KiB, keep the stores for inspection
//! lsm-space-amp --block_sizes=4096,16384,65536 --keep_dbs --read_ops=100000
//!
//! # 8 threads, 10s per mix, only the 50/50 mix
//! lsm-merge-bench --keys=10000 --threads=8 --seconds=10 --mix=50/50
//! ```

pub mod common;
pub mod dataset;
pub mod engine;
pub mod loader;
pub mod merge_bench;
pub mod space_amp;

// Re-export commonly used types
pub use common::{Config, Error, ErrorCategory, Result};
pub use dataset::Dataset;
pub use engine::{Engine, EngineOptions, RocksEngine};
pub use merge_bench::{MergeBench, MergeBenchConfig};
pub use space_amp::{SpaceAmpConfig, SpaceAmpExperiment};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
