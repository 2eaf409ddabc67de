//! Space-amplification experiment
//!
//! Loads the identical dataset once per candidate block size into a fresh,
//! compression-free RocksDB instance, compacts it, and compares the on-disk
//! SST size with the raw payload.

pub mod prober;

pub use prober::{probe_reads, ReadProbe, PROBE_SEED};

use crate::common::{Error, Result};
use crate::dataset::Dataset;
use crate::engine::{Engine, EngineOptions, EngineOverrides, Property, RocksEngine};
use crate::loader::bulk_load;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default candidate block sizes: 4, 8, 16, 32 and 64 KiB.
pub fn default_block_sizes() -> Vec<i64> {
    vec![4 * 1024, 8 * 1024, 16 * 1024, 32 * 1024, 64 * 1024]
}

/// Parse a comma-separated block-size list.
///
/// Whitespace and empty items are ignored; an empty list means the defaults.
pub fn parse_block_sizes(csv: &str) -> Result<Vec<i64>> {
    let mut sizes = Vec::new();
    for item in csv.split(',') {
        let item: String = item.chars().filter(|c| !c.is_whitespace()).collect();
        if item.is_empty() {
            continue;
        }
        let size = item
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("invalid block size: {}", item)))?;
        sizes.push(size);
    }
    if sizes.is_empty() {
        sizes = default_block_sizes();
    }
    Ok(sizes)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceAmpConfig {
    /// Candidate table block sizes in bytes
    pub block_sizes: Vec<i64>,

    /// Parent directory of the per-block-size stores
    pub db_root: PathBuf,

    /// Keep the stores on disk after the run
    pub keep_dbs: bool,

    /// Random reads per block size; 0 skips the read probe
    pub read_ops: u64,
}

impl Default for SpaceAmpConfig {
    fn default() -> Self {
        Self {
            block_sizes: default_block_sizes(),
            db_root: PathBuf::from("./space_amp_runs"),
            keep_dbs: false,
            read_ops: 200_000,
        }
    }
}

impl SpaceAmpConfig {
    /// Every block size as `usize`, or an error naming the first non-positive one.
    pub fn validated_block_sizes(&self) -> Result<Vec<usize>> {
        if self.block_sizes.is_empty() {
            return Err(Error::InvalidConfig("no block sizes configured".into()));
        }
        self.block_sizes
            .iter()
            .map(|&size| {
                if size <= 0 {
                    Err(Error::InvalidConfig(format!(
                        "Block size must be positive: {}",
                        size
                    )))
                } else {
                    Ok(size as usize)
                }
            })
            .collect()
    }
}

/// Measurements for one block size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceAmpResult {
    pub block_size: usize,
    pub total_sst_bytes: u64,
    pub estimated_keys: u64,
    pub table_readers_mem: u64,
    pub amplification: f64,
    pub read_ops_per_sec: f64,
}

/// On-disk size divided by raw payload size.
pub fn amplification(on_disk_bytes: u64, raw_payload_bytes: u64) -> Result<f64> {
    if raw_payload_bytes == 0 {
        return Err(Error::Measurement("raw payload is empty".into()));
    }
    if on_disk_bytes == 0 {
        return Err(Error::Measurement(
            "engine reported zero on-disk bytes after compaction".into(),
        ));
    }
    Ok(on_disk_bytes as f64 / raw_payload_bytes as f64)
}

fn required_property<E: Engine>(engine: &E, property: Property) -> Result<u64> {
    engine
        .int_property(property)?
        .ok_or_else(|| Error::PropertyUnavailable(property.name().to_string()))
}

pub struct SpaceAmpExperiment {
    config: SpaceAmpConfig,
    dataset: Dataset,
    overrides: EngineOverrides,
}

impl SpaceAmpExperiment {
    pub fn new(config: SpaceAmpConfig, dataset: Dataset) -> Self {
        Self {
            config,
            dataset,
            overrides: EngineOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: EngineOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Store directory for one block size.
    pub fn db_path(&self, block_size: usize) -> PathBuf {
        self.config.db_root.join(format!("block_{}", block_size))
    }

    /// Run every configured block size in order.
    ///
    /// All sizes are validated before the first instance is created.
    pub fn run(&self) -> Result<Vec<SpaceAmpResult>> {
        let block_sizes = self.config.validated_block_sizes()?;
        tracing::info!(
            block_sizes = ?block_sizes,
            entries = self.dataset.entry_count(),
            raw_bytes = self.dataset.raw_payload_bytes(),
            "Starting space amplification experiment"
        );

        let mut results = Vec::with_capacity(block_sizes.len());
        for block_size in block_sizes {
            results.push(self.run_once(block_size)?);
        }
        Ok(results)
    }

    /// Load, compact, measure and optionally probe one block size.
    pub fn run_once(&self, block_size: usize) -> Result<SpaceAmpResult> {
        if block_size == 0 {
            return Err(Error::InvalidConfig(
                "Block size must be positive: 0".into(),
            ));
        }

        let db_path = self.db_path(block_size);
        std::fs::create_dir_all(&self.config.db_root)?;
        if db_path.exists() {
            std::fs::remove_dir_all(&db_path)?;
        }

        let options = EngineOptions::space_amp(block_size).with_overrides(&self.overrides);
        let engine = RocksEngine::create(&db_path, &options, None)?;
        bulk_load(&engine, &self.dataset)?;

        let total_sst_bytes = required_property(&engine, Property::TotalSstFilesSize)?;
        let estimated_keys = required_property(&engine, Property::EstimateNumKeys)?;
        let table_readers_mem = required_property(&engine, Property::EstimateTableReadersMem)?;
        let amplification = amplification(total_sst_bytes, self.dataset.raw_payload_bytes())?;
        if amplification < 1.0 {
            tracing::warn!(
                block_size,
                amplification,
                "On-disk size below raw payload; treat as a measurement anomaly"
            );
        }
        engine.close();

        let mut read_ops_per_sec = 0.0;
        if self.config.read_ops > 0 {
            tracing::info!(
                block_size,
                read_ops = self.config.read_ops,
                "Ingest complete, starting read benchmark"
            );
            let reader = RocksEngine::open_read_only(&db_path, &options)?;
            let probe = probe_reads(&reader, &self.dataset, self.config.read_ops)?;
            read_ops_per_sec = probe.ops_per_sec;
            reader.close();
        }

        if !self.config.keep_dbs {
            std::fs::remove_dir_all(&db_path)?;
        }

        let result = SpaceAmpResult {
            block_size,
            total_sst_bytes,
            estimated_keys,
            table_readers_mem,
            amplification,
            read_ops_per_sec,
        };
        tracing::info!(?result, "Block size measured");
        Ok(result)
    }
}
