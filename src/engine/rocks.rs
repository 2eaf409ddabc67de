//! RocksDB implementation of the engine adapter

use super::{Engine, EngineOptions, MergeStrategy, Property};
use crate::common::{Error, Result};
use rocksdb::{
    BlockBasedOptions, DBCompressionType, FlushOptions, MergeOperands, Options, ReadOptions,
    WriteBatch, WriteOptions, DB,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An open RocksDB instance plus the read/write options every call uses.
pub struct RocksEngine {
    db: DB,
    path: PathBuf,
    write_opts: WriteOptions,
    bulk_write_opts: WriteOptions,
    read_opts: ReadOptions,
}

impl RocksEngine {
    /// Create a fresh instance at `path`. Fails if a store already exists there.
    pub fn create(
        path: impl AsRef<Path>,
        options: &EngineOptions,
        merge: Option<Arc<dyn MergeStrategy>>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut opts = build_options(options);
        opts.create_if_missing(true);
        opts.set_error_if_exists(true);
        if let Some(strategy) = merge {
            tracing::debug!(operator = strategy.name(), "Registering merge operator");
            register_merge_operator(&mut opts, strategy);
        }

        let db = DB::open(&opts, &path).map_err(Error::engine("Open"))?;
        tracing::debug!(path = %path.display(), "Created engine instance");
        Ok(Self::from_db(db, path, options))
    }

    /// Reopen an existing store without write access.
    pub fn open_read_only(path: impl AsRef<Path>, options: &EngineOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut opts = build_options(options);
        opts.create_if_missing(false);
        opts.set_error_if_exists(false);

        let db = DB::open_for_read_only(&opts, &path, false)
            .map_err(Error::engine("OpenForReadOnly"))?;
        tracing::debug!(path = %path.display(), "Opened engine instance read-only");
        Ok(Self::from_db(db, path, options))
    }

    fn from_db(db: DB, path: PathBuf, options: &EngineOptions) -> Self {
        let mut write_opts = WriteOptions::default();
        write_opts.disable_wal(options.disable_wal);

        let mut bulk_write_opts = WriteOptions::default();
        bulk_write_opts.disable_wal(true);

        let mut read_opts = ReadOptions::default();
        read_opts.fill_cache(options.fill_cache);
        read_opts.set_verify_checksums(options.verify_checksums);

        Self {
            db,
            path,
            write_opts,
            bulk_write_opts,
            read_opts,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the instance, releasing its file handles and lock.
    pub fn close(self) {
        let path = self.path.clone();
        drop(self);
        tracing::debug!(path = %path.display(), "Closed engine instance");
    }
}

impl Engine for RocksEngine {
    fn write_batch<K, V>(&self, entries: &[(K, V)]) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut batch = WriteBatch::default();
        for (key, value) in entries {
            batch.put(key, value);
        }
        self.db
            .write_opt(batch, &self.bulk_write_opts)
            .map_err(Error::engine("Write"))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.db
            .put_opt(key, value, &self.write_opts)
            .map_err(Error::engine("Put"))
    }

    fn merge(&self, key: &[u8], operand: &[u8]) -> Result<()> {
        self.db
            .merge_opt(key, operand, &self.write_opts)
            .map_err(Error::engine("Merge"))
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db
            .get_opt(key, &self.read_opts)
            .map_err(Error::engine("Get"))
    }

    fn flush(&self) -> Result<()> {
        let mut flush_opts = FlushOptions::default();
        flush_opts.set_wait(true);
        self.db
            .flush_opt(&flush_opts)
            .map_err(Error::engine("Flush"))
    }

    fn compact_all(&self) -> Result<()> {
        // The C API reports no status for manual compactions.
        self.db.compact_range(None::<&[u8]>, None::<&[u8]>);
        Ok(())
    }

    fn int_property(&self, property: Property) -> Result<Option<u64>> {
        self.db
            .property_int_value(property.name())
            .map_err(Error::engine("GetIntProperty"))
    }
}

fn build_options(options: &EngineOptions) -> Options {
    let mut opts = Options::default();

    if let Some(threads) = options.parallelism {
        opts.increase_parallelism(threads);
    }
    if options.optimize_level_style_compaction {
        opts.optimize_level_style_compaction(512 * 1024 * 1024);
    }
    if !options.compression {
        opts.set_compression_type(DBCompressionType::None);
        opts.set_bottommost_compression_type(DBCompressionType::None);
    }
    opts.set_level_compaction_dynamic_level_bytes(options.level_compaction_dynamic_level_bytes);
    opts.set_write_buffer_size(options.write_buffer_size);
    opts.set_max_write_buffer_number(options.max_write_buffer_number);
    opts.set_target_file_size_base(options.target_file_size_base);
    opts.set_max_background_jobs(options.max_background_jobs);
    opts.set_disable_auto_compactions(options.disable_auto_compactions);
    opts.set_use_direct_reads(options.use_direct_io);
    opts.set_use_direct_io_for_flush_and_compaction(options.use_direct_io);
    opts.set_compaction_readahead_size(options.compaction_readahead_size);

    // No filter policy is ever installed.
    let mut table = BlockBasedOptions::default();
    if let Some(block_size) = options.block_size {
        table.set_block_size(block_size);
    }
    if !options.block_cache {
        table.disable_cache();
    }
    table.set_cache_index_and_filter_blocks(false);
    table.set_pin_l0_filter_and_index_blocks_in_cache(false);
    opts.set_block_based_table_factory(&table);

    opts
}

fn register_merge_operator(opts: &mut Options, strategy: Arc<dyn MergeStrategy>) {
    let full_merge = {
        let strategy = Arc::clone(&strategy);
        move |_key: &[u8], existing: Option<&[u8]>, operands: &MergeOperands| {
            let mut iter = operands.iter();
            Some(strategy.resolve(existing, &mut iter))
        }
    };

    // Fails (keeping every operand) unless the strategy can combine all pairs.
    let partial_merge = {
        let strategy = Arc::clone(&strategy);
        move |_key: &[u8], _existing: Option<&[u8]>, operands: &MergeOperands| {
            let mut iter = operands.iter();
            let first = iter.next()?.to_vec();
            iter.try_fold(first, |acc, next| strategy.combine(&acc, next))
        }
    };

    opts.set_merge_operator(strategy.name(), full_merge, partial_merge);
}
