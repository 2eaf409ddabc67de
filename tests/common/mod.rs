//! In-memory engine used to drive the harness without RocksDB

#![allow(dead_code)]

use lsm_bench::engine::{Engine, EngineOverrides, MergeStrategy, Property};
use lsm_bench::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct Slot {
    base: Option<Vec<u8>>,
    operands: Vec<Vec<u8>>,
}

/// HashMap-backed engine with lazy merge resolution.
///
/// `read_delay` sleeps after a get has read its value, widening the window
/// between the read and write halves of a read-modify-write. `fail_after`
/// and `panic_after` count point operations (get, put, merge) and fault every
/// operation past the limit.
#[derive(Default)]
pub struct MemEngine {
    map: Mutex<HashMap<Vec<u8>, Slot>>,
    merge: Option<Arc<dyn MergeStrategy>>,
    read_delay: Option<Duration>,
    record_reads: bool,
    reads: Mutex<Vec<Vec<u8>>>,
    gets: AtomicU64,
    fail_after: Option<u64>,
    panic_after: Option<u64>,
    point_ops: AtomicU64,
}

impl MemEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_merge(mut self, merge: Arc<dyn MergeStrategy>) -> Self {
        self.merge = Some(merge);
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn recording_reads(mut self) -> Self {
        self.record_reads = true;
        self
    }

    pub fn failing_after(mut self, ops: u64) -> Self {
        self.fail_after = Some(ops);
        self
    }

    pub fn panicking_after(mut self, ops: u64) -> Self {
        self.panic_after = Some(ops);
        self
    }

    pub fn gets(&self) -> u64 {
        self.gets.load(Ordering::Relaxed)
    }

    pub fn read_keys(&self) -> Vec<Vec<u8>> {
        self.reads.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.map.lock().unwrap().len()
    }

    fn count_point_op(&self) -> Result<()> {
        let op = self.point_ops.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(limit) = self.panic_after {
            if op > limit {
                panic!("engine panicked at operation {}", op);
            }
        }
        if let Some(limit) = self.fail_after {
            if op > limit {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("engine failed at operation {}", op),
                )));
            }
        }
        Ok(())
    }

    fn resolve(&self, slot: &Slot) -> Option<Vec<u8>> {
        if slot.operands.is_empty() {
            return slot.base.clone();
        }
        let merge = self
            .merge
            .as_ref()
            .expect("merge operand stored without a merge strategy");
        let mut operands = slot.operands.iter().map(|op| op.as_slice());
        Some(merge.resolve(slot.base.as_deref(), &mut operands))
    }
}

impl Engine for MemEngine {
    fn write_batch<K, V>(&self, entries: &[(K, V)]) -> Result<()>
    where
        K: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut map = self.map.lock().unwrap();
        for (key, value) in entries {
            map.insert(
                key.as_ref().to_vec(),
                Slot {
                    base: Some(value.as_ref().to_vec()),
                    operands: Vec::new(),
                },
            );
        }
        Ok(())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.count_point_op()?;
        self.write_batch(&[(key, value)])
    }

    fn merge(&self, key: &[u8], operand: &[u8]) -> Result<()> {
        self.count_point_op()?;
        let mut map = self.map.lock().unwrap();
        map.entry(key.to_vec())
            .or_default()
            .operands
            .push(operand.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.count_point_op()?;
        self.gets.fetch_add(1, Ordering::Relaxed);
        if self.record_reads {
            self.reads.lock().unwrap().push(key.to_vec());
        }
        let value = {
            let map = self.map.lock().unwrap();
            map.get(key).and_then(|slot| self.resolve(slot))
        };
        if let Some(delay) = self.read_delay {
            std::thread::sleep(delay);
        }
        Ok(value)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn compact_all(&self) -> Result<()> {
        let mut map = self.map.lock().unwrap();
        let keys: Vec<Vec<u8>> = map.keys().cloned().collect();
        for key in keys {
            let resolved = map.get(&key).and_then(|slot| self.resolve(slot));
            map.insert(
                key,
                Slot {
                    base: resolved,
                    operands: Vec::new(),
                },
            );
        }
        Ok(())
    }

    fn int_property(&self, property: Property) -> Result<Option<u64>> {
        match property {
            Property::EstimateNumKeys => Ok(Some(self.len() as u64)),
            _ => Ok(None),
        }
    }
}

/// Engine knobs for RocksDB stores under a temp directory.
pub fn test_overrides() -> EngineOverrides {
    EngineOverrides {
        use_direct_io: Some(false),
        write_buffer_size: Some(4 * 1024 * 1024),
        max_write_buffer_number: Some(2),
        target_file_size_base: Some(64 * 1024 * 1024),
        ..Default::default()
    }
}
