use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::filter::{FilterSpec, StageTrace};
use super::model::Table;
use crate::error::Result;

/// Filtered tables kept per dataset before the oldest is evicted.
pub const FILTER_CACHE_CAPACITY: usize = 16;

/// Hash used as a cache key.
pub fn fingerprint<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// A filtered table together with the row counts of the run that built it.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRun {
    pub table: Arc<Table>,
    pub traces: Vec<StageTrace>,
}

// ---------------------------------------------------------------------------
// Pipeline cache
// ---------------------------------------------------------------------------

/// Memoises the loaded table (keyed by a hash of the uploaded bytes) and
/// filtered tables (keyed by a hash of the [`FilterSpec`]).
///
/// Filtered entries are only valid for the dataset they were computed from:
/// installing a different upload clears them all. At most
/// [`FILTER_CACHE_CAPACITY`] of them are kept, oldest first out.
#[derive(Debug, Default)]
pub struct PipelineCache {
    dataset: Option<(u64, Arc<Table>)>,
    filtered: HashMap<u64, FilteredRun>,
    insertion_order: VecDeque<u64>,
    hits: usize,
    misses: usize,
}

impl PipelineCache {
    /// The table for `bytes`, parsing it with `load` only if these bytes are
    /// not the current dataset. A new dataset invalidates every entry.
    pub fn dataset_or_load<F>(&mut self, bytes: &[u8], load: F) -> Result<Arc<Table>>
    where
        F: FnOnce(&[u8]) -> Result<Table>,
    {
        let key = fingerprint(bytes);
        if let Some((current, table)) = &self.dataset {
            if *current == key {
                self.hits += 1;
                log::debug!("dataset cache hit ({key:016x})");
                return Ok(Arc::clone(table));
            }
        }

        self.misses += 1;
        let table = Arc::new(load(bytes)?);
        self.invalidate();
        self.dataset = Some((key, Arc::clone(&table)));
        Ok(table)
    }

    /// The filtered run for `spec`, computing it with `filter` on a miss.
    /// Must only be called after a dataset was installed.
    pub fn filtered_or_compute<F>(&mut self, spec: &FilterSpec, filter: F) -> Result<FilteredRun>
    where
        F: FnOnce() -> Result<(Table, Vec<StageTrace>)>,
    {
        let key = fingerprint(spec);
        if let Some(run) = self.filtered.get(&key) {
            self.hits += 1;
            log::debug!("filter cache hit ({key:016x})");
            return Ok(run.clone());
        }

        self.misses += 1;
        let (table, traces) = filter()?;
        let run = FilteredRun {
            table: Arc::new(table),
            traces,
        };

        if self.insertion_order.len() >= FILTER_CACHE_CAPACITY {
            if let Some(oldest) = self.insertion_order.pop_front() {
                self.filtered.remove(&oldest);
            }
        }
        self.insertion_order.push_back(key);
        self.filtered.insert(key, run.clone());
        Ok(run)
    }

    /// Drop every entry.
    pub fn invalidate(&mut self) {
        self.dataset = None;
        self.filtered.clear();
        self.insertion_order.clear();
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }
}
