//! One read-modify-write cycle over a batch of observations.
//!
//! The merger reads the current records for every key in the batch with a
//! single `batch_get`, folds the observations into private working copies in
//! batch order, and hands the resulting inserts, updates and deletes to a
//! single `batch_write`. Nothing reaches the store if any step fails.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::ops::AddAssign;

use fxhash::{FxHashMap, FxHashSet};
use log::{debug, warn};

use crate::errors::{Result, VarNoiseError};
use crate::models::{AggregateRecord, Observation, VariantKey};
use crate::store::{AggregateStore, WriteSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Add,
    Remove,
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Add => write!(f, "add"),
            Direction::Remove => write!(f, "remove"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Observations folded in; zero-depth or out-of-range ones are skipped.
    pub observations: usize,
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl AddAssign for MergeSummary {
    fn add_assign(&mut self, other: Self) {
        self.observations += other.observations;
        self.inserted += other.inserted;
        self.updated += other.updated;
        self.deleted += other.deleted;
    }
}

/// Working copy of one key for the duration of a batch.
struct Working {
    existed: bool,
    current: Option<AggregateRecord>,
}

pub struct BatchMerger<'s, S: AggregateStore + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: AggregateStore + ?Sized> BatchMerger<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        BatchMerger { store }
    }

    ///
    /// Merge `batch` into the store.
    ///
    /// # Arguments
    /// - batch: observations, folded in the given order
    /// - direction: whether the observations are being added or taken back out
    ///
    pub fn merge(&mut self, batch: &[Observation], direction: Direction) -> Result<MergeSummary> {
        if batch.is_empty() {
            return Ok(MergeSummary::default());
        }

        let keys = distinct_keys(batch);
        let baseline = self.store.batch_get(&keys)?;
        let writes = plan_writes(batch, baseline, direction)?;

        debug!(
            "{} batch of {} observations over {} keys: {} inserts, {} updates, {} deletes",
            direction,
            batch.len(),
            keys.len(),
            writes.inserts.len(),
            writes.updates.len(),
            writes.deletes.len()
        );

        let summary = MergeSummary {
            observations: batch.iter().filter(|o| o.checked_fraction().is_ok()).count(),
            inserted: writes.inserts.len(),
            updated: writes.updates.len(),
            deleted: writes.deletes.len(),
        };

        if !writes.is_empty() {
            self.store.batch_write(&writes)?;
        }

        Ok(summary)
    }
}

/// Keys touched by the batch, each once, in order of first appearance.
fn distinct_keys(batch: &[Observation]) -> Vec<VariantKey> {
    let mut seen: FxHashSet<&VariantKey> = FxHashSet::default();
    batch
        .iter()
        .filter(|obs| seen.insert(&obs.key))
        .map(|obs| obs.key.clone())
        .collect()
}

///
/// Fold the batch over the records read from the store and work out what has
/// to be written back.
///
/// Observations on the same key are applied one after another, each seeing the
/// result of the previous one.
///
pub fn plan_writes(
    batch: &[Observation],
    mut baseline: HashMap<VariantKey, AggregateRecord>,
    direction: Direction,
) -> Result<WriteSet> {
    let mut working: FxHashMap<&VariantKey, Working> = FxHashMap::default();
    let mut contributions: FxHashSet<(&VariantKey, &str)> = FxHashSet::default();

    for obs in batch {
        let value = match obs.checked_fraction() {
            Ok(value) => value,
            Err(err) => {
                warn!("Skipping {} from sample {}: {}", obs.key, obs.sample, err);
                continue;
            }
        };

        if !contributions.insert((&obs.key, obs.sample.as_str())) {
            warn!(
                "Sample {} appears more than once at {} in one batch; folding sequentially",
                obs.sample, obs.key
            );
        }

        let slot = working.entry(&obs.key).or_insert_with(|| {
            let current = baseline.remove(&obs.key);
            Working {
                existed: current.is_some(),
                current,
            }
        });

        slot.current = match direction {
            Direction::Add => Some(fold_add(slot.current.take(), obs, value)),
            Direction::Remove => {
                let record = slot
                    .current
                    .take()
                    .ok_or_else(|| VarNoiseError::KeyNotFound(obs.key.clone()))?;
                fold_remove(record, obs, value)?
            }
        };
    }

    let mut keyed: Vec<(&VariantKey, Working)> = working.into_iter().collect();
    keyed.sort_by(|a, b| a.0.cmp(b.0));

    let mut writes = WriteSet::default();
    for (key, slot) in keyed {
        match (slot.existed, slot.current) {
            (false, Some(record)) => writes.inserts.push(record),
            (true, Some(record)) => writes.updates.push(record),
            (true, None) => writes.deletes.push(key.clone()),
            (false, None) => {}
        }
    }

    Ok(writes)
}

fn fold_add(record: Option<AggregateRecord>, obs: &Observation, value: f64) -> AggregateRecord {
    match record {
        None => AggregateRecord::first(obs.key.clone(), value, obs.weight(), &obs.sample),
        Some(mut record) => {
            record.stats = record.stats.add(value);
            record.total_depth += obs.weight();
            record.extrema.observe_add(value, &obs.sample);
            record
        }
    }
}

/// `None` means the last contributor is gone and the record must be deleted.
fn fold_remove(
    mut record: AggregateRecord,
    obs: &Observation,
    value: f64,
) -> Result<Option<AggregateRecord>> {
    let stats = record.stats.remove(value)?;
    if stats.is_empty() {
        return Ok(None);
    }

    record.total_depth = record.total_depth.checked_sub(obs.weight()).ok_or_else(|| {
        VarNoiseError::InvalidState(format!(
            "removing depth {} of {} at {} exceeds total depth {}",
            obs.depth, obs.sample, obs.key, record.total_depth
        ))
    })?;
    record.stats = stats;
    record.extrema.observe_remove(value, &obs.sample);

    Ok(Some(record))
}
