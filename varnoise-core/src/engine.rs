//! Sample-level load and removal.
//!
//! Every operation that changes the store runs inside one transaction covering
//! all of its batches and the registry update, so a sample is either fully
//! applied or not at all. The engine borrows the store mutably for its whole
//! life: one writer at a time.

use std::num::NonZeroUsize;

use chrono::Utc;
use log::{error, info, warn};

use crate::errors::{Result, VarNoiseError};
use crate::merger::{BatchMerger, Direction, MergeSummary};
use crate::models::{AggregateRecord, Observation, SampleEntry, VariantKey};
use crate::source::{Batches, RecordSource};
use crate::store::Store;

pub const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

/// Outcome of replaying one sample's observations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSummary {
    pub sample: String,
    pub batches: usize,
    /// Observations dropped by the depth/fraction guard.
    pub skipped: usize,
    pub merged: MergeSummary,
}

pub struct AggregationEngine<'s, S: Store + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: Store + ?Sized> AggregationEngine<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        AggregationEngine { store }
    }

    ///
    /// Add every observation of a new sample and register it.
    ///
    /// Fails with `DuplicateSample` if a sample of the same name is registered.
    ///
    pub fn load_sample<R: RecordSource>(
        &mut self,
        source: R,
        batch_size: NonZeroUsize,
    ) -> Result<SampleSummary> {
        let entry = SampleEntry::new(source.sample_name(), source.source_path(), Utc::now());
        info!(
            "Loading sample '{}' from {} in batches of {}",
            entry.name, entry.source_path, batch_size
        );

        let summary = self.transaction(|store| {
            if store.exists(&entry.name)? {
                return Err(VarNoiseError::DuplicateSample(entry.name.clone()));
            }
            let summary = replay(store, source, Direction::Add, batch_size)?;
            store.register(&entry)?;
            Ok(summary)
        })?;

        info!(
            "Loaded sample '{}': {} new positions, {} updated, {} observations skipped",
            summary.sample, summary.merged.inserted, summary.merged.updated, summary.skipped
        );
        Ok(summary)
    }

    ///
    /// Take a registered sample back out.
    ///
    /// `source` must replay the observations the sample was loaded with.
    ///
    pub fn remove_sample<R: RecordSource>(
        &mut self,
        sample_name: &str,
        source: R,
        batch_size: NonZeroUsize,
    ) -> Result<SampleSummary> {
        info!("Removing sample '{}' using {}", sample_name, source.source_path());

        let summary = self.transaction(|store| {
            if !store.exists(sample_name)? {
                return Err(VarNoiseError::SampleNotFound(sample_name.to_string()));
            }
            check_source_matches(sample_name, &source)?;
            let summary = replay(store, source, Direction::Remove, batch_size)?;
            store.unregister(sample_name)?;
            Ok(summary)
        })?;

        info!(
            "Removed sample '{}': {} positions updated, {} deleted",
            sample_name, summary.merged.updated, summary.merged.deleted
        );
        Ok(summary)
    }

    ///
    /// Swap a registered sample's observations for a new set in one transaction.
    ///
    /// # Arguments
    /// - registered: replays what the sample was originally loaded with
    /// - replacement: the observations to load in its place
    ///
    pub fn replace_sample<R1: RecordSource, R2: RecordSource>(
        &mut self,
        registered: R1,
        replacement: R2,
        batch_size: NonZeroUsize,
    ) -> Result<(SampleSummary, SampleSummary)> {
        let name = registered.sample_name().to_string();
        let entry = SampleEntry::new(&name, replacement.source_path(), Utc::now());
        info!("Replacing sample '{}' with {}", name, entry.source_path);

        self.transaction(|store| {
            if !store.exists(&name)? {
                return Err(VarNoiseError::SampleNotFound(name.clone()));
            }
            check_source_matches(&name, &replacement)?;
            let removed = replay(store, registered, Direction::Remove, batch_size)?;
            store.unregister(&name)?;
            let loaded = replay(store, replacement, Direction::Add, batch_size)?;
            store.register(&entry)?;
            Ok((removed, loaded))
        })
    }

    /// The aggregate at `key`, or `KeyNotFound`.
    pub fn query(&self, key: &VariantKey) -> Result<AggregateRecord> {
        self.store
            .get(key)?
            .ok_or_else(|| VarNoiseError::KeyNotFound(key.clone()))
    }

    /// All aggregates ordered by key.
    pub fn records(&self) -> Result<Vec<AggregateRecord>> {
        Ok(self.store.scan()?)
    }

    /// All registered samples ordered by name.
    pub fn samples(&self) -> Result<Vec<SampleEntry>> {
        Ok(self.store.list()?)
    }

    fn transaction<T, F>(&mut self, work: F) -> Result<T>
    where
        F: FnOnce(&mut S) -> Result<T>,
    {
        self.store.begin_transaction()?;

        let outcome = work(&mut *self.store).and_then(|value| {
            self.store.commit()?;
            Ok(value)
        });

        if let Err(err) = &outcome {
            warn!("Rolling back: {}", err);
            if let Err(rollback_err) = self.store.rollback() {
                error!("Rollback failed: {}", rollback_err);
            }
        }
        outcome
    }
}

fn check_source_matches<R: RecordSource>(sample_name: &str, source: &R) -> Result<()> {
    if source.sample_name() != sample_name {
        return Err(VarNoiseError::InvalidState(format!(
            "{} holds sample '{}', expected '{}'",
            source.source_path(),
            source.sample_name(),
            sample_name
        )));
    }
    Ok(())
}

/// Feed a whole source through the merger, batch by batch.
fn replay<S, R>(
    store: &mut S,
    source: R,
    direction: Direction,
    batch_size: NonZeroUsize,
) -> Result<SampleSummary>
where
    S: Store + ?Sized,
    R: RecordSource,
{
    let mut summary = SampleSummary {
        sample: source.sample_name().to_string(),
        ..Default::default()
    };
    let mut merger = BatchMerger::new(store);

    for batch in Batches::new(source, batch_size) {
        let (usable, skipped) = screen(batch?);
        summary.skipped += skipped;
        summary.merged += merger.merge(&usable, direction)?;
        summary.batches += 1;
    }

    Ok(summary)
}

/// Drop observations that cannot contribute (zero depth, bad fraction).
fn screen(batch: Vec<Observation>) -> (Vec<Observation>, usize) {
    let total = batch.len();
    let usable: Vec<Observation> = batch
        .into_iter()
        .filter(|obs| match obs.checked_fraction() {
            Ok(_) => true,
            Err(err) => {
                warn!("Skipping observation: {}", err);
                false
            }
        })
        .collect();
    let skipped = total - usable.len();
    (usable, skipped)
}
