//! End-to-end sample load/remove through the engine against the in-memory store.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use pretty_assertions::assert_eq;
use rstest::*;

use varnoise_core::store::StoreResult;
use varnoise_core::{
    AggregateRecord, AggregateStore, AggregationEngine, Extremum, MemoryStore, Observation,
    ObservationList, SampleEntry, SampleRegistry, StoreError, Transactional, VarNoiseError,
    VariantKey, WriteSet,
};

fn obs(pos: u64, sample: &str, af: f64, depth: u32) -> Observation {
    Observation::new(VariantKey::new("chr1", pos), sample, af, depth)
}

fn batch_size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[fixture]
fn sample_a() -> Vec<Observation> {
    vec![obs(100, "A", 0.10, 10), obs(200, "A", 0.40, 8), obs(300, "A", 0.05, 20)]
}

#[fixture]
fn sample_b() -> Vec<Observation> {
    vec![obs(100, "B", 0.20, 20), obs(200, "B", 0.60, 12)]
}

fn source(sample: &str, observations: Vec<Observation>) -> ObservationList {
    ObservationList::new(sample, format!("{}.g.vcf", sample), observations)
}

#[rstest]
fn test_load_registers_and_aggregates(sample_a: Vec<Observation>, sample_b: Vec<Observation>) {
    let mut store = MemoryStore::new();
    let mut engine = AggregationEngine::new(&mut store);

    let summary = engine.load_sample(source("A", sample_a), batch_size(2)).unwrap();
    assert_eq!(summary.batches, 2);
    assert_eq!(summary.merged.inserted, 3);

    let summary = engine.load_sample(source("B", sample_b), batch_size(2)).unwrap();
    assert_eq!(summary.merged.inserted, 0);
    assert_eq!(summary.merged.updated, 2);

    let record = engine.query(&VariantKey::new("chr1", 200)).unwrap();
    assert_eq!(record.count(), 2);
    assert!((record.mean() - 0.5).abs() < 1e-12);
    assert!((record.std_dev() - 0.1).abs() < 1e-12);
    assert_eq!(record.total_depth, 20);
    assert_eq!(record.max(), Some(&Extremum::new(0.60, "B")));

    let names: Vec<String> = engine.samples().unwrap().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(engine.samples().unwrap()[0].source_path, "A.g.vcf");
}

#[rstest]
fn test_duplicate_sample_is_rejected(sample_a: Vec<Observation>) {
    let mut store = MemoryStore::new();
    let mut engine = AggregationEngine::new(&mut store);
    engine.load_sample(source("A", sample_a.clone()), batch_size(10)).unwrap();

    let result = engine.load_sample(source("A", sample_a), batch_size(10));
    assert!(matches!(result, Err(VarNoiseError::DuplicateSample(name)) if name == "A"));

    // the rejected load must not have double counted anything
    assert_eq!(engine.query(&VariantKey::new("chr1", 100)).unwrap().count(), 1);
}

#[rstest]
fn test_remove_restores_previous_state(sample_a: Vec<Observation>, sample_b: Vec<Observation>) {
    let mut store = MemoryStore::new();
    let mut engine = AggregationEngine::new(&mut store);
    engine.load_sample(source("A", sample_a), batch_size(10)).unwrap();
    let before = engine.records().unwrap();

    engine.load_sample(source("B", sample_b.clone()), batch_size(10)).unwrap();
    let summary = engine.remove_sample("B", source("B", sample_b), batch_size(1)).unwrap();
    assert_eq!(summary.merged.updated, 2);

    let after = engine.records().unwrap();
    assert_eq!(after.len(), before.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(a.key, b.key);
        assert_eq!(a.count(), b.count());
        assert_eq!(a.total_depth, b.total_depth);
        assert!((a.mean() - b.mean()).abs() < 1e-9);
        assert!((a.std_dev() - b.std_dev()).abs() < 1e-9);
    }
    // B held the max at 100 and 200, those are now unknown rather than reverted
    assert_eq!(after[0].max(), None);
    assert!(!engine.samples().unwrap().iter().any(|s| s.name == "B"));
}

#[rstest]
fn test_remove_last_sample_empties_store(sample_a: Vec<Observation>) {
    let mut store = MemoryStore::new();
    {
        let mut engine = AggregationEngine::new(&mut store);
        engine.load_sample(source("A", sample_a.clone()), batch_size(2)).unwrap();
        let summary = engine.remove_sample("A", source("A", sample_a), batch_size(2)).unwrap();
        assert_eq!(summary.merged.deleted, 3);
    }
    assert!(store.is_empty());
    assert!(store.list().unwrap().is_empty());
}

#[rstest]
fn test_remove_unregistered_sample_is_not_found(sample_a: Vec<Observation>) {
    let mut store = MemoryStore::new();
    let mut engine = AggregationEngine::new(&mut store);

    let result = engine.remove_sample("A", source("A", sample_a), batch_size(10));
    assert!(matches!(result, Err(VarNoiseError::SampleNotFound(_))));
}

#[rstest]
fn test_unregistered_sample_is_not_found_before_source_check(sample_b: Vec<Observation>) {
    let mut store = MemoryStore::new();
    let mut engine = AggregationEngine::new(&mut store);

    let result = engine.remove_sample("A", source("B", sample_b), batch_size(10));
    assert!(matches!(result, Err(VarNoiseError::SampleNotFound(_))));
    assert!(!store.in_transaction());
}

#[rstest]
fn test_remove_with_wrong_source_is_invalid(sample_a: Vec<Observation>, sample_b: Vec<Observation>) {
    let mut store = MemoryStore::new();
    let mut engine = AggregationEngine::new(&mut store);
    engine.load_sample(source("A", sample_a), batch_size(10)).unwrap();

    let result = engine.remove_sample("A", source("B", sample_b), batch_size(10));
    assert!(matches!(result, Err(VarNoiseError::InvalidState(_))));
}

#[rstest]
fn test_zero_depth_is_skipped() {
    let mut store = MemoryStore::new();
    let mut engine = AggregationEngine::new(&mut store);

    engine
        .load_sample(source("A", vec![obs(100, "A", 0.1, 10)]), batch_size(10))
        .unwrap();
    let summary = engine
        .load_sample(
            source("B", vec![Observation::from_read_counts(VariantKey::new("chr1", 100), "B", 0, 0)]),
            batch_size(10),
        )
        .unwrap();
    assert_eq!(summary.skipped, 1);

    let record = engine.query(&VariantKey::new("chr1", 100)).unwrap();
    assert_eq!(record.count(), 1);
    assert_eq!(record.total_depth, 10);
}

#[rstest]
fn test_query_missing_key_is_not_found() {
    let mut store = MemoryStore::new();
    let engine = AggregationEngine::new(&mut store);

    let err = engine.query(&VariantKey::new("chr9", 1)).unwrap_err();
    assert!(err.is_not_found());
}

#[rstest]
fn test_replace_sample(sample_a: Vec<Observation>) {
    let mut store = MemoryStore::new();
    let mut engine = AggregationEngine::new(&mut store);
    engine.load_sample(source("A", sample_a.clone()), batch_size(10)).unwrap();

    let replacement = ObservationList::new("A", "A.v2.g.vcf", vec![obs(100, "A", 0.3, 30)]);
    let (removed, loaded) = engine
        .replace_sample(source("A", sample_a), replacement, batch_size(10))
        .unwrap();
    assert_eq!(removed.merged.deleted, 3);
    assert_eq!(loaded.merged.inserted, 1);

    let records = engine.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].mean(), 0.3);
    assert_eq!(engine.samples().unwrap()[0].source_path, "A.v2.g.vcf");
}

/// Memory store whose writes start failing after a number of successful batches.
struct FlakyStore {
    inner: MemoryStore,
    writes_left: usize,
}

impl AggregateStore for FlakyStore {
    fn batch_get(&self, keys: &[VariantKey]) -> StoreResult<HashMap<VariantKey, AggregateRecord>> {
        self.inner.batch_get(keys)
    }

    fn batch_write(&mut self, writes: &WriteSet) -> StoreResult<()> {
        if self.writes_left == 0 {
            return Err(StoreError::Transaction("connection lost".to_string()));
        }
        self.writes_left -= 1;
        self.inner.batch_write(writes)
    }

    fn scan(&self) -> StoreResult<Vec<AggregateRecord>> {
        self.inner.scan()
    }
}

impl SampleRegistry for FlakyStore {
    fn lookup(&self, name: &str) -> StoreResult<Option<SampleEntry>> {
        self.inner.lookup(name)
    }

    fn register(&mut self, entry: &SampleEntry) -> StoreResult<()> {
        self.inner.register(entry)
    }

    fn unregister(&mut self, name: &str) -> StoreResult<()> {
        self.inner.unregister(name)
    }

    fn list(&self) -> StoreResult<Vec<SampleEntry>> {
        self.inner.list()
    }
}

impl Transactional for FlakyStore {
    fn begin_transaction(&mut self) -> StoreResult<()> {
        self.inner.begin_transaction()
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> StoreResult<()> {
        self.inner.rollback()
    }
}

#[rstest]
fn test_failure_mid_load_rolls_back(sample_a: Vec<Observation>, sample_b: Vec<Observation>) {
    let mut store = FlakyStore {
        inner: MemoryStore::new(),
        writes_left: 1,
    };
    {
        let mut engine = AggregationEngine::new(&mut store);
        engine.load_sample(source("A", sample_a), batch_size(10)).unwrap();
    }
    let before = store.scan().unwrap();

    store.writes_left = 1;
    {
        let mut engine = AggregationEngine::new(&mut store);
        // two batches: the first write succeeds, the second fails
        let result = engine.load_sample(source("B", sample_b), batch_size(1));
        assert!(matches!(result, Err(VarNoiseError::Store(_))));
    }

    assert_eq!(store.scan().unwrap(), before);
    assert!(!store.exists("B").unwrap());
    assert!(!store.inner.in_transaction());
}

#[rstest]
fn test_source_error_rolls_back() {
    struct Broken {
        yielded: bool,
    }

    impl Iterator for Broken {
        type Item = varnoise_core::Result<Observation>;

        fn next(&mut self) -> Option<Self::Item> {
            if self.yielded {
                return Some(Err(VarNoiseError::source(std::io::Error::other("truncated gzip"))));
            }
            self.yielded = true;
            Some(Ok(obs(1, "A", 0.5, 10)))
        }
    }

    impl varnoise_core::RecordSource for Broken {
        fn sample_name(&self) -> &str {
            "A"
        }

        fn source_path(&self) -> &str {
            "A.g.vcf.gz"
        }
    }

    let mut store = MemoryStore::new();
    {
        let mut engine = AggregationEngine::new(&mut store);
        let result = engine.load_sample(Broken { yielded: false }, batch_size(1));
        assert!(matches!(result, Err(VarNoiseError::Source(_))));
    }
    assert!(store.is_empty());
    assert!(!store.exists("A").unwrap());
}
