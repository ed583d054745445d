//! # varnoise core
//!
//! Incremental aggregation of per-sample allele fractions into per-position
//! statistics: count, mean, population standard deviation, attributed max and
//! min, and total depth.
//!
//! - [`stats`]: online mean/std-dev update and its exact inverse
//! - [`extremum`]: max/min with sample attribution
//! - [`merger`]: folds one batch of observations into stored records
//! - [`engine`]: sample-level load/remove inside a transaction
//! - [`store`]: storage contracts and an in-memory backend
//!
//! # Example
//!
//! ```
//! use std::num::NonZeroUsize;
//! use varnoise_core::{AggregationEngine, MemoryStore, Observation, ObservationList, VariantKey};
//!
//! let mut store = MemoryStore::new();
//! let mut engine = AggregationEngine::new(&mut store);
//!
//! let observations = vec![Observation::new(VariantKey::new("chr1", 100), "s1", 0.25, 40)];
//! let source = ObservationList::new("s1", "s1.g.vcf", observations);
//! engine.load_sample(source, NonZeroUsize::new(1000).unwrap()).unwrap();
//!
//! let record = engine.query(&VariantKey::new("chr1", 100)).unwrap();
//! assert_eq!(record.count(), 1);
//! ```

pub mod engine;
pub mod errors;
pub mod extremum;
pub mod merger;
pub mod models;
pub mod source;
pub mod stats;
pub mod store;

// re-exports
pub use engine::{AggregationEngine, DEFAULT_BATCH_SIZE, SampleSummary};
pub use errors::{Result, StoreError, VarNoiseError};
pub use extremum::{Extremum, ExtremumTracker};
pub use merger::{BatchMerger, Direction, MergeSummary};
pub use models::{AggregateRecord, Observation, SampleEntry, VariantKey};
pub use source::{Batches, ObservationList, RecordSource};
pub use stats::RunningStats;
pub use store::{AggregateStore, MemoryStore, SampleRegistry, Store, Transactional, WriteSet};
