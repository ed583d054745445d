//! Storage contracts the engine runs against.
//!
//! A backend provides three capabilities: keyed batch access to aggregate
//! records, the sample registry, and a transaction boundary spanning both.
//! Anything implementing all three is a [`Store`].

pub mod memory;

use std::collections::HashMap;

use crate::errors::StoreError;
use crate::models::{AggregateRecord, SampleEntry, VariantKey};

pub use self::memory::MemoryStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

///
/// Changes produced by one merged batch, applied with a single `batch_write`.
///
#[derive(PartialEq, Debug, Clone, Default)]
pub struct WriteSet {
    /// Records for keys that were absent before the batch.
    pub inserts: Vec<AggregateRecord>,
    /// Records that existed before the batch and still have contributors.
    pub updates: Vec<AggregateRecord>,
    /// Keys whose last contributor was removed.
    pub deletes: Vec<VariantKey>,
}

impl WriteSet {
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }
}

pub trait AggregateStore {
    ///
    /// Fetch the records stored for `keys`. Keys with no record are simply
    /// missing from the returned map.
    ///
    fn batch_get(&self, keys: &[VariantKey]) -> StoreResult<HashMap<VariantKey, AggregateRecord>>;

    ///
    /// Apply inserts, updates and deletes. Inside an open transaction the
    /// write only becomes durable on `commit`.
    ///
    fn batch_write(&mut self, writes: &WriteSet) -> StoreResult<()>;

    /// Every record, ordered by key.
    fn scan(&self) -> StoreResult<Vec<AggregateRecord>>;

    fn get(&self, key: &VariantKey) -> StoreResult<Option<AggregateRecord>> {
        let mut found = self.batch_get(std::slice::from_ref(key))?;
        Ok(found.remove(key))
    }
}

pub trait SampleRegistry {
    fn lookup(&self, name: &str) -> StoreResult<Option<SampleEntry>>;

    fn exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.lookup(name)?.is_some())
    }

    /// Add a sample. Names are unique: registering a known name is a `Conflict`.
    fn register(&mut self, entry: &SampleEntry) -> StoreResult<()>;

    fn unregister(&mut self, name: &str) -> StoreResult<()>;

    /// Every registered sample, ordered by name.
    fn list(&self) -> StoreResult<Vec<SampleEntry>>;
}

pub trait Transactional {
    fn begin_transaction(&mut self) -> StoreResult<()>;
    fn commit(&mut self) -> StoreResult<()>;
    fn rollback(&mut self) -> StoreResult<()>;
}

/// A complete backend.
pub trait Store: AggregateStore + SampleRegistry + Transactional {}

impl<T: AggregateStore + SampleRegistry + Transactional + ?Sized> Store for T {}
