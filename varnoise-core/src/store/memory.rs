use std::collections::{BTreeMap, HashMap};

use crate::errors::StoreError;
use crate::models::{AggregateRecord, SampleEntry, VariantKey};
use crate::store::{AggregateStore, SampleRegistry, StoreResult, Transactional, WriteSet};

#[derive(Debug, Clone, Default)]
struct Snapshot {
    records: BTreeMap<VariantKey, AggregateRecord>,
    samples: BTreeMap<String, SampleEntry>,
}

///
/// Store kept entirely in memory.
///
/// `begin_transaction` snapshots the current contents and `rollback` restores
/// them, so it honours the same all-or-nothing contract as a database backend.
///
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<VariantKey, AggregateRecord>,
    samples: BTreeMap<String, SampleEntry>,
    snapshot: Option<Snapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl AggregateStore for MemoryStore {
    fn batch_get(&self, keys: &[VariantKey]) -> StoreResult<HashMap<VariantKey, AggregateRecord>> {
        Ok(keys
            .iter()
            .filter_map(|key| self.records.get(key).map(|r| (key.clone(), r.clone())))
            .collect())
    }

    fn batch_write(&mut self, writes: &WriteSet) -> StoreResult<()> {
        // validate first so a rejected write leaves nothing half applied
        for record in &writes.inserts {
            if self.records.contains_key(&record.key) {
                return Err(StoreError::Conflict(format!("insert of existing key {}", record.key)));
            }
        }
        for record in &writes.updates {
            if !self.records.contains_key(&record.key) {
                return Err(StoreError::Conflict(format!("update of missing key {}", record.key)));
            }
        }

        for record in writes.inserts.iter().chain(&writes.updates) {
            self.records.insert(record.key.clone(), record.clone());
        }
        for key in &writes.deletes {
            self.records.remove(key);
        }
        Ok(())
    }

    fn scan(&self) -> StoreResult<Vec<AggregateRecord>> {
        Ok(self.records.values().cloned().collect())
    }
}

impl SampleRegistry for MemoryStore {
    fn lookup(&self, name: &str) -> StoreResult<Option<SampleEntry>> {
        Ok(self.samples.get(name).cloned())
    }

    fn register(&mut self, entry: &SampleEntry) -> StoreResult<()> {
        if self.samples.contains_key(&entry.name) {
            return Err(StoreError::Conflict(format!("sample {} already registered", entry.name)));
        }
        self.samples.insert(entry.name.clone(), entry.clone());
        Ok(())
    }

    fn unregister(&mut self, name: &str) -> StoreResult<()> {
        self.samples.remove(name);
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<SampleEntry>> {
        Ok(self.samples.values().cloned().collect())
    }
}

impl Transactional for MemoryStore {
    fn begin_transaction(&mut self) -> StoreResult<()> {
        if self.snapshot.is_some() {
            return Err(StoreError::Transaction("transaction already open".to_string()));
        }
        self.snapshot = Some(Snapshot {
            records: self.records.clone(),
            samples: self.samples.clone(),
        });
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| StoreError::Transaction("commit without open transaction".to_string()))
    }

    fn rollback(&mut self) -> StoreResult<()> {
        let snapshot = self
            .snapshot
            .take()
            .ok_or_else(|| StoreError::Transaction("rollback without open transaction".to_string()))?;
        self.records = snapshot.records;
        self.samples = snapshot.samples;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn record() -> AggregateRecord {
        AggregateRecord::first(VariantKey::new("chr1", 100), 0.2, 10, "s1")
    }

    #[rstest]
    fn test_write_then_get(record: AggregateRecord) {
        let mut store = MemoryStore::new();
        store
            .batch_write(&WriteSet {
                inserts: vec![record.clone()],
                ..Default::default()
            })
            .unwrap();

        let found = store
            .batch_get(&[VariantKey::new("chr1", 100), VariantKey::new("chr1", 101)])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&record.key], record);
    }

    #[rstest]
    fn test_insert_existing_is_conflict(record: AggregateRecord) {
        let mut store = MemoryStore::new();
        let writes = WriteSet {
            inserts: vec![record],
            ..Default::default()
        };
        store.batch_write(&writes).unwrap();

        assert!(matches!(store.batch_write(&writes), Err(StoreError::Conflict(_))));
        assert_eq!(store.len(), 1);
    }

    #[rstest]
    fn test_rollback_restores_snapshot(record: AggregateRecord) {
        let mut store = MemoryStore::new();
        store.begin_transaction().unwrap();
        store
            .batch_write(&WriteSet {
                inserts: vec![record],
                ..Default::default()
            })
            .unwrap();
        store
            .register(&SampleEntry::new("s1", "s1.g.vcf", Utc::now()))
            .unwrap();
        store.rollback().unwrap();

        assert!(store.is_empty());
        assert!(!store.exists("s1").unwrap());
        assert!(!store.in_transaction());
    }

    #[rstest]
    fn test_commit_keeps_writes(record: AggregateRecord) {
        let mut store = MemoryStore::new();
        store.begin_transaction().unwrap();
        store
            .batch_write(&WriteSet {
                inserts: vec![record],
                ..Default::default()
            })
            .unwrap();
        store.commit().unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.commit().is_err());
    }

    #[rstest]
    fn test_register_is_unique() {
        let mut store = MemoryStore::new();
        let entry = SampleEntry::new("s1", "a.g.vcf", Utc::now());
        store.register(&entry).unwrap();

        assert!(matches!(store.register(&entry), Err(StoreError::Conflict(_))));
        store.unregister("s1").unwrap();
        assert!(!store.exists("s1").unwrap());
    }
}
