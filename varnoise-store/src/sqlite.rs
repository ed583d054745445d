//! SQLite backend.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Row, Statement, params, params_from_iter,
};

use varnoise_core::store::StoreResult;
use varnoise_core::{
    AggregateRecord, AggregateStore, Extremum, SampleEntry, SampleRegistry, StoreError,
    Transactional, VariantKey, WriteSet,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS variants (
    chrom TEXT NOT NULL,
    pos INTEGER NOT NULL,
    sample_count INTEGER NOT NULL,
    mean_af REAL NOT NULL,
    sd_af REAL NOT NULL,
    total_depth INTEGER NOT NULL,
    max_af REAL,
    max_sample TEXT,
    min_af REAL,
    min_sample TEXT,
    PRIMARY KEY (chrom, pos)
);
CREATE INDEX IF NOT EXISTS idx_variants_chrom_pos ON variants (chrom, pos);
CREATE TABLE IF NOT EXISTS samples (
    name TEXT PRIMARY KEY,
    source_path TEXT NOT NULL,
    loaded_at TEXT NOT NULL
);
";

/// Keys per `batch_get` statement, two bound parameters each.
const KEYS_PER_QUERY: usize = 500;

const RECORD_COLUMNS: &str =
    "chrom, pos, sample_count, mean_af, sd_af, total_depth, max_af, max_sample, min_af, min_sample";

/// SQLite-backed aggregate store and sample registry.
pub struct SqliteStore {
    conn: Connection,
    in_transaction: bool,
}

impl SqliteStore {
    /// Create or open a database at the given file path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(StoreError::backend)?;
        info!("Opened sqlite database at {}", path.display());
        SqliteStore::with_connection(conn)
    }

    /// Create an in-memory database, mostly for testing.
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().map_err(StoreError::backend)?;
        SqliteStore::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        let store = SqliteStore {
            conn,
            in_transaction: false,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create tables and indices if they are missing. Safe to call repeatedly.
    pub fn init_schema(&self) -> StoreResult<()> {
        self.conn
            .execute_batch(SCHEMA)
            .map_err(StoreError::backend)
    }

    fn apply_writes(&self, writes: &WriteSet) -> StoreResult<()> {
        let mut insert = self
            .conn
            .prepare_cached(&format!(
                "INSERT INTO variants ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                RECORD_COLUMNS
            ))
            .map_err(StoreError::backend)?;
        for record in &writes.inserts {
            execute_record(&mut insert, record)?;
        }

        let mut update = self
            .conn
            .prepare_cached(
                "UPDATE variants SET sample_count = ?3, mean_af = ?4, sd_af = ?5, total_depth = ?6,
                 max_af = ?7, max_sample = ?8, min_af = ?9, min_sample = ?10
                 WHERE chrom = ?1 AND pos = ?2",
            )
            .map_err(StoreError::backend)?;
        for record in &writes.updates {
            if execute_record(&mut update, record)? == 0 {
                return Err(StoreError::Conflict(format!("update of missing key {}", record.key)));
            }
        }

        let mut delete = self
            .conn
            .prepare_cached("DELETE FROM variants WHERE chrom = ?1 AND pos = ?2")
            .map_err(StoreError::backend)?;
        for key in &writes.deletes {
            delete
                .execute(params![key.chrom, to_sql_int(key.pos)?])
                .map_err(StoreError::backend)?;
        }

        Ok(())
    }
}

fn to_sql_int(value: u64) -> StoreResult<i64> {
    i64::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{} does not fit an sqlite integer", value)))
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Bind a record to an insert or update statement laid out as [`RECORD_COLUMNS`].
fn execute_record(stmt: &mut Statement<'_>, record: &AggregateRecord) -> StoreResult<usize> {
    let max = record.max();
    let min = record.min();

    stmt.execute(params![
        record.key.chrom,
        to_sql_int(record.key.pos)?,
        record.count(),
        record.mean(),
        record.std_dev(),
        to_sql_int(record.total_depth)?,
        max.map(|e| e.value),
        max.map(|e| e.sample.as_str()),
        min.map(|e| e.value),
        min.map(|e| e.sample.as_str()),
    ])
    .map_err(|e| {
        if is_constraint_violation(&e) {
            StoreError::Conflict(format!("insert of existing key {}", record.key))
        } else {
            StoreError::backend(e)
        }
    })
}

fn extremum(value: Option<f64>, sample: Option<String>) -> Option<Extremum> {
    match (value, sample) {
        (Some(value), Some(sample)) => Some(Extremum { value, sample }),
        _ => None,
    }
}

fn record_from_row(row: &Row) -> rusqlite::Result<(AggregateRecord, i64, i64, i64)> {
    let chrom: String = row.get(0)?;
    let pos: i64 = row.get(1)?;
    let count: i64 = row.get(2)?;
    let total_depth: i64 = row.get(5)?;

    let record = AggregateRecord::from_parts(
        VariantKey::new(chrom, pos.max(0) as u64),
        count.clamp(0, u32::MAX as i64) as u32,
        row.get(3)?,
        row.get(4)?,
        total_depth.max(0) as u64,
        extremum(row.get(6)?, row.get(7)?),
        extremum(row.get(8)?, row.get(9)?),
    );
    Ok((record, pos, count, total_depth))
}

/// Reject rows no engine write could have produced.
fn checked(row: (AggregateRecord, i64, i64, i64)) -> StoreResult<AggregateRecord> {
    let (record, pos, count, total_depth) = row;
    if pos < 0 || count < 1 || count > u32::MAX as i64 || total_depth < 0 {
        return Err(StoreError::Corrupt(format!(
            "row {}:{} has sample_count {} and total_depth {}",
            record.key.chrom, pos, count, total_depth
        )));
    }
    Ok(record)
}

impl AggregateStore for SqliteStore {
    fn batch_get(&self, keys: &[VariantKey]) -> StoreResult<HashMap<VariantKey, AggregateRecord>> {
        let mut found = HashMap::with_capacity(keys.len());

        for chunk in keys.chunks(KEYS_PER_QUERY) {
            let placeholders = vec!["(?, ?)"; chunk.len()].join(", ");
            let mut stmt = self
                .conn
                .prepare_cached(&format!(
                    "SELECT {} FROM variants WHERE (chrom, pos) IN (VALUES {})",
                    RECORD_COLUMNS, placeholders
                ))
                .map_err(StoreError::backend)?;

            let mut bound = Vec::with_capacity(chunk.len() * 2);
            for key in chunk {
                bound.push(Value::Text(key.chrom.clone()));
                bound.push(Value::Integer(to_sql_int(key.pos)?));
            }

            let rows = stmt
                .query_map(params_from_iter(bound.iter()), record_from_row)
                .map_err(StoreError::backend)?;
            for row in rows {
                let record = checked(row.map_err(StoreError::backend)?)?;
                found.insert(record.key.clone(), record);
            }
        }

        Ok(found)
    }

    fn batch_write(&mut self, writes: &WriteSet) -> StoreResult<()> {
        if writes.is_empty() {
            return Ok(());
        }
        debug!("Writing {} rows", writes.len());

        if self.in_transaction {
            return self.apply_writes(writes);
        }

        // outside an engine transaction the batch still lands atomically
        self.begin_transaction()?;
        match self.apply_writes(writes) {
            Ok(()) => self.commit(),
            Err(err) => {
                self.rollback()?;
                Err(err)
            }
        }
    }

    fn scan(&self) -> StoreResult<Vec<AggregateRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM variants ORDER BY chrom, pos",
                RECORD_COLUMNS
            ))
            .map_err(StoreError::backend)?;

        let rows = stmt
            .query_map([], record_from_row)
            .map_err(StoreError::backend)?;

        rows.map(|row| row.map_err(StoreError::backend).and_then(checked))
            .collect()
    }
}

impl SampleRegistry for SqliteStore {
    fn lookup(&self, name: &str) -> StoreResult<Option<SampleEntry>> {
        self.conn
            .query_row(
                "SELECT name, source_path, loaded_at FROM samples WHERE name = ?1",
                params![name],
                |row| {
                    let loaded_at: DateTime<Utc> = row.get(2)?;
                    Ok(SampleEntry::new(
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        loaded_at,
                    ))
                },
            )
            .optional()
            .map_err(StoreError::backend)
    }

    fn register(&mut self, entry: &SampleEntry) -> StoreResult<()> {
        self.conn
            .execute(
                "INSERT INTO samples (name, source_path, loaded_at) VALUES (?1, ?2, ?3)",
                params![entry.name, entry.source_path, entry.loaded_at],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    StoreError::Conflict(format!("sample {} already registered", entry.name))
                } else {
                    StoreError::backend(e)
                }
            })?;
        Ok(())
    }

    fn unregister(&mut self, name: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM samples WHERE name = ?1", params![name])
            .map_err(StoreError::backend)?;
        Ok(())
    }

    fn list(&self) -> StoreResult<Vec<SampleEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, source_path, loaded_at FROM samples ORDER BY name")
            .map_err(StoreError::backend)?;

        let entries = stmt
            .query_map([], |row| {
                Ok(SampleEntry::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, DateTime<Utc>>(2)?,
                ))
            })
            .map_err(StoreError::backend)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::backend)?;

        Ok(entries)
    }
}

impl Transactional for SqliteStore {
    fn begin_transaction(&mut self) -> StoreResult<()> {
        if self.in_transaction {
            return Err(StoreError::Transaction("transaction already open".to_string()));
        }
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(StoreError::backend)?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        if !self.in_transaction {
            return Err(StoreError::Transaction("commit without open transaction".to_string()));
        }
        self.conn.execute_batch("COMMIT").map_err(StoreError::backend)?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        if !self.in_transaction {
            return Err(StoreError::Transaction("rollback without open transaction".to_string()));
        }
        self.in_transaction = false;
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(StoreError::backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn store() -> SqliteStore {
        SqliteStore::in_memory().unwrap()
    }

    fn record(pos: u64) -> AggregateRecord {
        AggregateRecord::from_parts(
            VariantKey::new("chr1", pos),
            3,
            0.15,
            0.04,
            45,
            Some(Extremum::new(0.2, "B")),
            Some(Extremum::new(0.1, "A")),
        )
    }

    #[rstest]
    fn test_insert_and_get(mut store: SqliteStore) {
        store
            .batch_write(&WriteSet {
                inserts: vec![record(100)],
                ..Default::default()
            })
            .unwrap();

        let found = store
            .batch_get(&[VariantKey::new("chr1", 100), VariantKey::new("chr1", 5)])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[&VariantKey::new("chr1", 100)], record(100));
    }

    #[rstest]
    fn test_batch_get_spans_several_statements(mut store: SqliteStore) {
        let stored: Vec<AggregateRecord> = (1..=1200).map(record).collect();
        store
            .batch_write(&WriteSet {
                inserts: stored,
                ..Default::default()
            })
            .unwrap();

        let keys: Vec<VariantKey> = (1..=1300).map(|pos| VariantKey::new("chr1", pos)).collect();
        let found = store.batch_get(&keys).unwrap();

        assert_eq!(found.len(), 1200);
        assert_eq!(found[&VariantKey::new("chr1", 1200)], record(1200));
        assert!(!found.contains_key(&VariantKey::new("chr1", 1201)));
    }

    #[rstest]
    fn test_null_extrema_round_trip(mut store: SqliteStore) {
        let mut lost = record(7);
        lost.extrema.max = None;
        lost.extrema.min = None;
        store
            .batch_write(&WriteSet {
                inserts: vec![lost.clone()],
                ..Default::default()
            })
            .unwrap();

        let found = store.get(&VariantKey::new("chr1", 7)).unwrap().unwrap();
        assert_eq!(found.max(), None);
        assert_eq!(found.min(), None);
        assert_eq!(found, lost);
    }

    #[rstest]
    fn test_update_and_delete(mut store: SqliteStore) {
        store
            .batch_write(&WriteSet {
                inserts: vec![record(1), record(2)],
                ..Default::default()
            })
            .unwrap();

        let mut changed = record(1);
        changed.total_depth = 60;
        store
            .batch_write(&WriteSet {
                updates: vec![changed.clone()],
                deletes: vec![VariantKey::new("chr1", 2)],
                ..Default::default()
            })
            .unwrap();

        assert_eq!(store.scan().unwrap(), vec![changed]);
    }

    #[rstest]
    fn test_failed_batch_write_is_atomic(mut store: SqliteStore) {
        store
            .batch_write(&WriteSet {
                inserts: vec![record(1)],
                ..Default::default()
            })
            .unwrap();

        let result = store.batch_write(&WriteSet {
            inserts: vec![record(2), record(1)],
            ..Default::default()
        });
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert_eq!(store.scan().unwrap().len(), 1);
    }

    #[rstest]
    fn test_scan_is_ordered(mut store: SqliteStore) {
        let mut other = record(1);
        other.key = VariantKey::new("chr10", 1);
        store
            .batch_write(&WriteSet {
                inserts: vec![record(200), other, record(3)],
                ..Default::default()
            })
            .unwrap();

        let keys: Vec<String> = store.scan().unwrap().iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["chr1:3", "chr1:200", "chr10:1"]);
    }

    #[rstest]
    fn test_registry(mut store: SqliteStore) {
        let entry = SampleEntry::new("A", "/data/a.g.vcf", Utc::now());
        store.register(&entry).unwrap();

        assert!(store.exists("A").unwrap());
        assert!(matches!(store.register(&entry), Err(StoreError::Conflict(_))));

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].source_path, "/data/a.g.vcf");
        assert_eq!(listed[0].loaded_at, entry.loaded_at);

        store.unregister("A").unwrap();
        assert_eq!(store.lookup("A").unwrap(), None);
    }

    #[rstest]
    fn test_rollback(mut store: SqliteStore) {
        store.begin_transaction().unwrap();
        store
            .batch_write(&WriteSet {
                inserts: vec![record(1)],
                ..Default::default()
            })
            .unwrap();
        store
            .register(&SampleEntry::new("A", "a.g.vcf", Utc::now()))
            .unwrap();
        store.rollback().unwrap();

        assert!(store.scan().unwrap().is_empty());
        assert!(!store.exists("A").unwrap());
    }
}
