//! Record table with copy-on-write snapshots published through ArcSwap.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::{Map, Value};

use super::record::{Record, RecordKey};
use crate::schema::EntitySchema;

/// Immutable set of rows, keyed and ordered by primary key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows {
    pub(crate) records: BTreeMap<RecordKey, Map<String, Value>>,
}

impl Rows {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &RecordKey) -> Option<&Map<String, Value>> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.records.contains_key(key)
    }

    /// Rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &Map<String, Value>)> {
        self.records.iter()
    }

    pub(crate) fn record(&self, entity: &str, key: &RecordKey) -> Option<Record> {
        self.records.get(key).map(|values| Record {
            entity: entity.to_string(),
            key: key.clone(),
            values: values.clone(),
        })
    }
}

/// Table of one record type.
///
/// Readers load the current snapshot without locking; writers publish a new
/// snapshot as a whole.
#[derive(Debug)]
pub struct Table {
    /// Record type stored in this table
    pub schema: Arc<EntitySchema>,
    /// Published rows
    rows: ArcSwap<Rows>,
    /// Next auto-generated key, never rolled back
    sequence: AtomicI64,
}

impl Table {
    /// Creates an empty table.
    pub fn new(schema: Arc<EntitySchema>) -> Self {
        Self::with_rows(schema, Rows::default(), 1)
    }

    /// Creates a table holding `rows`, generating keys from `next_id`.
    pub fn with_rows(schema: Arc<EntitySchema>, rows: Rows, next_id: i64) -> Self {
        Self {
            schema,
            rows: ArcSwap::from_pointee(rows),
            sequence: AtomicI64::new(next_id.max(1)),
        }
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Current published snapshot.
    pub fn snapshot(&self) -> Arc<Rows> {
        self.rows.load_full()
    }

    /// Replaces the published snapshot.
    pub(crate) fn publish(&self, rows: Rows) {
        self.rows.store(Arc::new(rows));
    }

    /// Reserves the next auto-generated key.
    pub(crate) fn next_id(&self) -> i64 {
        self.sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Makes sure generated keys stay above an explicitly supplied key.
    pub(crate) fn observe_id(&self, id: i64) {
        self.sequence.fetch_max(id.saturating_add(1), Ordering::SeqCst);
    }

    /// Value the sequence will hand out next.
    pub fn current_next_id(&self) -> i64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub fn record_count(&self) -> usize {
        self.rows.load().len()
    }
}
