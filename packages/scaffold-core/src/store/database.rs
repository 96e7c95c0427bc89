//! Database container owning one table per record type.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};

use super::change::Change;
use super::record::RecordKey;
use super::session::Session;
use super::table::{Rows, Table};
use crate::config::{ConnectionParams, DbConfig, MEMORY_DB_NAME};
use crate::error::ScaffoldError;
use crate::persistence::{SnapshotFile, SnapshotStore, TableSnapshot, SNAPSHOT_VERSION};
use crate::schema::{EntitySchema, FieldDescriptor, Schema};

/// Schema-first record store.
///
/// Tables are fixed when the database is opened. Sessions stage their
/// writes privately and replay them here on commit.
#[derive(Debug)]
pub struct Database {
    /// Record types served by this database
    schema: Arc<Schema>,
    /// Map of record type name to table
    tables: HashMap<String, Table>,
    /// Serializes commits
    commit_lock: Mutex<()>,
    /// Snapshot file, when the database is file-backed
    snapshots: Option<SnapshotStore>,
}

impl Database {
    /// Creates an empty in-memory database.
    pub fn memory(schema: Schema) -> Self {
        let tables = schema
            .entities()
            .iter()
            .map(|entity| (entity.name().to_string(), Table::new(Arc::clone(entity))))
            .collect();

        Self {
            schema: Arc::new(schema),
            tables,
            commit_lock: Mutex::new(()),
            snapshots: None,
        }
    }

    /// Opens a database as described by `config`.
    ///
    /// # Arguments
    /// * `schema` - Record types to serve
    /// * `config` - Database kind and connection settings
    ///
    /// # Returns
    /// `Result<Database, ScaffoldError>`; only the embedded engine can be
    /// opened, client/server kinds fail with `UnsupportedProvider`.
    pub fn open(schema: Schema, config: &DbConfig) -> Result<Self, ScaffoldError> {
        match config.connection() {
            ConnectionParams::Sqlite { filename, .. } if filename == MEMORY_DB_NAME => {
                tracing::info!("Opening in-memory database");
                Ok(Self::memory(schema))
            }
            ConnectionParams::Sqlite {
                filename,
                create_db,
            } => {
                let path = PathBuf::from(filename);
                if !create_db && !path.exists() {
                    return Err(ScaffoldError::IoError(format!(
                        "database file {} does not exist",
                        path.display()
                    )));
                }
                Self::with_snapshot_file(schema, path)
            }
            _ => Err(ScaffoldError::UnsupportedProvider(config.kind.to_string())),
        }
    }

    /// Opens a file-backed database, loading existing rows from `path`.
    pub fn with_snapshot_file(
        schema: Schema,
        path: impl Into<PathBuf>,
    ) -> Result<Self, ScaffoldError> {
        let store = SnapshotStore::new(path);
        let mut database = Self::memory(schema);

        if let Some(snapshot) = store.load()? {
            database.restore(snapshot)?;
        }

        tracing::info!(
            "Opened database file {} ({} tables)",
            store.path().display(),
            database.tables.len()
        );
        database.snapshots = Some(store);
        Ok(database)
    }

    fn restore(&mut self, snapshot: SnapshotFile) -> Result<(), ScaffoldError> {
        for (name, table_snapshot) in snapshot.tables {
            let entity = self.schema.entity(&name).map_err(|_| {
                ScaffoldError::DataCorruption(format!("snapshot holds unknown record type '{}'", name))
            })?;
            let pk = entity.primary_key().name.clone();

            let mut rows = Rows::default();
            let mut next_id = table_snapshot.next_id;
            for values in table_snapshot.records {
                let key = values
                    .get(&pk)
                    .and_then(RecordKey::from_value)
                    .ok_or_else(|| {
                        ScaffoldError::DataCorruption(format!(
                            "record of '{}' without a usable '{}' key",
                            name, pk
                        ))
                    })?;
                if let RecordKey::Int(id) = key {
                    next_id = next_id.max(id.saturating_add(1));
                }
                rows.records.insert(key, values);
            }

            tracing::debug!("Restored {} records of {}", rows.len(), name);
            let table = Table::with_rows(Arc::clone(entity), rows, next_id);
            self.tables.insert(name, table);
        }
        Ok(())
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Looks up the table of a record type.
    pub fn table(&self, name: &str) -> Result<&Table, ScaffoldError> {
        self.tables
            .get(name)
            .ok_or_else(|| ScaffoldError::EntityNotFound {
                entity: name.to_string(),
            })
    }

    /// Whether commits are written to a snapshot file.
    pub fn is_persistent(&self) -> bool {
        self.snapshots.is_some()
    }

    /// Opens a new unit of work.
    pub fn session(self: &Arc<Self>) -> Session {
        Session::new(Arc::clone(self))
    }

    /// Replays a session's change log onto the latest snapshots.
    ///
    /// Nothing is published unless every change applies and, for a
    /// file-backed database, the snapshot file was written.
    pub(crate) fn apply(&self, changes: &[Change]) -> Result<(), ScaffoldError> {
        let _guard = self.commit_lock.lock();

        let mut staged: HashMap<&str, Rows> = HashMap::new();
        for change in changes {
            let table = self.table(change.entity())?;
            let rows = staged
                .entry(table.name())
                .or_insert_with(|| (*table.snapshot()).clone());

            match change {
                Change::Create { key, values, .. } => {
                    if rows.contains(key) {
                        return Err(conflict(table.name(), key, "already exists"));
                    }
                    check_unique_committed(&table.schema, rows, values, key)?;
                    rows.records.insert(key.clone(), values.clone());
                }
                Change::Update { key, values, .. } => {
                    if !rows.contains(key) {
                        return Err(conflict(table.name(), key, "no longer exists"));
                    }
                    check_unique_committed(&table.schema, rows, values, key)?;
                    rows.records.insert(key.clone(), values.clone());
                }
                Change::Delete { key, .. } => {
                    if rows.records.remove(key).is_none() {
                        return Err(conflict(table.name(), key, "no longer exists"));
                    }
                }
            }
        }

        self.check_relations(changes, &staged)?;

        if let Some(store) = &self.snapshots {
            store.save(&self.snapshot_file(&staged))?;
        }

        for (name, rows) in staged {
            if let Some(table) = self.tables.get(name) {
                table.publish(rows);
            }
        }
        Ok(())
    }

    /// Checks the replayed state for relations broken by a commit that
    /// landed after this session read its rows.
    fn check_relations(
        &self,
        changes: &[Change],
        staged: &HashMap<&str, Rows>,
    ) -> Result<(), ScaffoldError> {
        for change in changes {
            match change {
                Change::Create { entity, key, .. } | Change::Update { entity, key, .. } => {
                    let Some(values) = staged.get(entity.as_str()).and_then(|rows| rows.get(key))
                    else {
                        continue;
                    };
                    let schema = &self.table(entity)?.schema;
                    for field in schema.fields() {
                        let Some(target) = field.kind.target() else {
                            continue;
                        };
                        let items: Vec<&Value> = match values.get(&field.name) {
                            Some(Value::Array(items)) => items.iter().collect(),
                            Some(Value::Null) | None => Vec::new(),
                            Some(item) => vec![item],
                        };
                        for item in items {
                            let present = match RecordKey::from_value(item) {
                                Some(target_key) => self
                                    .with_rows(staged, target, |rows| rows.contains(&target_key))?,
                                None => false,
                            };
                            if !present {
                                return Err(ScaffoldError::Conflict(format!(
                                    "{}[{}].{} refers to {}[{}] which was deleted by another session",
                                    entity, key, field.name, target, item
                                )));
                            }
                        }
                    }
                }
                Change::Delete { entity, key } => {
                    if staged
                        .get(entity.as_str())
                        .is_some_and(|rows| rows.contains(key))
                    {
                        continue;
                    }
                    let key_value = key.to_value();
                    for (other, field) in relation_fields(&self.schema, entity) {
                        if self.with_rows(staged, other.name(), |rows| {
                            refers_to(rows, &field.name, &key_value)
                        })? {
                            return Err(ScaffoldError::Conflict(format!(
                                "{}[{}] was referenced by {}.{} in another session",
                                entity,
                                key,
                                other.name(),
                                field.name
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Runs `f` on the staged rows of `name`, or on its published rows.
    fn with_rows<R>(
        &self,
        staged: &HashMap<&str, Rows>,
        name: &str,
        f: impl FnOnce(&Rows) -> R,
    ) -> Result<R, ScaffoldError> {
        match staged.get(name) {
            Some(rows) => Ok(f(rows)),
            None => Ok(f(&*self.table(name)?.snapshot())),
        }
    }

    fn snapshot_file(&self, staged: &HashMap<&str, Rows>) -> SnapshotFile {
        let mut file = SnapshotFile {
            version: SNAPSHOT_VERSION,
            ..Default::default()
        };
        for (name, table) in &self.tables {
            let current;
            let rows = match staged.get(name.as_str()) {
                Some(rows) => rows,
                None => {
                    current = table.snapshot();
                    &*current
                }
            };
            file.tables.insert(
                name.clone(),
                TableSnapshot {
                    next_id: table.current_next_id(),
                    records: rows.iter().map(|(_, values)| values.clone()).collect(),
                },
            );
        }
        file
    }
}

/// Reference and collection fields of every record type that target `entity`.
pub(crate) fn relation_fields<'a>(
    schema: &'a Schema,
    entity: &'a str,
) -> impl Iterator<Item = (&'a EntitySchema, &'a FieldDescriptor)> + 'a {
    schema.entities().iter().flat_map(move |other| {
        other
            .fields()
            .iter()
            .filter(move |field| field.kind.target() == Some(entity))
            .map(move |field| (&**other, field))
    })
}

/// Whether any row holds `key` in the relation `field`, either as the
/// referenced key or as a collection item.
pub(crate) fn refers_to(rows: &Rows, field: &str, key: &Value) -> bool {
    rows.iter().any(|(_, values)| match values.get(field) {
        Some(Value::Array(items)) => items.contains(key),
        Some(value) => value == key,
        None => false,
    })
}

/// Finds a unique field whose value is already held by another row.
pub(crate) fn duplicate_field<'a>(
    schema: &'a EntitySchema,
    rows: &Rows,
    values: &'a Map<String, Value>,
    exclude: Option<&RecordKey>,
) -> Option<(&'a FieldDescriptor, &'a Value)> {
    schema
        .fields()
        .iter()
        .filter(|field| field.unique && !field.primary_key)
        .filter_map(|field| {
            values
                .get(&field.name)
                .filter(|value| !value.is_null())
                .map(|value| (field, value))
        })
        .find(|(field, value)| {
            rows.iter().any(|(key, other)| {
                Some(key) != exclude && other.get(&field.name) == Some(*value)
            })
        })
}

fn check_unique_committed(
    schema: &EntitySchema,
    rows: &Rows,
    values: &Map<String, Value>,
    key: &RecordKey,
) -> Result<(), ScaffoldError> {
    match duplicate_field(schema, rows, values, Some(key)) {
        Some((field, value)) => Err(ScaffoldError::Conflict(format!(
            "{}.{} value {} was committed by another session",
            schema.name(),
            field.name,
            value
        ))),
        None => Ok(()),
    }
}

fn conflict(entity: &str, key: &RecordKey, what: &str) -> ScaffoldError {
    ScaffoldError::Conflict(format!("{}[{}] {}", entity, key, what))
}
