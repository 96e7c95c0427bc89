//! Unit of work against a [`Database`].

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::change::Change;
use super::database::{duplicate_field, refers_to, relation_fields, Database};
use super::record::{Record, RecordKey};
use super::table::Rows;
use crate::error::ScaffoldError;
use crate::schema::{EntitySchema, FieldKind};

/// A transactional session.
///
/// Reads see the session's own writes. Writes stay private until
/// [`Session::commit`]; a session dropped while active rolls back.
#[derive(Debug)]
pub struct Session {
    db: Arc<Database>,
    /// Working copies of the tables written by this session
    working: HashMap<String, Arc<Rows>>,
    /// Change log replayed on commit
    changes: Vec<Change>,
    active: bool,
}

impl Session {
    pub(crate) fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            working: HashMap::new(),
            changes: Vec::new(),
            active: true,
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the session holds uncommitted writes.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    fn ensure_active(&self) -> Result<(), ScaffoldError> {
        if self.active {
            Ok(())
        } else {
            Err(ScaffoldError::SessionClosed)
        }
    }

    fn entity(&self, name: &str) -> Result<Arc<EntitySchema>, ScaffoldError> {
        Ok(Arc::clone(&self.db.table(name)?.schema))
    }

    /// Rows of a record type as this session sees them.
    fn rows(&self, entity: &str) -> Result<Arc<Rows>, ScaffoldError> {
        match self.working.get(entity) {
            Some(rows) => Ok(Arc::clone(rows)),
            None => Ok(self.db.table(entity)?.snapshot()),
        }
    }

    fn rows_mut(&mut self, entity: &str) -> Result<&mut Rows, ScaffoldError> {
        if !self.working.contains_key(entity) {
            let snapshot = self.db.table(entity)?.snapshot();
            self.working.insert(entity.to_string(), snapshot);
        }
        let rows = self
            .working
            .get_mut(entity)
            .ok_or_else(|| ScaffoldError::EntityNotFound {
                entity: entity.to_string(),
            })?;
        Ok(Arc::make_mut(rows))
    }

    /// Creates a record.
    ///
    /// # Arguments
    /// * `entity` - Record type name
    /// * `attributes` - Field values; omitted fields take their defaults
    ///
    /// # Returns
    /// `Result<Record, ScaffoldError>` holding the stored record with its key.
    pub fn insert(
        &mut self,
        entity: &str,
        attributes: Map<String, Value>,
    ) -> Result<Record, ScaffoldError> {
        self.ensure_active()?;
        let schema = self.entity(entity)?;
        let mut values = schema.prepare_values(attributes, None)?;
        let pk = schema.primary_key();

        let key = match values.get(&pk.name) {
            Some(Value::Null) | None => {
                let id = self.db.table(entity)?.next_id();
                RecordKey::Int(id)
            }
            Some(value) => {
                let key = self.key_for(&schema, value).ok_or_else(|| {
                    ScaffoldError::InvalidValue {
                        entity: entity.to_string(),
                        field: pk.name.clone(),
                        message: format!("{} is not a valid key", value),
                    }
                })?;
                if let RecordKey::Int(id) = key {
                    self.db.table(entity)?.observe_id(id);
                }
                key
            }
        };
        values.insert(pk.name.clone(), key.to_value());

        let rows = self.rows(entity)?;
        if rows.contains(&key) {
            return Err(ScaffoldError::UniqueViolation {
                entity: entity.to_string(),
                field: pk.name.clone(),
                value: key.to_string(),
            });
        }
        check_unique(&schema, &rows, &values, None)?;
        drop(rows);
        self.resolve_references(&schema, &mut values)?;

        self.rows_mut(entity)?
            .records
            .insert(key.clone(), values.clone());
        self.changes.push(Change::Create {
            entity: entity.to_string(),
            key: key.clone(),
            values: values.clone(),
        });

        tracing::debug!("Staged create of {}[{}]", entity, key);
        Ok(Record {
            entity: entity.to_string(),
            key,
            values,
        })
    }

    /// Reads a record by key.
    pub fn get(&self, entity: &str, key: &RecordKey) -> Result<Option<Record>, ScaffoldError> {
        self.ensure_active()?;
        Ok(self.rows(entity)?.record(entity, key))
    }

    /// Reads every record of a type in key order.
    pub fn select(&self, entity: &str) -> Result<Vec<Record>, ScaffoldError> {
        self.ensure_active()?;
        let rows = self.rows(entity)?;
        Ok(rows
            .iter()
            .map(|(key, values)| Record {
                entity: entity.to_string(),
                key: key.clone(),
                values: values.clone(),
            })
            .collect())
    }

    /// Finds the first record whose fields equal every value in `condition`.
    pub fn find(
        &self,
        entity: &str,
        condition: &Map<String, Value>,
    ) -> Result<Option<Record>, ScaffoldError> {
        self.ensure_active()?;
        let schema = self.entity(entity)?;
        for name in condition.keys() {
            if schema.field(name).is_none() {
                return Err(ScaffoldError::FieldNotFound {
                    entity: entity.to_string(),
                    field: name.clone(),
                });
            }
        }

        let rows = self.rows(entity)?;
        let found = rows.iter().find(|(_, values)| {
            condition
                .iter()
                .all(|(name, expected)| values.get(name) == Some(expected))
        });
        Ok(found.map(|(key, values)| Record {
            entity: entity.to_string(),
            key: key.clone(),
            values: values.clone(),
        }))
    }

    /// Whether a record other than `exclude` holds `value` in `field`.
    pub fn exists_other(
        &self,
        entity: &str,
        field: &str,
        value: &Value,
        exclude: Option<&RecordKey>,
    ) -> Result<bool, ScaffoldError> {
        self.ensure_active()?;
        let schema = self.entity(entity)?;
        let descriptor = schema
            .field(field)
            .ok_or_else(|| ScaffoldError::FieldNotFound {
                entity: entity.to_string(),
                field: field.to_string(),
            })?;

        let rows = self.rows(entity)?;
        if descriptor.primary_key {
            return Ok(match self.key_for(&schema, value) {
                Some(key) => Some(&key) != exclude && rows.contains(&key),
                None => false,
            });
        }
        let taken = rows
            .iter()
            .any(|(key, values)| Some(key) != exclude && values.get(field) == Some(value));
        Ok(taken)
    }

    /// Updates a record with the given field values.
    ///
    /// # Arguments
    /// * `entity` - Record type name
    /// * `key` - Key of the record to update
    /// * `attributes` - Field values to change
    ///
    /// # Returns
    /// `Result<Record, ScaffoldError>` holding the updated record.
    pub fn update(
        &mut self,
        entity: &str,
        key: &RecordKey,
        attributes: Map<String, Value>,
    ) -> Result<Record, ScaffoldError> {
        self.ensure_active()?;
        let schema = self.entity(entity)?;
        let rows = self.rows(entity)?;
        let existing = rows.get(key).ok_or_else(|| not_found(entity, key))?;

        let pk = schema.primary_key();
        if let Some(value) = attributes.get(&pk.name) {
            if self.key_for(&schema, value).as_ref() != Some(key) {
                return Err(ScaffoldError::PrimaryKeyChange {
                    entity: entity.to_string(),
                });
            }
        }

        let mut values = schema.prepare_values(attributes, Some(existing))?;
        values.insert(pk.name.clone(), key.to_value());
        check_unique(&schema, &rows, &values, Some(key))?;
        drop(rows);
        self.resolve_references(&schema, &mut values)?;

        self.rows_mut(entity)?
            .records
            .insert(key.clone(), values.clone());
        self.changes.push(Change::Update {
            entity: entity.to_string(),
            key: key.clone(),
            values: values.clone(),
        });

        tracing::debug!("Staged update of {}[{}]", entity, key);
        Ok(Record {
            entity: entity.to_string(),
            key: key.clone(),
            values,
        })
    }

    /// Deletes a record.
    ///
    /// Fails with `Conflict` while another record still refers to it.
    pub fn delete(&mut self, entity: &str, key: &RecordKey) -> Result<(), ScaffoldError> {
        self.ensure_active()?;
        if !self.rows(entity)?.contains(key) {
            return Err(not_found(entity, key));
        }
        self.check_not_referenced(entity, key)?;

        self.rows_mut(entity)?.records.remove(key);
        self.changes.push(Change::Delete {
            entity: entity.to_string(),
            key: key.clone(),
        });

        tracing::debug!("Staged delete of {}[{}]", entity, key);
        Ok(())
    }

    /// Commits the staged changes and closes the session.
    ///
    /// The session is closed even when the commit fails; its changes are
    /// then discarded.
    pub fn commit(&mut self) -> Result<(), ScaffoldError> {
        self.ensure_active()?;
        self.active = false;
        self.working.clear();
        let changes = std::mem::take(&mut self.changes);
        if changes.is_empty() {
            return Ok(());
        }

        match self.db.apply(&changes) {
            Ok(()) => {
                tracing::debug!("Committed {} changes", changes.len());
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Commit failed: {}", e);
                Err(e)
            }
        }
    }

    /// Discards the staged changes and closes the session.
    pub fn rollback(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.working.clear();
        if !self.changes.is_empty() {
            tracing::debug!("Rolled back {} changes", self.changes.len());
            self.changes.clear();
        }
    }

    /// Reads a key value for `schema`'s primary key kind.
    fn key_for(&self, schema: &EntitySchema, value: &Value) -> Option<RecordKey> {
        match value {
            Value::String(raw) => RecordKey::parse(raw, schema.key_kind()),
            other => RecordKey::from_value(other),
        }
    }

    /// Checks that every reference and collection item names a stored
    /// record, normalizing the stored key values.
    fn resolve_references(
        &self,
        schema: &EntitySchema,
        values: &mut Map<String, Value>,
    ) -> Result<(), ScaffoldError> {
        for field in schema.fields() {
            let Some(target) = field.kind.target() else {
                continue;
            };
            let Some(value) = values.get_mut(&field.name) else {
                continue;
            };
            let target_schema = self.entity(target)?;
            let rows = self.rows(target)?;

            let resolve = |item: &mut Value| -> Result<(), ScaffoldError> {
                match self.key_for(&target_schema, item) {
                    Some(key) if rows.contains(&key) => {
                        *item = key.to_value();
                        Ok(())
                    }
                    _ => Err(ScaffoldError::ReferenceNotFound {
                        entity: schema.name().to_string(),
                        field: field.name.clone(),
                        target: target.to_string(),
                        key: item.to_string(),
                    }),
                }
            };

            match (&field.kind, value) {
                (_, Value::Null) => {}
                (FieldKind::Collection(_), Value::Array(items)) => {
                    for item in items.iter_mut() {
                        resolve(item)?;
                    }
                }
                (_, item) => resolve(item)?,
            }
        }
        Ok(())
    }

    fn check_not_referenced(&self, entity: &str, key: &RecordKey) -> Result<(), ScaffoldError> {
        let key_value = key.to_value();
        for (other, field) in relation_fields(self.db.schema(), entity) {
            let other_rows = self.rows(other.name())?;
            if refers_to(&other_rows, &field.name, &key_value) {
                return Err(ScaffoldError::Conflict(format!(
                    "{}[{}] is referenced by {}.{}",
                    entity,
                    key,
                    other.name(),
                    field.name
                )));
            }
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.active {
            self.rollback();
        }
    }
}

fn check_unique(
    schema: &EntitySchema,
    rows: &Rows,
    values: &Map<String, Value>,
    exclude: Option<&RecordKey>,
) -> Result<(), ScaffoldError> {
    match duplicate_field(schema, rows, values, exclude) {
        Some((field, value)) => Err(ScaffoldError::UniqueViolation {
            entity: schema.name().to_string(),
            field: field.name.clone(),
            value: match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }),
        None => Ok(()),
    }
}

fn not_found(entity: &str, key: &RecordKey) -> ScaffoldError {
    ScaffoldError::RecordNotFound {
        entity: entity.to_string(),
        key: key.to_string(),
    }
}
