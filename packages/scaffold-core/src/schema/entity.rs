//! Record type and schema definitions.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::field::FieldDescriptor;
use super::kind::{FieldKind, ValueKind};
use crate::error::ScaffoldError;

/// Name of the primary key added when a record type declares none.
pub const IMPLICIT_PK: &str = "id";

/// Record type: a name and its ordered field descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    name: String,
    fields: Vec<FieldDescriptor>,
    pk_index: usize,
}

impl EntitySchema {
    /// Creates a record type, inserting an auto-generated `id` primary key
    /// first when none is declared.
    ///
    /// # Arguments
    /// * `name` - Record type name
    /// * `fields` - Field descriptors in declaration order
    ///
    /// # Returns
    /// `Result<EntitySchema, ScaffoldError>` rejecting duplicate names,
    /// composite keys and unusable key kinds.
    pub fn new(
        name: impl Into<String>,
        mut fields: Vec<FieldDescriptor>,
    ) -> Result<Self, ScaffoldError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ScaffoldError::Configuration(
                "record type name cannot be empty".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.is_empty() {
                return Err(invalid(&name, "field name cannot be empty"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ScaffoldError::DuplicateField {
                    entity: name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let pk_positions: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.primary_key)
            .map(|(i, _)| i)
            .collect();

        let pk_index = match pk_positions.as_slice() {
            [] => {
                if seen.contains(IMPLICIT_PK) {
                    return Err(invalid(
                        &name,
                        "field 'id' must be the primary key when no other key is declared",
                    ));
                }
                fields.insert(0, FieldDescriptor::auto_pk(IMPLICIT_PK));
                0
            }
            [index] => *index,
            _ => return Err(invalid(&name, "composite primary keys are not supported")),
        };

        for field in &fields {
            if field.auto && !field.primary_key {
                return Err(invalid(
                    &name,
                    &format!("field '{}' is auto but not the primary key", field.name),
                ));
            }
        }

        let pk = &fields[pk_index];
        match pk.kind.value_kind() {
            Some(kind) if kind.is_key_kind() => {
                if pk.auto && kind != ValueKind::Int {
                    return Err(invalid(&name, "only integer primary keys can be auto"));
                }
            }
            _ => {
                return Err(invalid(
                    &name,
                    &format!("primary key '{}' has unsupported kind {}", pk.name, pk.kind),
                ))
            }
        }

        Ok(Self {
            name,
            fields,
            pk_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field descriptors in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn primary_key(&self) -> &FieldDescriptor {
        &self.fields[self.pk_index]
    }

    /// Kind of the primary key (always a key kind).
    pub fn key_kind(&self) -> ValueKind {
        self.primary_key()
            .kind
            .value_kind()
            .unwrap_or(ValueKind::Int)
    }

    /// First plain text field, used to label records in pickers.
    pub fn display_field(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| {
            !f.primary_key && matches!(f.kind, FieldKind::Value(ValueKind::Str))
        })
    }

    /// Builds the stored value map for a create or an update.
    ///
    /// Merges `attributes` over `existing`, fills defaults, then checks
    /// unknown fields, presence and per-field value constraints. The primary
    /// key of an auto-keyed record type may stay `Null`; the store assigns it.
    pub(crate) fn prepare_values(
        &self,
        attributes: Map<String, Value>,
        existing: Option<&Map<String, Value>>,
    ) -> Result<Map<String, Value>, ScaffoldError> {
        for name in attributes.keys() {
            if self.field(name).is_none() {
                return Err(ScaffoldError::FieldNotFound {
                    entity: self.name.clone(),
                    field: name.clone(),
                });
            }
        }

        let mut values = existing.cloned().unwrap_or_default();
        values.extend(attributes);

        let mut prepared = Map::new();
        for field in &self.fields {
            let mut value = values.remove(&field.name).unwrap_or(Value::Null);
            if value.is_null() {
                if let Some(default) = &field.default {
                    value = default.clone();
                }
            }
            if value.is_null() && field.is_collection() {
                value = Value::Array(Vec::new());
            }
            if value.is_null() && field.is_required() && !field.auto {
                return Err(ScaffoldError::MissingValue {
                    entity: self.name.clone(),
                    field: field.name.clone(),
                });
            }
            if let (Some(ValueKind::Str | ValueKind::LongStr), Some("")) =
                (field.kind.value_kind(), value.as_str())
            {
                if field.is_required() {
                    return Err(ScaffoldError::MissingValue {
                        entity: self.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
            field.check_value(&self.name, &value)?;
            if let Some(kind) = field.kind.value_kind() {
                value = kind.normalize(value);
            }
            prepared.insert(field.name.clone(), value);
        }
        Ok(prepared)
    }
}

fn invalid(entity: &str, message: &str) -> ScaffoldError {
    ScaffoldError::InvalidSchema {
        entity: entity.to_string(),
        message: message.to_string(),
    }
}

/// Ordered set of record types with resolved relations.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    entities: Vec<Arc<EntitySchema>>,
}

impl Schema {
    /// Creates a schema, checking entity names and relation targets.
    pub fn new(entities: Vec<EntitySchema>) -> Result<Self, ScaffoldError> {
        let mut names = HashSet::new();
        for entity in &entities {
            if !names.insert(entity.name().to_string()) {
                return Err(ScaffoldError::DuplicateEntity(entity.name().to_string()));
            }
        }

        for entity in &entities {
            for field in entity.fields() {
                if let Some(target) = field.kind.target() {
                    if !names.contains(target) {
                        return Err(invalid(
                            entity.name(),
                            &format!(
                                "field '{}' refers to unknown entity '{}'",
                                field.name, target
                            ),
                        ));
                    }
                }
            }
        }

        Ok(Self {
            entities: entities.into_iter().map(Arc::new).collect(),
        })
    }

    /// Looks up a record type by name.
    pub fn entity(&self, name: &str) -> Result<&Arc<EntitySchema>, ScaffoldError> {
        self.entities
            .iter()
            .find(|e| e.name() == name)
            .ok_or_else(|| ScaffoldError::EntityNotFound {
                entity: name.to_string(),
            })
    }

    /// Record types in declaration order.
    pub fn entities(&self) -> &[Arc<EntitySchema>] {
        &self.entities
    }
}
