//! Serde input format for schema files.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{EntitySchema, Schema};
use super::field::FieldDescriptor;
use super::kind::{FieldKind, ValueKind};
use crate::error::ScaffoldError;
use crate::persistence::classify_io_error;

/// Schema file format.
#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaDefinition {
    /// Record type definitions in declaration order
    pub entities: Vec<EntityDefinition>,
}

/// Record type definition.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Record type name
    pub name: String,
    /// Field definitions
    pub fields: Vec<FieldDefinition>,
}

/// Field definition; exactly one of `type`, `reference`, `collection` is set.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Scalar kind (e.g. "str", "int", "datetime")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<ValueKind>,
    /// Target record type of a single reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Target record type of a collection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    pub required: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub auto: bool,
    pub unsigned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
}

impl FieldDefinition {
    fn into_descriptor(self, entity: &str) -> Result<FieldDescriptor, ScaffoldError> {
        let kind = match (self.r#type, self.reference, self.collection) {
            (Some(kind), None, None) => FieldKind::Value(kind),
            (None, Some(target), None) => FieldKind::Reference(target),
            (None, None, Some(target)) => FieldKind::Collection(target),
            _ => {
                return Err(ScaffoldError::InvalidSchema {
                    entity: entity.to_string(),
                    message: format!(
                        "field '{}' must set exactly one of 'type', 'reference', 'collection'",
                        self.name
                    ),
                })
            }
        };

        let mut field = if self.required {
            FieldDescriptor::required(self.name, kind)
        } else {
            FieldDescriptor::optional(self.name, kind)
        };
        field.default = self.default;
        field.min = self.min;
        field.max = self.max;
        field.max_len = self.max_len;
        field.unique = self.unique;
        field.auto = self.auto;
        if self.primary_key {
            field = field.primary_key();
        }
        if self.unsigned {
            field = field.unsigned();
        }
        Ok(field)
    }
}

impl TryFrom<SchemaDefinition> for Schema {
    type Error = ScaffoldError;

    fn try_from(definition: SchemaDefinition) -> Result<Self, Self::Error> {
        let mut entities = Vec::with_capacity(definition.entities.len());
        for entity in definition.entities {
            let fields = entity
                .fields
                .into_iter()
                .map(|f| f.into_descriptor(&entity.name))
                .collect::<Result<Vec<_>, _>>()?;
            entities.push(EntitySchema::new(entity.name, fields)?);
        }
        Schema::new(entities)
    }
}

impl Schema {
    /// Parses a schema from its JSON definition.
    pub fn from_json(json: &str) -> Result<Self, ScaffoldError> {
        let definition: SchemaDefinition = serde_json::from_str(json)
            .map_err(|e| ScaffoldError::SerializationError(e.to_string()))?;
        Schema::try_from(definition)
    }

    /// Reads and parses a JSON schema file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ScaffoldError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| classify_io_error(e, &format!("reading schema {}", path.display())))?;
        Self::from_json(&json)
    }
}
