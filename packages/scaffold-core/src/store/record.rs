//! Stored records and their primary keys.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::schema::ValueKind;

/// Primary key value of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Int(i64),
    Text(String),
}

impl RecordKey {
    /// Reads a key from a stored or submitted value.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordKey::Int),
            Value::String(s) => Some(RecordKey::Text(s.clone())),
            _ => None,
        }
    }

    /// Parses a key from text (URL segment, form input) for a key of `kind`.
    ///
    /// Returns `None` when the text cannot be a key of that kind.
    pub fn parse(raw: &str, kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Int => raw.trim().parse::<i64>().ok().map(RecordKey::Int),
            ValueKind::Uuid => uuid::Uuid::parse_str(raw.trim())
                .ok()
                .map(|u| RecordKey::Text(u.hyphenated().to_string())),
            _ if raw.is_empty() => None,
            _ => Some(RecordKey::Text(raw.to_string())),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordKey::Int(i) => Value::from(*i),
            RecordKey::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Int(i) => write!(f, "{}", i),
            RecordKey::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(key: i64) -> Self {
        RecordKey::Int(key)
    }
}

impl From<&str> for RecordKey {
    fn from(key: &str) -> Self {
        RecordKey::Text(key.to_string())
    }
}

/// A record instance: entity name, key, and every stored field value.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Record type name
    pub entity: String,
    /// Primary key
    pub key: RecordKey,
    /// Field name to value; unset fields hold `Null`
    pub values: Map<String, Value>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Label shown for this record in reference pickers, e.g. `Customer[1]`.
    pub fn label(&self, display_field: Option<&str>) -> String {
        display_field
            .and_then(|name| self.values.get(name))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}[{}]", self.entity, self.key))
    }

    /// The field values as a JSON object.
    pub fn to_json(&self) -> Value {
        Value::Object(self.values.clone())
    }
}
