//! Declared value kinds of record fields.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scalar kinds a field can store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Decimal,
    Str,
    LongStr,
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    Time,
    Json,
    Uuid,
    Bytes,
}

impl ValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [ValueKind; 12] = [
        ValueKind::Bool,
        ValueKind::Int,
        ValueKind::Float,
        ValueKind::Decimal,
        ValueKind::Str,
        ValueKind::LongStr,
        ValueKind::Date,
        ValueKind::DateTime,
        ValueKind::Time,
        ValueKind::Json,
        ValueKind::Uuid,
        ValueKind::Bytes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::Str => "str",
            ValueKind::LongStr => "long_str",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::Time => "time",
            ValueKind::Json => "json",
            ValueKind::Uuid => "uuid",
            ValueKind::Bytes => "bytes",
        }
    }

    /// Whether the kind carries numeric bounds.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Float | ValueKind::Decimal)
    }

    /// Whether the kind carries a string length bound.
    pub fn is_textual(self) -> bool {
        matches!(self, ValueKind::Str | ValueKind::LongStr)
    }

    /// Kinds usable as a primary key.
    pub fn is_key_kind(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Str | ValueKind::Uuid)
    }

    /// Canonical stored form of an accepted value.
    ///
    /// Decimals are kept as normalized strings so `1.0` and `1.00` compare
    /// equal; every other kind is stored as given.
    pub fn normalize(self, value: Value) -> Value {
        let parsed = match (self, &value) {
            (ValueKind::Decimal, Value::String(s)) => Decimal::from_str(s.trim()).ok(),
            (ValueKind::Decimal, Value::Number(n)) => Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        };
        match parsed {
            Some(d) => Value::String(d.normalize().to_string()),
            None => value,
        }
    }

    /// Checks that a non-null JSON value is a valid representation of this kind.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ValueKind::Json, _) => true,
            (ValueKind::Bool, Value::Bool(_)) => true,
            (ValueKind::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (ValueKind::Float, Value::Number(_)) => true,
            (ValueKind::Decimal, Value::Number(_)) => true,
            (ValueKind::Decimal, Value::String(s)) => Decimal::from_str(s).is_ok(),
            (ValueKind::Str | ValueKind::LongStr | ValueKind::Bytes, Value::String(_)) => true,
            (ValueKind::Date, Value::String(s)) => NaiveDate::from_str(s).is_ok(),
            (ValueKind::DateTime, Value::String(s)) => NaiveDateTime::from_str(s).is_ok(),
            (ValueKind::Time, Value::String(s)) => NaiveTime::from_str(s).is_ok(),
            (ValueKind::Uuid, Value::String(s)) => uuid::Uuid::parse_str(s).is_ok(),
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full kind of a field: a scalar, or a relation to another record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Scalar value
    Value(ValueKind),
    /// Single reference to a record of the target type
    Reference(String),
    /// Collection of records of the target type
    Collection(String),
}

impl FieldKind {
    /// Target record type of a relation.
    pub fn target(&self) -> Option<&str> {
        match self {
            FieldKind::Value(_) => None,
            FieldKind::Reference(target) | FieldKind::Collection(target) => Some(target),
        }
    }

    pub fn value_kind(&self) -> Option<ValueKind> {
        match self {
            FieldKind::Value(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl From<ValueKind> for FieldKind {
    fn from(kind: ValueKind) -> Self {
        FieldKind::Value(kind)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Value(kind) => write!(f, "{}", kind),
            FieldKind::Reference(target) => write!(f, "reference({})", target),
            FieldKind::Collection(target) => write!(f, "collection({})", target),
        }
    }
}
