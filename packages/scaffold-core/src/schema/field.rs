//! Field descriptor within a record type.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use super::kind::{FieldKind, ValueKind};
use crate::error::ScaffoldError;

/// Metadata describing one attribute of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name, unique within the record type
    pub name: String,
    /// Declared kind
    pub kind: FieldKind,
    /// Whether a value must be present
    pub required: bool,
    /// Value used when none is supplied
    pub default: Option<Value>,
    /// Inclusive lower numeric bound
    pub min: Option<f64>,
    /// Inclusive upper numeric bound
    pub max: Option<f64>,
    /// Maximum string length in characters
    pub max_len: Option<usize>,
    /// No two records may hold the same value
    pub unique: bool,
    /// Field is the primary key
    pub primary_key: bool,
    /// Value is generated by the store
    pub auto: bool,
}

impl FieldDescriptor {
    fn base(name: impl Into<String>, kind: FieldKind, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
            default: None,
            min: None,
            max: None,
            max_len: None,
            unique: false,
            primary_key: false,
            auto: false,
        }
    }

    /// A mandatory field.
    pub fn required(name: impl Into<String>, kind: impl Into<FieldKind>) -> Self {
        Self::base(name, kind.into(), true)
    }

    /// A field that may be left unset.
    pub fn optional(name: impl Into<String>, kind: impl Into<FieldKind>) -> Self {
        Self::base(name, kind.into(), false)
    }

    /// A reference to one record of `target`.
    pub fn reference(name: impl Into<String>, target: impl Into<String>, required: bool) -> Self {
        Self::base(name, FieldKind::Reference(target.into()), required)
    }

    /// A collection of records of `target`.
    pub fn collection(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::base(name, FieldKind::Collection(target.into()), false)
    }

    /// Store-generated integer primary key.
    pub fn auto_pk(name: impl Into<String>) -> Self {
        Self::required(name, ValueKind::Int).primary_key().auto()
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.required = true;
        self
    }

    pub fn auto(mut self) -> Self {
        self.auto = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Non-negative numeric field.
    pub fn unsigned(mut self) -> Self {
        self.min = Some(self.min.map_or(0.0, |m| m.max(0.0)));
        self
    }

    pub fn max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    pub fn is_required(&self) -> bool {
        self.required || self.primary_key
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.kind, FieldKind::Reference(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.kind, FieldKind::Collection(_))
    }

    /// Checks kind, numeric bounds and length of a non-null value.
    ///
    /// # Arguments
    /// * `entity` - Owning record type name, for error context
    /// * `value` - Value to check
    ///
    /// # Returns
    /// `Result<(), ScaffoldError>` indicating success or the first violation.
    pub fn check_value(&self, entity: &str, value: &Value) -> Result<(), ScaffoldError> {
        if value.is_null() {
            return Ok(());
        }

        let kind_ok = match &self.kind {
            FieldKind::Value(kind) => kind.accepts(value),
            FieldKind::Reference(_) => is_key_value(value),
            FieldKind::Collection(_) => value
                .as_array()
                .is_some_and(|items| items.iter().all(is_key_value)),
        };
        if !kind_ok {
            return Err(ScaffoldError::TypeMismatch {
                entity: entity.to_string(),
                field: self.name.clone(),
                expected: self.kind.to_string(),
                got: json_type_name(value).to_string(),
            });
        }

        let numeric = matches!(self.kind, FieldKind::Value(kind) if kind.is_numeric());
        if let Some(number) = numeric_value(value).filter(|_| numeric) {
            if let Some(min) = self.min {
                if number < min {
                    return Err(self.invalid(entity, format!("{} is less than {}", number, min)));
                }
            }
            if let Some(max) = self.max {
                if number > max {
                    return Err(
                        self.invalid(entity, format!("{} is greater than {}", number, max))
                    );
                }
            }
        }

        if let (Some(max_len), Some(text)) = (self.max_len, value.as_str()) {
            let len = text.chars().count();
            if len > max_len {
                return Err(self.invalid(
                    entity,
                    format!("length {} exceeds maximum {}", len, max_len),
                ));
            }
        }

        Ok(())
    }

    fn invalid(&self, entity: &str, message: String) -> ScaffoldError {
        ScaffoldError::InvalidValue {
            entity: entity.to_string(),
            field: self.name.clone(),
            message,
        }
    }
}

/// Numeric reading of an int, float or decimal value.
pub(crate) fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => Decimal::from_str(s).ok().and_then(|d| d.to_f64()),
        _ => None,
    }
}

fn is_key_value(value: &Value) -> bool {
    value.is_i64() || value.is_u64() || value.is_string()
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
