//! Value kind to widget converters.

use std::collections::HashMap;

use super::validators::Validator;
use super::widget::WidgetKind;
use crate::error::ScaffoldError;
use crate::schema::{FieldDescriptor, FieldKind, Schema, ValueKind};

/// Builds the widget kind of a field, appending kind-specific validators.
pub type Converter = fn(&FieldDescriptor, &mut Vec<Validator>) -> WidgetKind;

/// Immutable lookup table from value kind to converter.
///
/// Built once at startup and shared read-only.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<ValueKind, Converter>,
}

impl ConverterRegistry {
    /// A registry with no converters.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Converters for every kind a standard form can edit.
    ///
    /// `Time` and `Bytes` have none.
    pub fn standard() -> Self {
        Self::empty()
            .with(ValueKind::Bool, field_bool)
            .with(ValueKind::Int, field_int)
            .with(ValueKind::Float, field_float)
            .with(ValueKind::Decimal, field_decimal)
            .with(ValueKind::Str, field_string)
            .with(ValueKind::LongStr, field_textarea)
            .with(ValueKind::Json, field_json)
            .with(ValueKind::Date, field_date)
            .with(ValueKind::DateTime, field_datetime)
            .with(ValueKind::Uuid, field_uuid)
    }

    /// Returns the registry with `converter` registered for `kind`.
    pub fn with(mut self, kind: ValueKind, converter: Converter) -> Self {
        self.converters.insert(kind, converter);
        self
    }

    pub fn get(&self, kind: ValueKind) -> Option<Converter> {
        self.converters.get(&kind).copied()
    }

    pub fn contains(&self, kind: ValueKind) -> bool {
        self.converters.contains_key(&kind)
    }

    /// Kinds with no converter, in declaration order of [`ValueKind::ALL`].
    pub fn missing_kinds(&self) -> Vec<ValueKind> {
        ValueKind::ALL
            .iter()
            .copied()
            .filter(|kind| !self.contains(*kind))
            .collect()
    }

    /// Checks that every scalar field of `schema` has a converter.
    ///
    /// # Returns
    /// `Result<(), ScaffoldError>` naming the first unregistered field kind.
    pub fn check_schema(&self, schema: &Schema) -> Result<(), ScaffoldError> {
        for entity in schema.entities() {
            for field in entity.fields() {
                if let FieldKind::Value(kind) = field.kind {
                    if field.primary_key && field.auto {
                        continue;
                    }
                    if !self.contains(kind) {
                        return Err(ScaffoldError::UnregisteredFieldKind {
                            entity: entity.name().to_string(),
                            field: field.name.clone(),
                            kind: kind.to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.converters.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}

fn numeric(field: &FieldDescriptor, validators: &mut Vec<Validator>) {
    if field.min.is_some() || field.max.is_some() {
        validators.push(Validator::number_range(field.min, field.max));
    }
}

fn string(field: &FieldDescriptor, validators: &mut Vec<Validator>) {
    if let Some(max_len) = field.max_len {
        validators.push(Validator::length(None, Some(max_len)));
    }
}

fn field_bool(_: &FieldDescriptor, _: &mut Vec<Validator>) -> WidgetKind {
    WidgetKind::Toggle
}

fn field_int(field: &FieldDescriptor, validators: &mut Vec<Validator>) -> WidgetKind {
    numeric(field, validators);
    WidgetKind::Integer
}

fn field_float(field: &FieldDescriptor, validators: &mut Vec<Validator>) -> WidgetKind {
    numeric(field, validators);
    WidgetKind::Float
}

fn field_decimal(field: &FieldDescriptor, validators: &mut Vec<Validator>) -> WidgetKind {
    numeric(field, validators);
    WidgetKind::Decimal
}

fn field_string(field: &FieldDescriptor, validators: &mut Vec<Validator>) -> WidgetKind {
    string(field, validators);
    WidgetKind::Text
}

fn field_textarea(field: &FieldDescriptor, validators: &mut Vec<Validator>) -> WidgetKind {
    string(field, validators);
    WidgetKind::TextArea
}

fn field_json(_: &FieldDescriptor, _: &mut Vec<Validator>) -> WidgetKind {
    WidgetKind::Json
}

fn field_date(_: &FieldDescriptor, _: &mut Vec<Validator>) -> WidgetKind {
    WidgetKind::Date
}

fn field_datetime(_: &FieldDescriptor, _: &mut Vec<Validator>) -> WidgetKind {
    WidgetKind::DateTime
}

fn field_uuid(_: &FieldDescriptor, validators: &mut Vec<Validator>) -> WidgetKind {
    validators.push(Validator::uuid_format());
    WidgetKind::Text
}
