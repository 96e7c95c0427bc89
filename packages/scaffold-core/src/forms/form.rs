//! Form instances: population, coercion, validation and rendering data.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use super::data::FormData;
use super::validators::Validator;
use super::widget::{Button, FormSpec, WidgetKind, WidgetSpec};
use crate::error::ScaffoldError;
use crate::schema::numeric_value;
use crate::store::{Record, RecordKey, Session};

/// Raw toggle values read as unchecked.
const FALSE_VALUES: [&str; 4] = ["", "false", "0", "off"];

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One option of a record picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    /// Record key as text; empty for the "no record" choice
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default)]
struct FieldState {
    /// Submitted text values, when the form was submitted
    raw: Option<Vec<String>>,
    data: Value,
    /// Coercion failure of the submitted text
    process_error: Option<String>,
    errors: Vec<String>,
    choices: Vec<Choice>,
}

/// An instance of a [`FormSpec`].
#[derive(Debug, Clone)]
pub struct Form {
    spec: Arc<FormSpec>,
    /// One entry per widget of the spec
    fields: Vec<FieldState>,
    submitted: bool,
}

impl Form {
    /// Empty form holding the widget defaults.
    pub fn new(spec: Arc<FormSpec>) -> Self {
        let fields = spec
            .widgets
            .iter()
            .map(|widget| FieldState {
                data: widget.default.clone().unwrap_or(Value::Null),
                ..Default::default()
            })
            .collect();
        Self {
            spec,
            fields,
            submitted: false,
        }
    }

    /// Form populated from a stored record, for edit screens.
    pub fn with_record(spec: Arc<FormSpec>, record: &Record) -> Self {
        let mut form = Self::new(spec);
        for (widget, state) in form.spec.widgets.iter().zip(form.fields.iter_mut()) {
            if let Some(value) = record.get(&widget.name) {
                state.data = value.clone();
            }
        }
        form
    }

    /// Form holding submitted data, coerced to field values.
    pub fn submit(spec: Arc<FormSpec>, data: &FormData) -> Self {
        let fields = spec
            .widgets
            .iter()
            .map(|widget| {
                let raw: Vec<String> = data
                    .get_all(&widget.name)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let (value, process_error) = match coerce(&widget.kind, &raw) {
                    Ok(value) => (value, None),
                    Err(message) => (Value::Null, Some(message.to_string())),
                };
                FieldState {
                    raw: Some(raw),
                    data: value,
                    process_error,
                    ..Default::default()
                }
            })
            .collect();
        Self {
            spec,
            fields,
            submitted: true,
        }
    }

    pub fn spec(&self) -> &Arc<FormSpec> {
        &self.spec
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Current value of a field.
    pub fn data(&self, name: &str) -> Option<&Value> {
        self.index(name).map(|i| &self.fields[i].data)
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.spec.widgets.iter().position(|w| w.name == name)
    }

    /// Fills picker choices by listing the target record types.
    pub fn load_choices(&mut self, session: &Session) -> Result<(), ScaffoldError> {
        for (widget, state) in self.spec.widgets.iter().zip(self.fields.iter_mut()) {
            let (entity, allow_empty) = match &widget.kind {
                WidgetKind::EntityPicker {
                    entity,
                    allow_empty,
                } => (entity, *allow_empty),
                WidgetKind::MultiEntityPicker { entity } => (entity, false),
                _ => continue,
            };

            let table = session.database().table(entity)?;
            let display = table.schema.display_field().map(|f| f.name.as_str());

            let mut choices = Vec::new();
            if allow_empty {
                choices.push(Choice {
                    value: String::new(),
                    label: String::new(),
                });
            }
            for record in session.select(entity)? {
                choices.push(Choice {
                    value: record.key.to_string(),
                    label: record.label(display),
                });
            }
            state.choices = choices;
        }
        Ok(())
    }

    /// Runs every field's validator chain.
    ///
    /// # Arguments
    /// * `session` - Session used by uniqueness and existence checks
    /// * `editing` - Key of the record being edited, excluded from
    ///   uniqueness checks
    ///
    /// # Returns
    /// `Result<bool, ScaffoldError>`: whether every field passed. Store
    /// failures are errors, not validation messages.
    pub fn validate(
        &mut self,
        session: &Session,
        editing: Option<&RecordKey>,
    ) -> Result<bool, ScaffoldError> {
        let mut valid = true;
        for (widget, state) in self.spec.widgets.iter().zip(self.fields.iter_mut()) {
            state.errors.clear();
            if let Some(error) = &state.process_error {
                state.errors.push(error.clone());
                valid = false;
                continue;
            }

            let empty = is_empty_input(widget, state);
            for validator in &widget.validators {
                match check(validator, state, empty, session, editing)? {
                    Outcome::Pass => {}
                    Outcome::Fail => state.errors.push(validator.message()),
                    Outcome::Stop => {
                        state.errors.push(validator.message());
                        break;
                    }
                    Outcome::StopClear => {
                        state.errors.clear();
                        break;
                    }
                }
            }
            valid &= state.errors.is_empty();
        }

        if !valid {
            tracing::debug!("{} failed validation", self.spec.name);
        }
        Ok(valid)
    }

    /// Error messages by field name; fields without errors are left out.
    pub fn errors(&self) -> BTreeMap<String, Vec<String>> {
        self.spec
            .widgets
            .iter()
            .zip(&self.fields)
            .filter(|(_, state)| !state.errors.is_empty())
            .map(|(widget, state)| (widget.name.clone(), state.errors.clone()))
            .collect()
    }

    /// Record field values to write back. Buttons and base-form widgets are
    /// not record fields.
    pub fn values(&self) -> Map<String, Value> {
        self.spec
            .widgets
            .iter()
            .zip(&self.fields)
            .filter(|(widget, _)| self.spec.is_record_field(&widget.name))
            .map(|(widget, state)| (widget.name.clone(), state.data.clone()))
            .collect()
    }

    /// Serializable snapshot for rendering.
    pub fn view(&self) -> FormView {
        let fields = self
            .spec
            .widgets
            .iter()
            .zip(&self.fields)
            .map(|(widget, state)| FieldView {
                name: widget.name.clone(),
                label: widget.label.clone(),
                kind: widget.kind.clone(),
                required: widget.is_required(),
                value: display_value(widget, state),
                errors: state.errors.clone(),
                choices: state.choices.clone(),
            })
            .collect();

        FormView {
            name: self.spec.name.clone(),
            entity: self.spec.entity.clone(),
            fields,
            buttons: self.spec.buttons.clone(),
        }
    }
}

/// Rendering data of a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub name: String,
    pub entity: String,
    pub fields: Vec<FieldView>,
    pub buttons: Vec<Button>,
}

/// Rendering data of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub kind: WidgetKind,
    pub required: bool,
    pub value: Value,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

enum Outcome {
    Pass,
    /// Record the message and continue
    Fail,
    /// Record the message and stop the chain
    Stop,
    /// Clear earlier messages and stop the chain
    StopClear,
}

fn check(
    validator: &Validator,
    state: &mut FieldState,
    empty: bool,
    session: &Session,
    editing: Option<&RecordKey>,
) -> Result<Outcome, ScaffoldError> {
    let outcome = match validator {
        Validator::Optional if empty => Outcome::StopClear,
        Validator::InputRequired { .. } if empty => Outcome::Stop,
        Validator::Optional | Validator::InputRequired { .. } => Outcome::Pass,
        Validator::NumberRange { min, max, .. } => match numeric_value(&state.data) {
            Some(n) if min.is_some_and(|m| n < m) || max.is_some_and(|m| n > m) => Outcome::Fail,
            _ => Outcome::Pass,
        },
        Validator::Length { min, max, .. } => match state.data.as_str() {
            Some(text) => {
                let len = text.chars().count();
                if min.is_some_and(|m| len < m) || max.is_some_and(|m| len > m) {
                    Outcome::Fail
                } else {
                    Outcome::Pass
                }
            }
            None => Outcome::Pass,
        },
        Validator::UuidFormat { .. } => match state.data.as_str() {
            Some(text) if uuid::Uuid::parse_str(text).is_err() => Outcome::Fail,
            _ => Outcome::Pass,
        },
        Validator::Unique { entity, field, .. } => {
            if !state.data.is_null()
                && session.exists_other(entity, field, &state.data, editing)?
            {
                Outcome::Fail
            } else {
                Outcome::Pass
            }
        }
        Validator::EntityExists { entity, .. } => {
            let kind = session.database().table(entity)?.schema.key_kind();
            let lookup = |value: &Value| -> Result<Option<RecordKey>, ScaffoldError> {
                let key = match value {
                    Value::String(raw) => RecordKey::parse(raw, kind),
                    other => RecordKey::from_value(other),
                };
                match key {
                    Some(key) if session.get(entity, &key)?.is_some() => Ok(Some(key)),
                    _ => Ok(None),
                }
            };

            match &mut state.data {
                Value::Null => Outcome::Pass,
                Value::Array(items) => {
                    let mut outcome = Outcome::Pass;
                    for item in items.iter_mut() {
                        match lookup(&*item)? {
                            Some(key) => *item = key.to_value(),
                            None => {
                                outcome = Outcome::Stop;
                                break;
                            }
                        }
                    }
                    outcome
                }
                value => match lookup(&*value)? {
                    Some(key) => {
                        *value = key.to_value();
                        Outcome::Pass
                    }
                    None => Outcome::Stop,
                },
            }
        }
    };
    Ok(outcome)
}

fn is_empty_input(widget: &WidgetSpec, state: &FieldState) -> bool {
    match (&widget.kind, &state.data) {
        (WidgetKind::Toggle, data) => data != &Value::Bool(true),
        (_, Value::Array(items)) => items.is_empty(),
        (_, data) => data.is_null(),
    }
}

fn display_value(widget: &WidgetSpec, state: &FieldState) -> Value {
    match (&state.raw, &widget.kind) {
        (Some(raw), WidgetKind::MultiEntityPicker { .. }) if state.process_error.is_some() => {
            Value::Array(raw.iter().cloned().map(Value::String).collect())
        }
        (Some(raw), _) if state.process_error.is_some() => raw
            .first()
            .cloned()
            .map(Value::String)
            .unwrap_or(Value::Null),
        _ => state.data.clone(),
    }
}

/// Converts submitted text into the value stored for a widget kind.
fn coerce(kind: &WidgetKind, raw: &[String]) -> Result<Value, &'static str> {
    match kind {
        WidgetKind::Toggle => Ok(Value::Bool(
            raw.first()
                .is_some_and(|text| !FALSE_VALUES.contains(&text.trim().to_lowercase().as_str())),
        )),
        WidgetKind::MultiEntityPicker { .. } => Ok(Value::Array(
            raw.iter()
                .map(|text| text.trim())
                .filter(|text| !text.is_empty())
                .map(|text| Value::String(text.to_string()))
                .collect(),
        )),
        _ => match raw.first() {
            Some(text) => coerce_scalar(kind, text),
            None => Ok(Value::Null),
        },
    }
}

fn coerce_scalar(kind: &WidgetKind, text: &str) -> Result<Value, &'static str> {
    let trimmed = text.trim();
    match kind {
        WidgetKind::Text | WidgetKind::TextArea if text.is_empty() => Ok(Value::Null),
        WidgetKind::Text | WidgetKind::TextArea => Ok(Value::String(text.to_string())),
        _ if trimmed.is_empty() => Ok(Value::Null),
        WidgetKind::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| "Not a valid integer value."),
        WidgetKind::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or("Not a valid float value."),
        WidgetKind::Decimal => Decimal::from_str(trimmed)
            .map(|d| Value::String(d.normalize().to_string()))
            .map_err(|_| "Not a valid decimal value."),
        WidgetKind::Json => serde_json::from_str(trimmed).map_err(|_| "Not a valid JSON value."),
        WidgetKind::Date => NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(|d| Value::String(d.format(DATE_FORMAT).to_string()))
            .map_err(|_| "Not a valid date value."),
        WidgetKind::DateTime => parse_datetime(trimmed)
            .map(|dt| Value::String(dt.format(DATETIME_FORMAT).to_string()))
            .ok_or("Not a valid datetime value."),
        _ => Ok(Value::String(trimmed.to_string())),
    }
}

/// Accepts a space or `T` between date and time, with or without seconds.
fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let normalized = text.replacen('T', " ", 1);
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
}
