//! Widget and form specifications produced by synthesis.

use serde::Serialize;
use serde_json::Value;

use super::validators::Validator;

/// Input control used to edit one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetKind {
    /// Checkbox
    Toggle,
    Integer,
    Float,
    Decimal,
    /// Single-line text input
    Text,
    /// Multi-line text input
    TextArea,
    /// Multi-line input holding a JSON document
    Json,
    Date,
    DateTime,
    /// Select one record of `entity`
    EntityPicker { entity: String, allow_empty: bool },
    /// Select any number of records of `entity`
    MultiEntityPicker { entity: String },
}

impl WidgetKind {
    /// Target record type of a picker.
    pub fn entity(&self) -> Option<&str> {
        match self {
            WidgetKind::EntityPicker { entity, .. } | WidgetKind::MultiEntityPicker { entity } => {
                Some(entity)
            }
            _ => None,
        }
    }
}

/// One editable field of a form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetSpec {
    /// Target field name
    pub name: String,
    pub label: String,
    pub kind: WidgetKind,
    /// Validators in evaluation order
    pub validators: Vec<Validator>,
    /// Initial value of an empty form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl WidgetSpec {
    pub fn new(name: impl Into<String>, kind: WidgetKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind,
            validators: Vec::new(),
            default: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Whether the field must be filled in.
    pub fn is_required(&self) -> bool {
        self.validators
            .iter()
            .any(|v| matches!(v, Validator::InputRequired { .. }))
    }
}

/// Action button of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Button {
    pub name: String,
    pub label: String,
}

impl Button {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }

    pub fn submit() -> Self {
        Self::new("submit", "Submit")
    }
}

/// Editable-form description of one record type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSpec {
    /// Form name, `<Entity>Form`
    pub name: String,
    /// Record type edited by the form
    pub entity: String,
    /// Base-form widgets, then widgets in field declaration order
    pub widgets: Vec<WidgetSpec>,
    /// Names of the record fields the form writes back
    pub fields: Vec<String>,
    pub buttons: Vec<Button>,
}

impl FormSpec {
    pub fn widget(&self, name: &str) -> Option<&WidgetSpec> {
        self.widgets.iter().find(|w| w.name == name)
    }

    /// Whether `name` is a record field rather than a base-form widget.
    pub fn is_record_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }
}
