//! Form synthesis from record type metadata.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::converters::ConverterRegistry;
use super::validators::Validator;
use super::widget::{Button, FormSpec, WidgetKind, WidgetSpec};
use crate::error::ScaffoldError;
use crate::schema::{EntitySchema, FieldDescriptor, FieldKind};

/// Caller choices for one synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct FormOptions {
    /// Fields left out of the form
    pub excludes: BTreeSet<String>,
    /// Leave out the primary key even when it is not auto-generated
    pub skip_pk: bool,
    /// Widget kinds replacing the converted kind, by field name
    pub overrides: BTreeMap<String, WidgetKind>,
    /// Form whose widgets come before the synthesized ones
    pub base: Option<FormSpec>,
    pub buttons: Vec<Button>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            excludes: BTreeSet::new(),
            skip_pk: true,
            overrides: BTreeMap::new(),
            base: None,
            buttons: vec![Button::submit()],
        }
    }
}

impl FormOptions {
    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.excludes.insert(field.into());
        self
    }

    /// Keeps a primary key that the store does not generate.
    pub fn keep_pk(mut self) -> Self {
        self.skip_pk = false;
        self
    }

    pub fn override_widget(mut self, field: impl Into<String>, kind: WidgetKind) -> Self {
        self.overrides.insert(field.into(), kind);
        self
    }

    pub fn extend(mut self, base: FormSpec) -> Self {
        self.base = Some(base);
        self
    }

    pub fn buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// Derives form specifications from record types.
#[derive(Debug, Clone, Default)]
pub struct FormSynthesizer {
    registry: Arc<ConverterRegistry>,
}

impl FormSynthesizer {
    pub fn new(registry: Arc<ConverterRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    /// Builds the form of a record type.
    ///
    /// # Arguments
    /// * `entity` - Record type; `None` is a configuration error
    /// * `options` - Exclusions, overrides, base form and buttons
    ///
    /// # Returns
    /// `Result<FormSpec, ScaffoldError>`; fails without a partial form when
    /// a field kind has neither a converter nor an override.
    pub fn synthesize(
        &self,
        entity: Option<&EntitySchema>,
        options: &FormOptions,
    ) -> Result<FormSpec, ScaffoldError> {
        let entity = entity.ok_or_else(|| {
            ScaffoldError::Configuration("record type is not assigned".to_string())
        })?;

        let mut widgets = options
            .base
            .as_ref()
            .map(|base| base.widgets.clone())
            .unwrap_or_default();
        let mut fields = Vec::new();

        for field in entity.fields() {
            if options.excludes.contains(&field.name) {
                continue;
            }
            let Some(widget) = self.widget(entity, field, options)? else {
                continue;
            };
            fields.push(widget.name.clone());
            match widgets.iter_mut().find(|w| w.name == widget.name) {
                Some(existing) => *existing = widget,
                None => widgets.push(widget),
            }
        }

        tracing::debug!(
            "Synthesized form for {} with {} widgets",
            entity.name(),
            widgets.len()
        );

        Ok(FormSpec {
            name: format!("{}Form", entity.name()),
            entity: entity.name().to_string(),
            widgets,
            fields,
            buttons: options.buttons.clone(),
        })
    }

    /// Widget of one field, or `None` when the field is left out.
    fn widget(
        &self,
        entity: &EntitySchema,
        field: &FieldDescriptor,
        options: &FormOptions,
    ) -> Result<Option<WidgetSpec>, ScaffoldError> {
        if field.primary_key && (field.auto || options.skip_pk) {
            return Ok(None);
        }

        let custom = options.overrides.get(&field.name).cloned();
        let mut validators = vec![if field.is_required() {
            Validator::input_required()
        } else {
            Validator::Optional
        }];

        let kind = match &field.kind {
            FieldKind::Collection(_) => {
                return Ok(custom.map(|kind| {
                    WidgetSpec::new(&field.name, kind).with_validator(Validator::Optional)
                }));
            }
            FieldKind::Reference(target) => {
                validators.push(Validator::entity_exists(target));
                WidgetKind::EntityPicker {
                    entity: target.clone(),
                    allow_empty: !field.is_required(),
                }
            }
            FieldKind::Value(value_kind) => match self.registry.get(*value_kind) {
                Some(convert) => convert(field, &mut validators),
                None => custom.clone().ok_or_else(|| ScaffoldError::UnregisteredFieldKind {
                    entity: entity.name().to_string(),
                    field: field.name.clone(),
                    kind: value_kind.to_string(),
                })?,
            },
        };

        if field.unique || field.primary_key {
            validators.push(Validator::unique(entity.name(), &field.name));
        }

        let mut widget = WidgetSpec::new(&field.name, custom.unwrap_or(kind));
        widget.validators = validators;
        widget.default = field.default.clone();
        Ok(Some(widget))
    }
}
