//! Per-record-type view configuration: URLs, template and endpoint names,
//! synthesized form and redirect target.

use std::sync::Arc;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use scaffold_core::forms::{FormOptions, FormSpec, FormSynthesizer};
use scaffold_core::naming::camel_to_snake;
use scaffold_core::repository::EntityRepository;
use scaffold_core::schema::{EntitySchema, Schema};
use scaffold_core::store::{Record, RecordKey};
use scaffold_core::ScaffoldError;

/// Characters escaped when a key is placed in a URL path segment.
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// The five CRUD views of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    List,
    Show,
    Create,
    Update,
    Delete,
}

impl ViewKind {
    pub fn action(self) -> &'static str {
        match self {
            ViewKind::List => "list",
            ViewKind::Show => "show",
            ViewKind::Create => "create",
            ViewKind::Update => "update",
            ViewKind::Delete => "delete",
        }
    }
}

/// Where a successful create or update redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SuccessTarget {
    /// Show page of the written record
    #[default]
    Show,
    /// Edit page of the written record
    Edit,
    List,
    /// Fixed location
    Url(String),
}

/// Everything the handlers need to serve one record type.
#[derive(Debug, Clone)]
pub struct EntityViews {
    entity: Arc<EntitySchema>,
    /// snake_case record type name used in template and endpoint names
    name: String,
    prefix: String,
    repository: EntityRepository,
    form: Arc<FormSpec>,
    success: SuccessTarget,
}

impl EntityViews {
    /// Views of `entity` with a form synthesized from default options.
    pub fn new(
        schema: &Schema,
        entity: &str,
        synthesizer: &FormSynthesizer,
    ) -> Result<Self, ScaffoldError> {
        Self::with_options(schema, entity, synthesizer, &FormOptions::default())
    }

    pub fn with_options(
        schema: &Schema,
        entity: &str,
        synthesizer: &FormSynthesizer,
        options: &FormOptions,
    ) -> Result<Self, ScaffoldError> {
        let entity = Arc::clone(schema.entity(entity)?);
        let form = synthesizer.synthesize(Some(entity.as_ref()), options)?;

        // Names without a capitalised word have no snake form.
        let name = match camel_to_snake(entity.name()) {
            snake if snake.is_empty() => entity.name().to_ascii_lowercase(),
            snake => snake,
        };

        Ok(Self {
            repository: EntityRepository::for_entity(Arc::clone(&entity)),
            prefix: format!("/{}", name),
            name,
            entity,
            form: Arc::new(form),
            success: SuccessTarget::default(),
        })
    }

    /// Replaces the URL prefix, `/customer` by default.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        self.prefix = format!("/{}", trimmed);
        self
    }

    pub fn with_success(mut self, success: SuccessTarget) -> Self {
        self.success = success;
        self
    }

    pub fn entity(&self) -> &Arc<EntitySchema> {
        &self.entity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn repository(&self) -> &EntityRepository {
        &self.repository
    }

    pub fn form(&self) -> &Arc<FormSpec> {
        &self.form
    }

    pub fn success(&self) -> &SuccessTarget {
        &self.success
    }

    /// `"customer/create.html"` for the create view of `Customer`.
    pub fn template_name(&self, kind: ViewKind) -> String {
        format!("{}/{}.html", self.name, kind.action())
    }

    /// `"customer_create"` for the create view of `Customer`.
    pub fn endpoint(&self, kind: ViewKind) -> String {
        format!("{}_{}", self.name, kind.action())
    }

    pub fn list_url(&self) -> String {
        self.prefix.clone()
    }

    pub fn create_url(&self) -> String {
        format!("{}/new", self.prefix)
    }

    pub fn show_url(&self, key: &RecordKey) -> String {
        format!("{}/{}", self.prefix, encode_key(key))
    }

    pub fn edit_url(&self, key: &RecordKey) -> String {
        format!("{}/{}/edit", self.prefix, encode_key(key))
    }

    pub fn delete_url(&self, key: &RecordKey) -> String {
        format!("{}/{}/delete", self.prefix, encode_key(key))
    }

    /// Redirect location after `record` was created or updated.
    pub fn success_url(&self, record: &Record) -> String {
        match &self.success {
            SuccessTarget::Show => self.show_url(&record.key),
            SuccessTarget::Edit => self.edit_url(&record.key),
            SuccessTarget::List => self.list_url(),
            SuccessTarget::Url(url) => url.clone(),
        }
    }

    /// Reads a key from a raw URL path segment.
    ///
    /// Returns `None` when the segment cannot be a key of this record type.
    pub fn parse_key(&self, segment: &str) -> Option<RecordKey> {
        let decoded = percent_decode_str(segment).decode_utf8().ok()?;
        RecordKey::parse(&decoded, self.entity.key_kind())
    }

    /// Route patterns registered for this record type.
    pub(crate) fn route_patterns(&self) -> [String; 5] {
        [
            self.prefix.clone(),
            format!("{}/new", self.prefix),
            format!("{}/{{key}}", self.prefix),
            format!("{}/{{key}}/edit", self.prefix),
            format!("{}/{{key}}/delete", self.prefix),
        ]
    }
}

fn encode_key(key: &RecordKey) -> String {
    utf8_percent_encode(&key.to_string(), KEY_SEGMENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaffold_core::schema::{EntitySchema, FieldDescriptor, ValueKind};

    fn schema() -> Schema {
        let item = EntitySchema::new(
            "CartItem",
            vec![
                FieldDescriptor::required("sku", ValueKind::Str).primary_key(),
                FieldDescriptor::optional("quantity", ValueKind::Int),
            ],
        )
        .unwrap();
        Schema::new(vec![item]).unwrap()
    }

    #[test]
    fn test_names_and_urls() {
        let views = EntityViews::new(&schema(), "CartItem", &FormSynthesizer::default()).unwrap();
        assert_eq!(views.name(), "cart_item");
        assert_eq!(views.template_name(ViewKind::Create), "cart_item/create.html");
        assert_eq!(views.endpoint(ViewKind::List), "cart_item_list");
        assert_eq!(views.list_url(), "/cart_item");

        let key = RecordKey::from("a b/c");
        assert_eq!(views.show_url(&key), "/cart_item/a%20b%2Fc");
        assert_eq!(views.parse_key("a%20b%2Fc"), Some(key));
    }

    #[test]
    fn test_prefix_and_success_target() {
        let views = EntityViews::new(&schema(), "CartItem", &FormSynthesizer::default())
            .unwrap()
            .with_prefix("/shop/items/")
            .with_success(SuccessTarget::List);
        assert_eq!(views.create_url(), "/shop/items/new");

        let record = Record {
            entity: "CartItem".to_string(),
            key: RecordKey::from("x1"),
            values: Default::default(),
        };
        assert_eq!(views.success_url(&record), "/shop/items");
    }

    #[test]
    fn test_unknown_entity() {
        let err = EntityViews::new(&schema(), "Missing", &FormSynthesizer::default()).unwrap_err();
        assert!(err.is_not_found());
    }
}
