//! Rendering of view contexts into response bodies.

use hyper::body::Bytes;
use scaffold_core::forms::FormView;
use scaffold_core::store::Record;
use serde::Serialize;
use serde_json::Value;

use crate::handlers::success_response;
use crate::router::RouterError;
use crate::views::{EntityViews, ViewKind};

/// Data handed to a renderer for one view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewContext {
    /// Template name, e.g. `customer/list.html`
    pub template: String,
    pub endpoint: String,
    /// Record type shown by the view
    pub record_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<FormView>,
}

impl ViewContext {
    pub fn new(views: &EntityViews, kind: ViewKind) -> Self {
        Self {
            template: views.template_name(kind),
            endpoint: views.endpoint(kind),
            record_type: views.entity().name().to_string(),
            entities: None,
            entity: None,
            form: None,
        }
    }

    pub fn with_entities(mut self, records: &[Record]) -> Self {
        self.entities = Some(records.iter().map(Record::to_json).collect());
        self
    }

    pub fn with_entity(mut self, record: &Record) -> Self {
        self.entity = Some(record.to_json());
        self
    }

    pub fn with_form(mut self, form: FormView) -> Self {
        self.form = Some(form);
        self
    }
}

/// Turns a view context into a response body.
pub trait Renderer: Send + Sync {
    fn render(&self, context: &ViewContext) -> Result<Bytes, RouterError>;

    fn content_type(&self) -> &str {
        "application/json"
    }
}

/// Renders the context as the `data` of a success envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, context: &ViewContext) -> Result<Bytes, RouterError> {
        serde_json::to_vec(&success_response(context))
            .map(Bytes::from)
            .map_err(|e| RouterError::InternalError(format!("Failed to serialize view: {}", e)))
    }
}
