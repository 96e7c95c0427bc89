//! Metadata-driven form synthesis and form processing.

mod builder;
mod converters;
mod data;
mod form;
mod validators;
mod widget;

pub use builder::{FormOptions, FormSynthesizer};
pub use converters::{Converter, ConverterRegistry};
pub use data::FormData;
pub use form::{Choice, FieldView, Form, FormView};
pub use validators::Validator;
pub use widget::{Button, FormSpec, WidgetKind, WidgetSpec};
