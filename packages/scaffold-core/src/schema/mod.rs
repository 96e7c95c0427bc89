//! Record types, field descriptors and schema files.

mod definition;
mod entity;
mod field;
mod kind;

pub use definition::{EntityDefinition, FieldDefinition, SchemaDefinition};
pub use entity::{EntitySchema, Schema, IMPLICIT_PK};
pub use field::FieldDescriptor;
pub(crate) use field::numeric_value;
pub use kind::{FieldKind, ValueKind};
