//! Shared fixtures.

use std::sync::Arc;

use scaffold_core::forms::{FormData, FormOptions, FormSpec, FormSynthesizer};
use scaffold_core::schema::Schema;
use scaffold_core::store::Database;

pub const SHOP_SCHEMA: &str = r#"{
    "entities": [
        {
            "name": "Customer",
            "fields": [
                {"name": "email", "type": "str", "required": true, "unique": true},
                {"name": "name", "type": "str", "required": true},
                {"name": "country", "type": "str"},
                {"name": "orders", "collection": "Order"}
            ]
        },
        {
            "name": "Order",
            "fields": [
                {"name": "customer", "reference": "Customer", "required": true},
                {"name": "total", "type": "decimal", "required": true, "unsigned": true},
                {"name": "placed_on", "type": "date"}
            ]
        }
    ]
}"#;

pub fn shop_schema() -> Schema {
    Schema::from_json(SHOP_SCHEMA).unwrap()
}

pub fn shop() -> Arc<Database> {
    Arc::new(Database::memory(shop_schema()))
}

pub fn form_for(db: &Database, entity: &str) -> Arc<FormSpec> {
    let entity = db.schema().entity(entity).unwrap();
    Arc::new(
        FormSynthesizer::default()
            .synthesize(Some(entity.as_ref()), &FormOptions::default())
            .unwrap(),
    )
}

pub fn form_data(pairs: &[(&str, &str)]) -> FormData {
    pairs.iter().copied().collect()
}
