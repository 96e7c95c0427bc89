//! Schema files and configuration.

use std::io::Write;

use scaffold_core::config::{ConnectionParams, DbConfig, DbKind};
use scaffold_core::forms::ConverterRegistry;
use scaffold_core::schema::{FieldKind, Schema, ValueKind};
use scaffold_core::store::Database;
use scaffold_core::ScaffoldError;

use super::helpers::SHOP_SCHEMA;

#[test]
fn test_schema_file_is_loaded() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(SHOP_SCHEMA.as_bytes())?;

    let schema = Schema::from_json_file(file.path())?;
    let customer = schema.entity("Customer")?;
    assert_eq!(customer.primary_key().name, "id");
    assert_eq!(
        customer.field("orders").map(|f| &f.kind),
        Some(&FieldKind::Collection("Order".to_string()))
    );
    assert_eq!(
        schema.entity("Order")?.field("total").map(|f| f.min),
        Some(Some(0.0))
    );
    ConverterRegistry::standard().check_schema(&schema)?;
    Ok(())
}

#[test]
fn test_missing_schema_file() {
    let err = Schema::from_json_file("/nonexistent/schema.json").unwrap_err();
    assert!(matches!(err, ScaffoldError::IoError(_)));
}

#[test]
fn test_settings_select_provider() -> anyhow::Result<()> {
    let config = DbConfig::from_settings([("DB_TYPE", "mysql"), ("DB_NAME", "shop")])?;
    assert_eq!(config.kind, DbKind::Mysql);
    assert!(matches!(
        config.connection(),
        ConnectionParams::Mysql { port: 3306, ref db, .. } if db == "shop"
    ));

    let schema = Schema::from_json(SHOP_SCHEMA)?;
    let err = Database::open(schema, &config).unwrap_err();
    assert_eq!(err, ScaffoldError::UnsupportedProvider("mysql".to_string()));

    let bytes = Schema::from_json(
        r#"{"entities":[{"name":"Blob","fields":[{"name":"data","type":"bytes"}]}]}"#,
    )?;
    let err = ConverterRegistry::standard().check_schema(&bytes).unwrap_err();
    assert!(matches!(err, ScaffoldError::UnregisteredFieldKind { ref kind, .. } if kind == ValueKind::Bytes.as_str()));
    Ok(())
}
