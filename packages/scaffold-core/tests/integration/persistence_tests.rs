//! Snapshot persistence across database reopen.

use std::sync::Arc;

use serde_json::json;
use tempfile::tempdir;

use scaffold_core::config::{DbConfig, DbKind};
use scaffold_core::persistence::SnapshotStore;
use scaffold_core::store::{with_session, Database, RecordKey};

use super::helpers::shop_schema;

fn file_config(path: &std::path::Path) -> DbConfig {
    DbConfig {
        name: Some(path.display().to_string()),
        ..DbConfig::for_kind(DbKind::Sqlite)
    }
}

#[test]
fn test_committed_records_survive_reopen() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("data").join("shop.json");

    {
        let db = Arc::new(Database::open(shop_schema(), &file_config(&path))?);
        assert!(db.is_persistent());
        with_session(&db, |session| {
            session.insert(
                "Customer",
                serde_json::from_value(json!({"email": "a@b.com", "name": "A"})).unwrap(),
            )?;
            session.insert(
                "Order",
                serde_json::from_value(json!({"customer": 1, "total": "5"})).unwrap(),
            )
        })?;
    }

    let db = Arc::new(Database::open(shop_schema(), &file_config(&path))?);
    let orders = with_session(&db, |session| session.select("Order"))?;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].get("customer"), Some(&json!(1)));

    let snapshot = SnapshotStore::new(&path).load()?.unwrap();
    assert_eq!(snapshot.tables["Customer"].next_id, 2);
    assert_eq!(snapshot.tables["Customer"].records.len(), 1);
    Ok(())
}

#[test]
fn test_rolled_back_session_writes_nothing() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("shop.json");
    let db = Arc::new(Database::open(shop_schema(), &file_config(&path))?);

    let mut session = db.session();
    session.insert(
        "Customer",
        serde_json::from_value(json!({"email": "a@b.com", "name": "A"}))?,
    )?;
    session.rollback();

    assert!(!path.exists());
    Ok(())
}

#[test]
fn test_deletes_are_persisted() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("shop.json");

    {
        let db = Arc::new(Database::open(shop_schema(), &file_config(&path))?);
        with_session(&db, |session| {
            session.insert(
                "Customer",
                serde_json::from_value(json!({"email": "a@b.com", "name": "A"})).unwrap(),
            )
        })?;
        with_session(&db, |session| session.delete("Customer", &RecordKey::Int(1)))?;
    }

    let db = Arc::new(Database::open(shop_schema(), &file_config(&path))?);
    assert_eq!(db.table("Customer")?.record_count(), 0);
    assert_eq!(db.table("Customer")?.current_next_id(), 2);
    Ok(())
}
