//! Customer create/edit flow: synthesize, submit, validate, persist.

use std::sync::Arc;

use serde_json::{json, Value};

use scaffold_core::forms::{Form, WidgetKind};
use scaffold_core::repository::{EntityRepository, Repository};
use scaffold_core::store::{with_session, RecordKey, SessionScope};
use scaffold_core::ScaffoldError;

use super::helpers::{form_data, form_for, shop};

#[test]
fn test_customer_form_has_three_widgets_in_order() {
    let db = shop();
    let spec = form_for(&db, "Customer");

    let names: Vec<&str> = spec.widgets.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, ["email", "name", "country"]);
    assert!(spec.widgets.iter().all(|w| w.default.is_none()));

    let form = Form::new(Arc::clone(&spec));
    assert!(form.view().fields.iter().all(|f| f.value == Value::Null));
}

#[test]
fn test_create_then_duplicate_email_fails_on_email_only() -> anyhow::Result<()> {
    let db = shop();
    let spec = form_for(&db, "Customer");
    let repository = EntityRepository::from_schema(db.schema(), "Customer")?;

    let submitted = form_data(&[("email", "a@b.com"), ("name", "A")]);
    let record = with_session(&db, |session| {
        let mut form = Form::submit(Arc::clone(&spec), &submitted);
        assert!(form.validate(session, None)?);
        repository.create(session, form.values())
    })?;
    assert_eq!(record.get("country"), Some(&Value::Null));
    assert_eq!(record.get("email"), Some(&json!("a@b.com")));

    let again = form_data(&[("email", "a@b.com"), ("name", "B")]);
    let mut scope = SessionScope::new(Arc::clone(&db));
    let mut form = Form::submit(Arc::clone(&spec), &again);
    assert!(!form.validate(scope.session(), None)?);
    let errors = form.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors.contains_key("email"));
    scope.teardown(true)?;

    Ok(())
}

#[test]
fn test_edit_keeps_own_email() -> anyhow::Result<()> {
    let db = shop();
    let spec = form_for(&db, "Customer");
    let repository = EntityRepository::from_schema(db.schema(), "Customer")?;

    let key = with_session(&db, |session| {
        Ok(repository
            .create(session, serde_json::from_value(json!({"email": "a@b.com", "name": "A"})).unwrap())?
            .key)
    })?;

    let mut scope = SessionScope::new(Arc::clone(&db));
    let record = repository.get(scope.session(), &key)?;
    let form = Form::with_record(Arc::clone(&spec), &record);
    assert_eq!(form.data("email"), Some(&json!("a@b.com")));

    let edited = form_data(&[("email", "a@b.com"), ("name", "A. Person"), ("country", "NZ")]);
    let mut form = Form::submit(Arc::clone(&spec), &edited);
    assert!(form.validate(scope.session(), Some(&key))?);
    repository.update(scope.session(), &key, form.values())?;
    scope.teardown(false)?;

    let stored = with_session(&db, |session| repository.get(session, &key))?;
    assert_eq!(stored.get("name"), Some(&json!("A. Person")));
    assert_eq!(stored.get("country"), Some(&json!("NZ")));
    Ok(())
}

#[test]
fn test_order_form_uses_customer_picker() -> anyhow::Result<()> {
    let db = shop();
    let spec = form_for(&db, "Order");
    assert_eq!(
        spec.widget("customer").map(|w| &w.kind),
        Some(&WidgetKind::EntityPicker {
            entity: "Customer".to_string(),
            allow_empty: false,
        })
    );

    let customers = EntityRepository::from_schema(db.schema(), "Customer")?;
    let orders = EntityRepository::from_schema(db.schema(), "Order")?;

    with_session(&db, |session| {
        customers.create(
            session,
            serde_json::from_value(json!({"email": "a@b.com", "name": "Ada"})).unwrap(),
        )?;

        let mut form = Form::new(Arc::clone(&spec));
        form.load_choices(session)?;
        let view = form.view();
        let picker = view.fields.iter().find(|f| f.name == "customer").unwrap();
        assert_eq!(picker.choices.len(), 1);
        assert_eq!(picker.choices[0].label, "a@b.com");

        let submitted = form_data(&[("customer", "1"), ("total", "12.50"), ("placed_on", "2024-05-01")]);
        let mut form = Form::submit(Arc::clone(&spec), &submitted);
        assert!(form.validate(session, None)?);
        let order = orders.create(session, form.values())?;
        assert_eq!(order.get("customer"), Some(&json!(1)));
        assert_eq!(order.get("total"), Some(&json!("12.5")));
        Ok(())
    })?;

    let err = with_session(&db, |session| {
        customers.delete(session, &RecordKey::Int(1))
    })
    .unwrap_err();
    assert!(matches!(err, ScaffoldError::Conflict(_)));
    Ok(())
}

#[test]
fn test_failed_scope_leaves_store_untouched() -> anyhow::Result<()> {
    let db = shop();
    let repository = EntityRepository::from_schema(db.schema(), "Customer")?;

    let mut scope = SessionScope::new(Arc::clone(&db));
    repository.create(
        scope.session(),
        serde_json::from_value(json!({"email": "a@b.com", "name": "A"}))?,
    )?;
    scope.teardown(true)?;

    let all = with_session(&db, |session| repository.get_all(session))?;
    assert!(all.is_empty());
    Ok(())
}
