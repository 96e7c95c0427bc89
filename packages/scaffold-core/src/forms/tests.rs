use super::*;
use crate::error::ScaffoldError;
use crate::schema::{EntitySchema, FieldDescriptor, Schema, ValueKind};
use crate::store::{Database, RecordKey};
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn person() -> EntitySchema {
    EntitySchema::new(
        "Person",
        vec![
            FieldDescriptor::required("firstname", ValueKind::Str).max_len(50),
            FieldDescriptor::optional("lastname", ValueKind::Str).max_len(50),
            FieldDescriptor::optional("age", ValueKind::Int).unsigned(),
            FieldDescriptor::optional("is_developer", ValueKind::Bool).default_value(false),
            FieldDescriptor::reference("account", "Account", false),
        ],
    )
    .unwrap()
}

fn account() -> EntitySchema {
    EntitySchema::new(
        "Account",
        vec![
            FieldDescriptor::required("login", ValueKind::Str).unique(),
            FieldDescriptor::collection("users", "Person"),
        ],
    )
    .unwrap()
}

fn people() -> Arc<Database> {
    Arc::new(Database::memory(Schema::new(vec![person(), account()]).unwrap()))
}

fn synthesize(entity: &EntitySchema) -> Arc<FormSpec> {
    Arc::new(
        FormSynthesizer::default()
            .synthesize(Some(entity), &FormOptions::default())
            .unwrap(),
    )
}

fn names(spec: &FormSpec) -> Vec<&str> {
    spec.widgets.iter().map(|w| w.name.as_str()).collect()
}

fn attrs(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

#[test]
fn test_widgets_follow_declaration_order() {
    let spec = synthesize(&person());
    assert_eq!(spec.name, "PersonForm");
    assert_eq!(
        names(&spec),
        ["firstname", "lastname", "age", "is_developer", "account"]
    );
    assert_eq!(spec.buttons, vec![Button::submit()]);

    let firstname = spec.widget("firstname").unwrap();
    assert_eq!(firstname.kind, WidgetKind::Text);
    assert_eq!(
        firstname.validators,
        vec![Validator::input_required(), Validator::length(None, Some(50))]
    );

    let age = spec.widget("age").unwrap();
    assert_eq!(age.kind, WidgetKind::Integer);
    assert_eq!(
        age.validators,
        vec![Validator::Optional, Validator::number_range(Some(0.0), None)]
    );

    let developer = spec.widget("is_developer").unwrap();
    assert_eq!(developer.kind, WidgetKind::Toggle);
    assert_eq!(developer.default, Some(json!(false)));

    let account = spec.widget("account").unwrap();
    assert_eq!(
        account.kind,
        WidgetKind::EntityPicker {
            entity: "Account".to_string(),
            allow_empty: true,
        }
    );
    assert_eq!(
        account.validators,
        vec![Validator::Optional, Validator::entity_exists("Account")]
    );
}

#[test]
fn test_collections_need_an_override() {
    let spec = synthesize(&account());
    assert_eq!(names(&spec), ["login"]);
    assert_eq!(
        spec.widget("login").unwrap().validators.last(),
        Some(&Validator::unique("Account", "login"))
    );

    let options = FormOptions::default().override_widget(
        "users",
        WidgetKind::MultiEntityPicker {
            entity: "Person".to_string(),
        },
    );
    let spec = FormSynthesizer::default()
        .synthesize(Some(&account()), &options)
        .unwrap();
    assert_eq!(names(&spec), ["login", "users"]);
}

#[test]
fn test_synthesis_is_deterministic() {
    let synthesizer = FormSynthesizer::default();
    let options = FormOptions::default().exclude("lastname");
    let first = synthesizer.synthesize(Some(&person()), &options).unwrap();
    let second = synthesizer.synthesize(Some(&person()), &options).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.widgets.len(), 4);
}

#[test]
fn test_primary_key_handling() {
    let country = EntitySchema::new(
        "Country",
        vec![
            FieldDescriptor::required("code", ValueKind::Str).primary_key(),
            FieldDescriptor::required("title", ValueKind::Str),
        ],
    )
    .unwrap();
    let synthesizer = FormSynthesizer::default();

    let skipped = synthesizer
        .synthesize(Some(&country), &FormOptions::default())
        .unwrap();
    assert_eq!(names(&skipped), ["title"]);

    let kept = synthesizer
        .synthesize(Some(&country), &FormOptions::default().keep_pk())
        .unwrap();
    assert_eq!(names(&kept), ["code", "title"]);
    assert!(kept.widget("code").unwrap().is_required());

    let auto = synthesizer
        .synthesize(Some(&person()), &FormOptions::default().keep_pk())
        .unwrap();
    assert!(auto.widget("id").is_none());
}

#[test]
fn test_missing_entity_is_configuration_error() {
    let err = FormSynthesizer::default()
        .synthesize(None, &FormOptions::default())
        .unwrap_err();
    assert!(matches!(err, ScaffoldError::Configuration(_)));
}

#[test]
fn test_unregistered_kind_fails_without_override() {
    let alarm = EntitySchema::new(
        "Alarm",
        vec![
            FieldDescriptor::required("label", ValueKind::Str),
            FieldDescriptor::required("ring_at", ValueKind::Time),
        ],
    )
    .unwrap();
    let synthesizer = FormSynthesizer::default();

    let err = synthesizer
        .synthesize(Some(&alarm), &FormOptions::default())
        .unwrap_err();
    assert_eq!(
        err,
        ScaffoldError::UnregisteredFieldKind {
            entity: "Alarm".to_string(),
            field: "ring_at".to_string(),
            kind: "time".to_string(),
        }
    );

    let options = FormOptions::default().override_widget("ring_at", WidgetKind::Text);
    let spec = synthesizer.synthesize(Some(&alarm), &options).unwrap();
    assert_eq!(spec.widget("ring_at").unwrap().kind, WidgetKind::Text);

    let schema = Schema::new(vec![alarm]).unwrap();
    assert!(ConverterRegistry::standard().check_schema(&schema).is_err());
    let registry = ConverterRegistry::standard().with(ValueKind::Time, |_, _| WidgetKind::Text);
    assert!(registry.check_schema(&schema).is_ok());
    assert_eq!(
        ConverterRegistry::standard().missing_kinds(),
        vec![ValueKind::Time, ValueKind::Bytes]
    );
}

#[test]
fn test_base_form_widgets_come_first() {
    let base = FormSpec {
        name: "BaseForm".to_string(),
        entity: String::new(),
        widgets: vec![
            WidgetSpec::new("captcha", WidgetKind::Text),
            WidgetSpec::new("lastname", WidgetKind::TextArea),
        ],
        fields: Vec::new(),
        buttons: Vec::new(),
    };
    let options = FormOptions::default().extend(base);
    let spec = FormSynthesizer::default()
        .synthesize(Some(&person()), &options)
        .unwrap();

    assert_eq!(
        names(&spec),
        ["captcha", "lastname", "firstname", "age", "is_developer", "account"]
    );
    assert_eq!(spec.widget("lastname").unwrap().kind, WidgetKind::Text);
    assert!(!spec.is_record_field("captcha"));
}

#[test]
fn test_numeric_range_bounds() {
    let gauge = EntitySchema::new(
        "Gauge",
        vec![FieldDescriptor::required("level", ValueKind::Int).range(Some(0.0), Some(10.0))],
    )
    .unwrap();
    let db = Arc::new(Database::memory(Schema::new(vec![gauge.clone()]).unwrap()));
    let spec = synthesize(&gauge);
    let session = db.session();

    for (raw, expected) in [("0", true), ("10", true), ("-1", false), ("11", false)] {
        let data: FormData = [("level", raw)].into_iter().collect();
        let mut form = Form::submit(Arc::clone(&spec), &data);
        assert_eq!(form.validate(&session, None).unwrap(), expected, "level={}", raw);
    }

    let data: FormData = [("level", "eleven")].into_iter().collect();
    let mut form = Form::submit(Arc::clone(&spec), &data);
    assert!(!form.validate(&session, None).unwrap());
    assert_eq!(form.errors()["level"], vec!["Not a valid integer value."]);
}

#[test]
fn test_presence_validation() {
    let db = people();
    let spec = synthesize(&person());
    let session = db.session();

    let mut form = Form::submit(Arc::clone(&spec), &FormData::new());
    assert!(!form.validate(&session, None).unwrap());
    let errors = form.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["firstname"], vec!["This field is required."]);

    let data: FormData = [("firstname", "Ada"), ("age", "")].into_iter().collect();
    let mut form = Form::submit(spec, &data);
    assert!(form.validate(&session, None).unwrap());
    let values = form.values();
    assert_eq!(values["firstname"], json!("Ada"));
    assert_eq!(values["age"], Value::Null);
    assert_eq!(values["is_developer"], json!(false));
    assert!(!values.contains_key("submit"));
}

#[test]
fn test_unique_validation_excludes_edited_record() {
    let db = people();
    let spec = synthesize(&account());
    let mut session = db.session();
    let existing = session
        .insert("Account", attrs(json!({"login": "ada"})))
        .unwrap();

    let data: FormData = [("login", "ada")].into_iter().collect();
    let mut create = Form::submit(Arc::clone(&spec), &data);
    assert!(!create.validate(&session, None).unwrap());
    assert_eq!(create.errors()["login"], vec!["This value is already in use."]);

    let mut edit = Form::submit(Arc::clone(&spec), &data);
    assert!(edit.validate(&session, Some(&existing.key)).unwrap());
}

#[test]
fn test_entity_picker_choices_and_existence() {
    let db = people();
    let spec = synthesize(&person());
    let mut session = db.session();
    session
        .insert("Account", attrs(json!({"login": "ada"})))
        .unwrap();

    let mut form = Form::new(Arc::clone(&spec));
    form.load_choices(&session).unwrap();
    let view = form.view();
    let account = view.fields.iter().find(|f| f.name == "account").unwrap();
    assert_eq!(
        account.choices,
        vec![
            Choice {
                value: String::new(),
                label: String::new(),
            },
            Choice {
                value: "1".to_string(),
                label: "ada".to_string(),
            },
        ]
    );

    let data: FormData = [("firstname", "Ada"), ("account", "1")].into_iter().collect();
    let mut form = Form::submit(Arc::clone(&spec), &data);
    assert!(form.validate(&session, None).unwrap());
    assert_eq!(form.data("account"), Some(&json!(1)));

    let data: FormData = [("firstname", "Ada"), ("account", "9")].into_iter().collect();
    let mut form = Form::submit(spec, &data);
    assert!(!form.validate(&session, None).unwrap());
    assert_eq!(form.errors()["account"], vec!["Entity not exists"]);
}

#[test]
fn test_with_record_populates_fields() {
    let db = people();
    let spec = synthesize(&person());
    let mut session = db.session();
    let record = session
        .insert("Person", attrs(json!({"firstname": "Ada", "age": 36})))
        .unwrap();

    let form = Form::with_record(spec, &record);
    assert_eq!(form.data("firstname"), Some(&json!("Ada")));
    assert_eq!(form.data("age"), Some(&json!(36)));
    assert_eq!(form.data("lastname"), Some(&Value::Null));
    assert!(!form.is_submitted());
}

#[test]
fn test_value_coercion() {
    let event = EntitySchema::new(
        "Event",
        vec![
            FieldDescriptor::optional("day", ValueKind::Date),
            FieldDescriptor::optional("starts", ValueKind::DateTime),
            FieldDescriptor::optional("price", ValueKind::Decimal),
            FieldDescriptor::optional("ratio", ValueKind::Float),
            FieldDescriptor::optional("extra", ValueKind::Json),
            FieldDescriptor::optional("public", ValueKind::Bool),
            FieldDescriptor::optional("token", ValueKind::Uuid),
        ],
    )
    .unwrap();
    let db = Arc::new(Database::memory(Schema::new(vec![event.clone()]).unwrap()));
    let spec = synthesize(&event);
    let session = db.session();

    let data: FormData = [
        ("day", "2024-02-29"),
        ("starts", "2024-02-29 09:30"),
        ("price", "10.50"),
        ("ratio", "0.25"),
        ("extra", r#"{"a": [1, 2]}"#),
        ("public", "on"),
        ("token", "not-a-uuid"),
    ]
    .into_iter()
    .collect();
    let mut form = Form::submit(Arc::clone(&spec), &data);
    assert!(!form.validate(&session, None).unwrap());
    assert_eq!(form.errors()["token"], vec!["Invalid UUID."]);
    assert_eq!(form.errors().len(), 1);

    let values = form.values();
    assert_eq!(values["day"], json!("2024-02-29"));
    assert_eq!(values["starts"], json!("2024-02-29T09:30:00"));
    assert_eq!(values["price"], json!("10.5"));
    assert_eq!(values["ratio"], json!(0.25));
    assert_eq!(values["extra"], json!({"a": [1, 2]}));
    assert_eq!(values["public"], json!(true));

    let data: FormData = [("day", "29/02/2024"), ("public", "off")].into_iter().collect();
    let mut form = Form::submit(spec, &data);
    assert!(!form.validate(&session, None).unwrap());
    assert_eq!(form.errors()["day"], vec!["Not a valid date value."]);
    assert_eq!(form.data("public"), Some(&json!(false)));
    let view = form.view();
    let day = view.fields.iter().find(|f| f.name == "day").unwrap();
    assert_eq!(day.value, json!("29/02/2024"));
}

#[test]
fn test_form_data_parsing() {
    let data = FormData::from_urlencoded("email=a%40b.com&name=Ada+L&tags=1&tags=2&empty=");
    assert_eq!(data.get("email"), Some("a@b.com"));
    assert_eq!(data.get("name"), Some("Ada L"));
    assert_eq!(data.get_all("tags"), vec!["1", "2"]);
    assert_eq!(data.get("empty"), Some(""));
    assert!(!data.contains("missing"));

    let data = FormData::from_json(&json!({
        "age": 3,
        "ok": true,
        "tags": [1, 2],
        "gone": null,
    }))
    .unwrap();
    assert_eq!(data.get("age"), Some("3"));
    assert_eq!(data.get("ok"), Some("true"));
    assert_eq!(data.get_all("tags"), vec!["1", "2"]);
    assert!(!data.contains("gone"));

    assert!(FormData::from_json(&json!([1, 2])).is_err());
}

#[test]
fn test_validator_messages() {
    assert_eq!(
        Validator::number_range(Some(0.0), Some(10.0)).message(),
        "Number must be between 0 and 10."
    );
    assert_eq!(
        Validator::length(None, Some(5)).message(),
        "Field cannot be longer than 5 character(s)."
    );
    assert_eq!(
        Validator::input_required().with_message("Need it").message(),
        "Need it"
    );
    assert_eq!(
        serde_json::to_value(Validator::Optional).unwrap(),
        json!({"type": "optional"})
    );
}

#[test]
fn test_multi_entity_picker_keys() {
    let db = people();
    let mut session = db.session();
    session
        .insert("Person", attrs(json!({"firstname": "Ada"})))
        .unwrap();

    let picker = WidgetKind::MultiEntityPicker {
        entity: "Person".to_string(),
    };
    let options = FormOptions::default().override_widget("users", picker);
    let spec = Arc::new(
        FormSynthesizer::default()
            .synthesize(Some(&account()), &options)
            .unwrap(),
    );

    let data: FormData = [("login", "ada"), ("users", "1")].into_iter().collect();
    let mut form = Form::submit(spec, &data);
    form.load_choices(&session).unwrap();
    assert!(form.validate(&session, None).unwrap());

    let record = session.insert("Account", form.values()).unwrap();
    assert_eq!(record.get("users"), Some(&json!([1])));
    assert_eq!(record.key, RecordKey::Int(1));
}

#[test]
fn test_unique_decimal_ignores_scale() {
    let payment = EntitySchema::new(
        "Payment",
        vec![FieldDescriptor::required("amount", ValueKind::Decimal).unique()],
    )
    .unwrap();
    let db = Arc::new(Database::memory(Schema::new(vec![payment.clone()]).unwrap()));
    let spec = synthesize(&payment);
    let mut session = db.session();

    let data: FormData = [("amount", "1.0")].into_iter().collect();
    let mut form = Form::submit(Arc::clone(&spec), &data);
    assert!(form.validate(&session, None).unwrap());
    session.insert("Payment", form.values()).unwrap();

    let data: FormData = [("amount", "1.00")].into_iter().collect();
    let mut form = Form::submit(Arc::clone(&spec), &data);
    assert!(!form.validate(&session, None).unwrap());
    assert_eq!(form.errors()["amount"], vec!["This value is already in use."]);
}
