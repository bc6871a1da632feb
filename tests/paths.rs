use std::sync::Arc;

use coqpit::{Config, CoqpitError, Field, FieldPath, FieldType, Schema, Segment, Value};

fn setup() -> Config {
    let inner = Schema::builder("Inner")
        .field(Field::new("val", FieldType::Int).default(1))
        .field(Field::new("tags", FieldType::list(FieldType::Str)).default_factory(|| {
            Value::List(vec![Value::from("a"), Value::from("b")])
        }))
        .build()
        .expect("inner schema");
    let items = {
        let inner = Arc::clone(&inner);
        move || {
            let item: Value = Config::new(&inner).expect("inner").into();
            Value::List(vec![item])
        }
    };
    let default_inner = Config::new(&inner).expect("inner");
    let outer = Schema::builder("Outer")
        .field(Field::new("inner", FieldType::record(&inner)).default_factory(move || default_inner.clone().into()))
        .field(Field::new("items", FieldType::list(FieldType::record(&inner))).default_factory(items))
        .field(Field::new("lookup", FieldType::Mapping).default_factory(|| {
            Value::Map([("k", Value::from(2))].into_iter().collect())
        }))
        .build()
        .expect("outer schema");
    Config::new(&outer).expect("outer")
}

fn path(s: &str) -> FieldPath {
    s.parse().expect("path")
}

#[test]
fn parsing_and_display() {
    let p = path("items.0.tags.1");
    assert_eq!(
        p.segments(),
        &[
            Segment::Field("items".into()),
            Segment::Index(0),
            Segment::Field("tags".into()),
            Segment::Index(1),
        ]
    );
    assert_eq!(p.to_string(), "items.0.tags.1");
    assert_eq!(FieldPath::new().field("a").index(3), path("a.3"));
    assert!("a..b".parse::<FieldPath>().is_err());
}

#[test]
fn get_through_records_lists_and_mappings() {
    let config = setup();
    assert_eq!(config.get_path(&path("inner.val")).unwrap(), &Value::Int(1));
    assert_eq!(config.get_path(&path("items.0.tags.1")).unwrap(), &Value::from("b"));
    assert_eq!(config.get_path(&path("lookup.k")).unwrap(), &Value::Int(2));
    assert!(matches!(
        config.get_path(&path("items.5")).unwrap_err(),
        CoqpitError::Path { .. }
    ));
    assert!(config.get_path(&path("0")).is_err());
}

#[test]
fn set_through_records_lists_and_mappings() {
    let mut config = setup();
    config.set_path(&path("inner.val"), Value::from(9)).expect("record field");
    config.set_path(&path("items.0.tags.0"), Value::from("z")).expect("list index");
    config.set_path(&path("lookup.new"), Value::from(true)).expect("mapping key");
    assert_eq!(config.get_path(&path("inner.val")).unwrap(), &Value::Int(9));
    assert_eq!(config.get_path(&path("items.0.tags.0")).unwrap(), &Value::from("z"));
    assert_eq!(config.get_path(&path("lookup.new")).unwrap(), &Value::Bool(true));

    // list indices have to exist already
    assert!(config.set_path(&path("items.0.tags.7"), Value::from("x")).is_err());
    // a top-level name has to be an existing attribute
    assert!(matches!(
        config.set_path(&path("unknown"), Value::from(1)).unwrap_err(),
        CoqpitError::NoKey(_)
    ));
    // assignment is not coerced
    config.set_path(&path("inner.val"), Value::from("text")).expect("raw assignment");
    assert!(config.validate().is_err());
}
