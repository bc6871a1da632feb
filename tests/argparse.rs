use std::sync::Arc;

use coqpit::persist::parse_json;
use coqpit::{
    ArgumentCheck, Config, CoqpitError, Field, FieldType, FlagKind, ParserOptions, Schema, Value,
    check_argument,
};

fn simpler() -> Arc<Schema> {
    Schema::builder("SimplerConfig")
        .field(
            Field::new("val_a", FieldType::optional(FieldType::Int))
                .default(Value::Null)
                .help("this is val_a"),
        )
        .build()
        .expect("simpler schema")
}

fn simpler_with(schema: &Arc<Schema>, val_a: i64) -> Value {
    Config::with_values(schema, [("val_a", Value::from(val_a))]).expect("simpler").into()
}

fn json(text: &str) -> Value {
    parse_json(text).expect("json")
}

fn simple(simpler: &Arc<Schema>) -> Arc<Schema> {
    let items = {
        let simpler = Arc::clone(simpler);
        move || Value::List(vec![simpler_with(&simpler, 100), simpler_with(&simpler, 999)])
    };
    Schema::builder("SimpleConfig")
        .field(Field::new("val_a", FieldType::Int).default(10).help("this is val_a of SimpleConfig"))
        .field(Field::new("val_b", FieldType::optional(FieldType::Int)).default(Value::Null).help("this is val_b"))
        .field(Field::new("val_c", FieldType::Str).default("Coqpit is great!"))
        .field(Field::new("val_dict", FieldType::Mapping).default_factory(|| json(r#"{"val_a": 100, "val_b": 200, "val_c": 300}"#)))
        .field(
            Field::new("mylist_with_default", FieldType::list(FieldType::record(simpler)))
                .default_factory(items)
                .help("list of SimplerConfig"),
        )
        .field(Field::new("int_list", FieldType::list(FieldType::Int)).default_factory(|| json("[1, 2, 3]")))
        .field(Field::new("str_list", FieldType::list(FieldType::Str)).default_factory(|| json(r#"["veni", "vidi", "vici"]"#)))
        .field(Field::new("empty_int_list", FieldType::optional(FieldType::list(FieldType::Int))).default(Value::Null))
        .field(Field::new("empty_str_list", FieldType::optional(FieldType::list(FieldType::Str))).default(Value::Null))
        .field(Field::new("list_with_default_factory", FieldType::list(FieldType::Str)).default_factory(|| Value::List(vec![])))
        .field(
            Field::new("int_or_list", FieldType::union([FieldType::Int, FieldType::list(FieldType::Int)]))
                .default_factory(|| json("[1, 2, 3]")),
        )
        .field(Field::new("float_or_list", FieldType::union([FieldType::Float, FieldType::list(FieldType::Float)])).default(0.1))
        .field(
            Field::new("str_or_list", FieldType::union([FieldType::Str, FieldType::list(FieldType::Str), FieldType::None]))
                .default(Value::Null),
        )
        .field(
            Field::new("bool_or_list", FieldType::union([FieldType::Bool, FieldType::list(FieldType::Bool), FieldType::None]))
                .default(Value::Null),
        )
        .check(|c| {
            check_argument("val_a", c, &ArgumentCheck::new().restricted().min_val(10.0).max_val(2056.0))?;
            check_argument("val_b", c, &ArgumentCheck::new().restricted().min_val(128.0).max_val(4058.0))?;
            check_argument("val_c", c, &ArgumentCheck::new().restricted())
        })
        .build()
        .expect("simple schema")
}

fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

#[test]
fn parse_args_overrides_every_kind_of_field() {
    let simpler = simpler();
    let schema = simple(&simpler);
    let mut config = Config::new(&schema).expect("config");
    let argv = args(&[
        "--coqpit.val_a", "222",
        "--coqpit.val_b", "999",
        "--coqpit.val_c", "this is different",
        "--coqpit.val_dict", r#"{"val_a": 10, "val_b":20}"#,
        "--coqpit.mylist_with_default.0.val_a", "222",
        "--coqpit.mylist_with_default.1.val_a", "111",
        "--coqpit.empty_int_list", "111", "222", "333",
        "--coqpit.empty_str_list", "[foo=bar]", "[baz=qux]", "[blah,p=0.5,r=1~3]",
        "--coqpit.list_with_default_factory", "blah",
        "--coqpit.str_list.0", "neci",
        "--coqpit.int_list.1", "4",
        "--coqpit.int_or_list.0", "5",
        "--coqpit.float_or_list", "3.4",
        "--coqpit.str_or_list", "a", "b",
        "--coqpit.bool_or_list", "true",
    ]);
    config.parse_args(argv, &ParserOptions::default()).expect("parse");

    let reference = Config::with_values(
        &schema,
        [
            ("val_a", Value::from(222)),
            ("val_b", Value::from(999)),
            ("val_c", Value::from("this is different")),
            ("val_dict", json(r#"{"val_a": 10, "val_b": 20}"#)),
            (
                "mylist_with_default",
                Value::List(vec![simpler_with(&simpler, 222), simpler_with(&simpler, 111)]),
            ),
            ("empty_int_list", json("[111, 222, 333]")),
            ("empty_str_list", json(r#"["[foo=bar]", "[baz=qux]", "[blah,p=0.5,r=1~3]"]"#)),
            ("str_list", json(r#"["neci", "vidi", "vici"]"#)),
            ("int_list", json("[1, 4, 3]")),
            ("list_with_default_factory", json(r#"["blah"]"#)),
            ("int_or_list", json("[5, 2, 3]")),
            ("float_or_list", Value::from(3.4)),
            ("str_or_list", json(r#"["a", "b"]"#)),
            ("bool_or_list", json("[true]")),
        ],
    )
    .expect("reference");
    assert_eq!(config, reference);
}

#[test]
fn flags_follow_the_current_values() {
    let schema = simple(&simpler());
    let config = Config::new(&schema).expect("config");
    let parser = config.init_argparse(&ParserOptions::default()).expect("parser");
    let longs: Vec<&str> = parser.flags().iter().map(|f| f.long.as_str()).collect();
    assert!(longs.contains(&"coqpit.mylist_with_default.1.val_a"));
    assert!(longs.contains(&"coqpit.int_or_list.2"));
    assert!(!longs.contains(&"coqpit.int_or_list"));
    let kind = |long: &str| parser.flags().iter().find(|f| f.long == long).map(|f| f.kind);
    assert_eq!(kind("coqpit.val_dict"), Some(FlagKind::Json));
    assert_eq!(kind("coqpit.empty_int_list"), Some(FlagKind::Variadic));
    assert_eq!(kind("coqpit.float_or_list"), Some(FlagKind::Scalar));
    assert_eq!(kind("coqpit.str_or_list"), Some(FlagKind::Variadic));

    let help = parser.command().clone().render_help().to_string();
    assert!(help.contains("--coqpit.val_dict <JSON>"), "{help}");
    assert!(help.contains("--coqpit.val_b <INT>"), "{help}");
}

#[test]
fn prefix_can_be_changed_or_dropped() {
    let schema = simple(&simpler());
    let mut config = Config::new(&schema).expect("config");
    config
        .parse_args(["--train.val_a", "20"], &ParserOptions::default().with_prefix("train"))
        .expect("custom prefix");
    config
        .parse_args(["--val_c", "bare"], &ParserOptions::default().with_prefix(""))
        .expect("no prefix");
    assert_eq!(config.get_item("val_a").unwrap(), &Value::Int(20));
    assert_eq!(config.get_item("val_c").unwrap(), &Value::from("bare"));
}

#[test]
fn check_hook_runs_after_parsing() {
    let schema = simple(&simpler());
    let mut config = Config::new(&schema).expect("config");
    let err = config
        .parse_args(["--coqpit.val_a", "5"], &ParserOptions::default())
        .unwrap_err();
    assert!(matches!(err, CoqpitError::Check(ref m) if m.contains("smaller than min value")));
}

fn booleans() -> Arc<Schema> {
    Schema::builder("Config")
        .field(Field::new("boolean_without_default", FieldType::Bool))
        .field(Field::new("boolean_with_default", FieldType::Bool).default(false))
        .build()
        .expect("schema")
}

#[test]
fn booleans_take_true_or_false() {
    let schema = booleans();
    let mut config = Config::with_values(&schema, [("boolean_without_default", Value::from(true))]).expect("config");
    config
        .parse_args(
            ["--coqpit.boolean_without_default", "false", "--coqpit.boolean_with_default", "true"],
            &ParserOptions::default(),
        )
        .expect("parse");
    let reference = Config::with_values(
        &schema,
        [
            ("boolean_without_default", Value::from(false)),
            ("boolean_with_default", Value::from(true)),
        ],
    )
    .expect("reference");
    assert_eq!(config, reference);

    let err = config
        .parse_args(
            ["--coqpit.boolean_without_default", "blargh", "--coqpit.boolean_with_default", "true"],
            &ParserOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, CoqpitError::Args(_)));
}

#[test]
fn required_fields_come_from_the_command_line() {
    let schema = Schema::builder("ArgparseWithRequiredField")
        .field(Field::new("val_a", FieldType::Int))
        .build()
        .expect("schema");
    assert!(matches!(Config::new(&schema).unwrap_err(), CoqpitError::MissingArgument { .. }));
    let config = schema
        .init_from_argparse(["--coqpit.val_a", "10"], &ParserOptions::default())
        .expect("from argparse");
    assert_eq!(config.get_item("val_a").unwrap(), &Value::Int(10));
    assert!(matches!(
        schema.init_from_argparse(Vec::<String>::new(), &ParserOptions::default()).unwrap_err(),
        CoqpitError::MissingArgument { .. }
    ));
}

#[test]
fn init_from_argparse_reaches_nested_records() {
    let simpler = simpler();
    let nested_default = Config::new(&simpler).expect("nested default");
    let items = {
        let simpler = Arc::clone(&simpler);
        move || Value::List(vec![simpler_with(&simpler, 100), simpler_with(&simpler, 999)])
    };
    let schema = Schema::builder("SimpleConfig2")
        .field(Field::new("val_req", FieldType::Str))
        .field(Field::new("val_a", FieldType::Int).default(10))
        .field(Field::new("val_b", FieldType::optional(FieldType::Int)).default(Value::Null))
        .field(
            Field::new("nested_config", FieldType::record(&simpler))
                .default_factory(move || nested_default.clone().into()),
        )
        .field(Field::new("mylist_with_default", FieldType::list(FieldType::record(&simpler))).default_factory(items))
        .check(|c| {
            check_argument("val_a", c, &ArgumentCheck::new().restricted().min_val(10.0).max_val(2056.0))?;
            check_argument("val_b", c, &ArgumentCheck::new().restricted().min_val(128.0).max_val(4058.0))?;
            check_argument("val_req", c, &ArgumentCheck::new().restricted())
        })
        .build()
        .expect("schema");

    let parsed = schema
        .init_from_argparse(
            [
                "--coqpit.val_req", "this is different",
                "--coqpit.val_a", "222",
                "--coqpit.val_b", "999",
                "--coqpit.nested_config.val_a", "333",
                "--coqpit.mylist_with_default.0.val_a", "222",
                "--coqpit.mylist_with_default.1.val_a", "111",
            ],
            &ParserOptions::default(),
        )
        .expect("from argparse");
    let reference = Config::with_values(
        &schema,
        [
            ("val_req", Value::from("this is different")),
            ("val_a", Value::from(222)),
            ("val_b", Value::from(999)),
            ("nested_config", simpler_with(&simpler, 333)),
            (
                "mylist_with_default",
                Value::List(vec![simpler_with(&simpler, 222), simpler_with(&simpler, 111)]),
            ),
        ],
    )
    .expect("reference");
    assert_eq!(parsed, reference);
}

fn relaxed_schema() -> Arc<Schema> {
    Schema::builder("SimpleConfig")
        .field(Field::new("val_a", FieldType::Int).default(10))
        .field(Field::new("val_b", FieldType::optional(FieldType::Int)).default(Value::Null))
        .field(
            Field::new("val_c", FieldType::union([FieldType::Int, FieldType::Str, FieldType::None]))
                .default(Value::Null),
        )
        .field(
            Field::new("val_d", FieldType::optional(FieldType::list(FieldType::list(FieldType::Any))))
                .default(Value::Null),
        )
        .build()
        .expect("schema")
}

#[test]
fn relaxed_parsing_returns_unknown_arguments() {
    let schema = relaxed_schema();
    let mut config = Config::new(&schema).expect("config");
    let unknown = config
        .parse_known_args(
            [
                "--coqpit.val_a", "222",
                "--coqpit.val_b", "999",
                "--coqpit.arg_does_not_exist", "111",
            ],
            &ParserOptions::relaxed(),
        )
        .expect("parse known");
    assert_eq!(unknown, ["--coqpit.arg_does_not_exist", "111"]);
    let reference = Config::with_values(&schema, [("val_a", Value::from(222)), ("val_b", Value::from(999))])
        .expect("reference");
    assert_eq!(config, reference);
}

#[test]
fn unknown_short_flags_are_returned() {
    let schema = relaxed_schema();
    let mut config = Config::new(&schema).expect("config");
    let unknown = config
        .parse_known_args(["--coqpit.val_a", "3", "-x", "5"], &ParserOptions::relaxed())
        .expect("parse known");
    assert_eq!(unknown, ["-x", "5"]);
    assert_eq!(config.get_item("val_a").unwrap(), &Value::Int(3));

    // negative numbers still belong to the flag before them
    let unknown = config
        .parse_known_args(["--coqpit.val_a", "-4"], &ParserOptions::relaxed())
        .expect("parse known");
    assert!(unknown.is_empty());
    assert_eq!(config.get_item("val_a").unwrap(), &Value::Int(-4));
}

#[test]
fn strict_parsing_rejects_what_it_cannot_express() {
    let schema = relaxed_schema();
    let config = Config::new(&schema).expect("config");
    assert!(matches!(
        config.init_argparse(&ParserOptions::default()).err(),
        Some(CoqpitError::Unsupported(_))
    ));

    let unions = Schema::builder("Unions")
        .field(Field::new("either", FieldType::union([FieldType::Int, FieldType::Str])).default(1))
        .build()
        .expect("schema");
    let config = Config::new(&unions).expect("config");
    assert!(config.init_argparse(&ParserOptions::default()).is_err());
    let parser = config.init_argparse(&ParserOptions::relaxed()).expect("relaxed");
    assert!(parser.flags().is_empty());
}

#[test]
fn literal_and_path_flags() {
    let schema = Schema::builder("Run")
        .field(
            Field::new("mode", FieldType::literal([Value::from("train"), Value::from("eval")]))
                .default("train"),
        )
        .field(Field::new("level", FieldType::literal([Value::from(1), Value::from(2)])).default(1))
        .field(Field::new("out", FieldType::optional(FieldType::Path)).default(Value::Null))
        .build()
        .expect("schema");
    let mut config = Config::new(&schema).expect("config");
    config
        .parse_args(
            ["--coqpit.mode", "eval", "--coqpit.level", "2", "--coqpit.out", "runs/1"],
            &ParserOptions::default(),
        )
        .expect("parse");
    assert_eq!(config.get_item("mode").unwrap(), &Value::from("eval"));
    assert_eq!(config.get_item("level").unwrap(), &Value::Int(2));
    assert_eq!(config.get_item("out").unwrap(), &Value::Path("runs/1".into()));
    assert!(config
        .parse_args(["--coqpit.mode", "test"], &ParserOptions::default())
        .is_err());
}
