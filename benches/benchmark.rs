use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use coqpit::{Config, Field, FieldType, Schema, Value, engine};

// ------------- Group of people -------------
fn person_schema() -> Arc<Schema> {
    Schema::builder("Person")
        .field(Field::new("name", FieldType::Str))
        .field(Field::new("age", FieldType::Int))
        .build()
        .unwrap()
}

fn group_schema(person: &Arc<Schema>) -> Arc<Schema> {
    Schema::builder("Group")
        .field(Field::new("name", FieldType::Str))
        .field(Field::new("size", FieldType::Int))
        .field(Field::new("people", FieldType::list(FieldType::record(person))))
        .field(Field::new("some_dict", FieldType::Mapping).default(Value::Map(Default::default())))
        .build()
        .unwrap()
}

fn group(person: &Arc<Schema>, group: &Arc<Schema>, size: usize) -> Config {
    let people: Vec<Value> = (0..size)
        .map(|i| {
            Config::with_values(person, [("name", Value::from(format!("person {i}"))), ("age", Value::from(i as i64))])
                .unwrap()
                .into()
        })
        .collect();
    Config::with_values(
        group,
        [
            ("name", Value::from("group")),
            ("size", Value::from(size as i64)),
            ("people", Value::List(people)),
        ],
    )
    .unwrap()
}

fn criterion_benchmark(c: &mut Criterion) {
    let person = person_schema();
    let schema = group_schema(&person);
    for size in [1, 100, 10_000] {
        let config = group(&person, &schema, size);
        let wire = config.serialize().unwrap();
        c.bench_function(&format!("serialize {size}"), |b| b.iter(|| black_box(&config).serialize()));
        c.bench_function(&format!("deserialize {size}"), |b| {
            b.iter(|| schema.deserialize_new(black_box(&wire)))
        });
        c.bench_function(&format!("json {size}"), |b| b.iter(|| black_box(&config).to_json()));
    }
    let union = FieldType::union([FieldType::Int, FieldType::list(FieldType::Int), FieldType::Str]);
    let text = Value::from("not a number");
    c.bench_function("union last arm", |b| b.iter(|| engine::deserialize(black_box(&text), &union)));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
