//! The type-directed coercion engine.
//!
//! [`deserialize`] turns a wire value into the live value a field of the
//! given declared type holds; [`serialize`] walks a live value back into
//! wire form. The two are kept in lock-step so that
//! `serialize(deserialize(x, t)) == x` whenever `x` inhabits `t`.

use std::path::PathBuf;

use tracing::trace;

use crate::error::{CoqpitError, Result};
use crate::schema::Schema;
use crate::types::{
    FieldType, drop_absence_marker, is_list, is_mapping, is_optional, is_primitive,
    is_union_and_not_simple_optional,
};
use crate::value::{Mapping, Value};

/// Coerce `value` into the shape required by `declared`.
pub fn deserialize(value: &Value, declared: &FieldType) -> Result<Value> {
    if value.is_null() && is_optional(declared) {
        return Ok(Value::Null);
    }
    let field_type = drop_absence_marker(declared);
    if is_mapping(&field_type) {
        return deserialize_mapping(value, declared);
    }
    if is_list(&field_type) {
        return deserialize_list(value, &field_type);
    }
    match &field_type {
        FieldType::Literal(candidates) => deserialize_literal(value, candidates, declared),
        FieldType::Union(arms) if is_union_and_not_simple_optional(&field_type) => {
            deserialize_union(value, arms)
        }
        FieldType::Record(schema) => match value {
            Value::Map(_) => Ok(Value::Record(Schema::deserialize_new(schema, value)?)),
            Value::Record(config) if config.schema().name() == schema.name() => Ok(value.clone()),
            _ => Err(CoqpitError::mismatch(value, declared)),
        },
        FieldType::Path => match value {
            Value::Str(s) => Ok(Value::Path(PathBuf::from(s))),
            Value::Path(p) => Ok(Value::Path(p.clone())),
            _ => Err(CoqpitError::mismatch(value, declared)),
        },
        // placeholder types read a value back by the type it already has
        FieldType::Any => match value {
            Value::Null | Value::Record(_) => Ok(value.clone()),
            _ => deserialize(value, &FieldType::of(value)),
        },
        t if is_primitive(t) => deserialize_primitive(value, t),
        _ => Err(CoqpitError::mismatch(value, declared)),
    }
}

/// Values have no declared type of their own, so each one is read back by
/// the type it already has.
fn deserialize_mapping(value: &Value, declared: &FieldType) -> Result<Value> {
    let Value::Map(map) = value else {
        return Err(CoqpitError::mismatch(value, declared));
    };
    let mut out = Mapping::new();
    for (key, item) in map.iter() {
        let item = match item {
            Value::Null => Value::Null,
            _ => deserialize(item, &FieldType::of(item))?,
        };
        out.insert(key, item);
    }
    Ok(Value::Map(out))
}

fn deserialize_list(value: &Value, field_type: &FieldType) -> Result<Value> {
    let FieldType::List(params) = field_type else {
        return Err(CoqpitError::mismatch(value, field_type));
    };
    let element_type = match params.as_slice() {
        [element] => element,
        [] => {
            return Err(CoqpitError::Shape(
                "un-hinted 'list' fields are not supported".into(),
            ));
        }
        _ => {
            return Err(CoqpitError::Shape(format!(
                "multi-type hinted '{field_type}' is not supported"
            )));
        }
    };
    let Value::List(items) = value else {
        return Err(CoqpitError::mismatch(value, field_type));
    };
    items
        .iter()
        .map(|item| deserialize(item, element_type))
        .collect::<Result<Vec<_>>>()
        .map(Value::List)
}

// Value equality already separates Bool(true) from Int(1).
fn deserialize_literal(value: &Value, candidates: &[Value], declared: &FieldType) -> Result<Value> {
    if candidates.iter().any(|c| c == value) {
        Ok(value.clone())
    } else {
        Err(CoqpitError::Literal {
            value: value.to_string(),
            field_type: declared.to_string(),
        })
    }
}

fn deserialize_union(value: &Value, arms: &[FieldType]) -> Result<Value> {
    let mut last_error = None;
    for arm in arms {
        match deserialize(value, arm) {
            Ok(v) => return Ok(v),
            Err(e) => {
                trace!(arm = %arm, error = %e, "union arm rejected value");
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| CoqpitError::mismatch(value, &FieldType::Union(arms.to_vec()))))
}

/// Strings and booleans never turn into numbers or into each other.
/// Numbers convert between `int` and `float`, except that infinities stay
/// floats even against an `int` field.
pub fn deserialize_primitive(value: &Value, target: &FieldType) -> Result<Value> {
    match (value, target) {
        (Value::Str(_), FieldType::Str) | (Value::Bool(_), FieldType::Bool) => Ok(value.clone()),
        (Value::Float(x), FieldType::Int | FieldType::Float) if x.is_infinite() => Ok(value.clone()),
        (Value::Int(i), FieldType::Int) => Ok(Value::Int(*i)),
        (Value::Int(i), FieldType::Float) => Ok(Value::Float(*i as f64)),
        (Value::Float(x), FieldType::Float) => Ok(Value::Float(*x)),
        (Value::Float(x), FieldType::Int) => {
            let truncated = x.trunc();
            if x.is_nan() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                Err(CoqpitError::mismatch(value, target))
            } else {
                Ok(Value::Int(truncated as i64))
            }
        }
        _ => Err(CoqpitError::mismatch(value, target)),
    }
}

/// Walk a live value into its wire form.
pub fn serialize(value: &Value) -> Result<Value> {
    match value {
        Value::Path(p) => Ok(Value::Str(p.to_string_lossy().into_owned())),
        Value::Map(map) => {
            let mut out = Mapping::new();
            for (key, item) in map.iter() {
                out.insert(key, serialize(item)?);
            }
            Ok(Value::Map(out))
        }
        Value::List(items) => items
            .iter()
            .map(serialize)
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Value::Record(config) => config.serialize(),
        other => Ok(other.clone()),
    }
}
