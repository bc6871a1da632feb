//! Declared field types and the predicates the engine dispatches on.
//!
//! A [`FieldType`] is a closed descriptor built once per schema. Optional
//! types are not a variant of their own: `FieldType::optional(t)` is the
//! union `t | None`, and [`is_optional`] recognises it.

use std::fmt;
use std::sync::Arc;

use crate::schema::Schema;
use crate::value::Value;

#[derive(Clone, Debug)]
pub enum FieldType {
    Bool,
    Int,
    Float,
    Str,
    /// The absence marker, meaningful as a union arm.
    None,
    Path,
    /// Placeholder for "whatever the value turns out to be".
    Any,
    /// Generic list. Exactly one parameter is supported; other arities are
    /// reported when a value is deserialized against the type.
    List(Vec<FieldType>),
    /// String-keyed mapping whose values keep their own runtime type.
    Mapping,
    Union(Vec<FieldType>),
    Literal(Vec<Value>),
    Record(Arc<Schema>),
}

impl FieldType {
    pub fn list(element: FieldType) -> Self {
        FieldType::List(vec![element])
    }
    pub fn optional(inner: FieldType) -> Self {
        FieldType::Union(vec![inner, FieldType::None])
    }
    pub fn union(arms: impl IntoIterator<Item = FieldType>) -> Self {
        FieldType::Union(arms.into_iter().collect())
    }
    pub fn literal(candidates: impl IntoIterator<Item = Value>) -> Self {
        FieldType::Literal(candidates.into_iter().collect())
    }
    pub fn record(schema: &Arc<Schema>) -> Self {
        FieldType::Record(Arc::clone(schema))
    }

    /// The type a value carries at runtime, used where no declared type
    /// exists (mapping values, `Any` list elements).
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => FieldType::None,
            Value::Bool(_) => FieldType::Bool,
            Value::Int(_) => FieldType::Int,
            Value::Float(_) => FieldType::Float,
            Value::Str(_) => FieldType::Str,
            Value::Path(_) => FieldType::Path,
            Value::List(_) => FieldType::list(FieldType::Any),
            Value::Map(_) => FieldType::Mapping,
            Value::Record(config) => FieldType::Record(Arc::clone(config.schema())),
        }
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldType::List(a), FieldType::List(b)) | (FieldType::Union(a), FieldType::Union(b)) => a == b,
            (FieldType::Literal(a), FieldType::Literal(b)) => a == b,
            // record types are nominal
            (FieldType::Record(a), FieldType::Record(b)) => Arc::ptr_eq(a, b) || a.name() == b.name(),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldType::Bool => write!(f, "bool"),
            FieldType::Int => write!(f, "int"),
            FieldType::Float => write!(f, "float"),
            FieldType::Str => write!(f, "str"),
            FieldType::None => write!(f, "None"),
            FieldType::Path => write!(f, "Path"),
            FieldType::Any => write!(f, "Any"),
            FieldType::Mapping => write!(f, "dict"),
            FieldType::List(params) if params.is_empty() => write!(f, "list"),
            FieldType::List(params) => write!(f, "list[{}]", join(params, ", ")),
            FieldType::Union(arms) => write!(f, "{}", join(arms, " | ")),
            FieldType::Literal(candidates) => {
                let shown: Vec<String> = candidates.iter().map(literal_repr).collect();
                write!(f, "Literal[{}]", shown.join(", "))
            }
            FieldType::Record(schema) => write!(f, "{}", schema.name()),
        }
    }
}

fn join(types: &[FieldType], sep: &str) -> String {
    types.iter().map(ToString::to_string).collect::<Vec<_>>().join(sep)
}

fn literal_repr(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

// ------------- Predicates -------------

/// True for exactly `bool`, `int`, `float` and `str`.
pub fn is_primitive(t: &FieldType) -> bool {
    matches!(t, FieldType::Bool | FieldType::Int | FieldType::Float | FieldType::Str)
}

pub fn is_list(t: &FieldType) -> bool {
    matches!(t, FieldType::List(_))
}

pub fn is_mapping(t: &FieldType) -> bool {
    matches!(t, FieldType::Mapping)
}

/// True for any union, the `X | None` form included.
pub fn is_union(t: &FieldType) -> bool {
    matches!(t, FieldType::Union(_))
}

/// True for unions other than the two-armed `X | None` shape, which
/// needs no trial deserialization.
pub fn is_union_and_not_simple_optional(t: &FieldType) -> bool {
    match t {
        FieldType::Union(arms) => !(arms.len() == 2 && arms.contains(&FieldType::None)),
        _ => false,
    }
}

pub fn is_optional(t: &FieldType) -> bool {
    match t {
        FieldType::Union(arms) => arms.contains(&FieldType::None),
        _ => false,
    }
}

/// `str | int | None` becomes `str | int`; `int | None` becomes bare `int`.
pub fn drop_absence_marker(t: &FieldType) -> FieldType {
    match t {
        FieldType::Union(arms) => {
            let mut kept: Vec<FieldType> = arms
                .iter()
                .filter(|arm| **arm != FieldType::None)
                .cloned()
                .collect();
            if kept.len() == 1 {
                kept.remove(0)
            } else {
                FieldType::Union(kept)
            }
        }
        other => other.clone(),
    }
}

pub fn literal_candidates(t: &FieldType) -> &[Value] {
    match t {
        FieldType::Literal(candidates) => candidates,
        _ => &[],
    }
}

/// For `list[X] | X` (either order, `None` arms ignored) returns `X`.
pub fn list_element_if_homogeneous_union_of_list_and_scalar(t: &FieldType) -> Option<FieldType> {
    let FieldType::Union(arms) = drop_absence_marker(t) else {
        return None;
    };
    match arms.as_slice() {
        [FieldType::List(params), scalar] | [scalar, FieldType::List(params)]
            if params.len() == 1 && params[0] == *scalar =>
        {
            Some(scalar.clone())
        }
        _ => None,
    }
}
