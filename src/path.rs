//! Dotted field paths such as `people.0.name`.
//!
//! Numeric segments index into lists, all other segments name a field of a
//! record or a key of a mapping.

use std::fmt;
use std::str::FromStr;

use crate::config::Config;
use crate::error::{CoqpitError, Result};
use crate::value::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, "{name}"),
            Segment::Index(i) => write!(f, "{i}"),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
    pub fn field(&self, name: impl Into<String>) -> Self {
        self.child(Segment::Field(name.into()))
    }
    pub fn index(&self, i: usize) -> Self {
        self.child(Segment::Index(i))
    }
    fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl FromStr for FieldPath {
    type Err = CoqpitError;

    fn from_str(s: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for part in s.split('.') {
            if part.is_empty() {
                return Err(CoqpitError::path(s, "has an empty segment"));
            }
            let segment = if part.bytes().all(|b| b.is_ascii_digit()) {
                let i = part
                    .parse()
                    .map_err(|_| CoqpitError::path(s, format!("has an out of range index {part}")))?;
                Segment::Index(i)
            } else {
                Segment::Field(part.to_string())
            };
            segments.push(segment);
        }
        Ok(Self { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

// ------------- resolution over values -------------

pub fn get_in<'a>(root: &'a Value, path: &[Segment]) -> Result<&'a Value> {
    let mut current = root;
    for segment in path {
        current = match (current, segment) {
            (Value::Map(map), Segment::Field(key)) => map.get(key),
            (Value::Record(config), Segment::Field(name)) => Some(config.get_item(name)?),
            (Value::List(items), Segment::Index(i)) => items.get(*i),
            _ => None,
        }
        .ok_or_else(|| CoqpitError::path(join(path), format!("has no '{segment}'")))?;
    }
    Ok(current)
}

pub fn get_in_mut<'a>(root: &'a mut Value, path: &[Segment]) -> Result<&'a mut Value> {
    let mut current = root;
    for segment in path {
        current = match (current, segment) {
            (Value::Map(map), Segment::Field(key)) => map.get_mut(key),
            (Value::Record(config), Segment::Field(name)) => Some(config.value_mut(name)?),
            (Value::List(items), Segment::Index(i)) => items.get_mut(*i),
            _ => None,
        }
        .ok_or_else(|| CoqpitError::path(join(path), format!("has no '{segment}'")))?;
    }
    Ok(current)
}

/// Assign `value` at `path` below `root`. Every segment but the last has to
/// exist; list indices have to be in range.
pub fn set_in(root: &mut Value, path: &[Segment], value: Value) -> Result<()> {
    let Some((last, parent_path)) = path.split_last() else {
        *root = value;
        return Ok(());
    };
    let parent = get_in_mut(root, parent_path)?;
    match (parent, last) {
        (Value::Map(map), Segment::Field(key)) => {
            map.insert(key.clone(), value);
        }
        (Value::Record(config), Segment::Field(name)) => config.set_item(name, value),
        (Value::List(items), Segment::Index(i)) if *i < items.len() => items[*i] = value,
        (parent, _) => {
            return Err(CoqpitError::path(
                join(path),
                format!("cannot be assigned inside a {}", parent.type_name()),
            ));
        }
    }
    Ok(())
}

fn join(path: &[Segment]) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
}

// ------------- resolution over configs -------------

impl Config {
    pub fn get_path(&self, path: &FieldPath) -> Result<&Value> {
        match path.segments() {
            [Segment::Field(name), rest @ ..] => get_in(self.get_item(name)?, rest),
            _ => Err(CoqpitError::path(path, "has to start with a field name")),
        }
    }

    /// Assign below `self`. The first segment has to name an attribute the
    /// instance already has.
    pub fn set_path(&mut self, path: &FieldPath, value: Value) -> Result<()> {
        match path.segments() {
            [Segment::Field(name)] if self.has(name) => {
                self.set_item(name, value);
                Ok(())
            }
            [Segment::Field(name), rest @ ..] if !rest.is_empty() => {
                set_in(self.value_mut(name)?, rest, value)
            }
            [Segment::Field(name)] => Err(CoqpitError::NoKey(name.clone())),
            _ => Err(CoqpitError::path(path, "has to start with a field name")),
        }
    }
}
