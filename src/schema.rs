//! Record types as explicit schema tables.
//!
//! A [`Schema`] is the ordered list of [`Field`]s a record type declares.
//! Each field carries its declared [`FieldType`], a default (a value, a
//! factory, the MISSING sentinel, or nothing at all for required fields),
//! a help text and an optional contract predicate.

use std::fmt;
use std::sync::Arc;

// so regular expressions don't have to be recompiled
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::config::Config;
use crate::engine::deserialize;
use crate::error::{CoqpitError, Result};
use crate::types::FieldType;
use crate::value::{Mapping, Value};

/// Wire form of the "must be set before first read" sentinel.
pub const MISSING: &str = "???";

pub type Contract = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
pub type Factory = Arc<dyn Fn() -> Value + Send + Sync>;
pub type Check = Arc<dyn Fn(&Config) -> Result<()> + Send + Sync>;

lazy_static! {
    static ref FIELD_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

#[derive(Clone)]
pub enum FieldDefault {
    /// No default; the field has to be supplied.
    Required,
    /// The MISSING sentinel; the field has to be assigned before it is read.
    Missing,
    Value(Value),
    Factory(Factory),
}

impl FieldDefault {
    /// The value a fresh instance starts with, if the default provides one.
    /// Factory output is coerced against `field_type`; plain values were
    /// already coerced when the schema was built.
    pub fn materialize(&self, field_type: &FieldType) -> Result<Option<Value>> {
        match self {
            FieldDefault::Value(v) => Ok(Some(v.clone())),
            FieldDefault::Factory(f) => coerce_default(&f(), field_type).map(Some),
            FieldDefault::Required | FieldDefault::Missing => Ok(None),
        }
    }
}

// A null default on a non-optional field is left for the contract check.
fn coerce_default(value: &Value, field_type: &FieldType) -> Result<Value> {
    if value.is_null() {
        Ok(Value::Null)
    } else {
        deserialize(value, field_type)
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldDefault::Required => write!(f, "Required"),
            FieldDefault::Missing => write!(f, "Missing"),
            FieldDefault::Value(v) => write!(f, "Value({v:?})"),
            FieldDefault::Factory(_) => write!(f, "Factory(..)"),
        }
    }
}

// ------------- Field -------------
#[derive(Clone)]
pub struct Field {
    name: String,
    field_type: FieldType,
    default: FieldDefault,
    help: String,
    contract: Option<Contract>,
}

impl Field {
    /// A required field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: FieldDefault::Required,
            help: String::new(),
            contract: None,
        }
    }
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = FieldDefault::Value(value.into());
        self
    }
    pub fn default_factory(mut self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = FieldDefault::Factory(Arc::new(factory));
        self
    }
    /// Marks the field as MISSING: instances start without a readable value.
    pub fn missing(mut self) -> Self {
        self.default = FieldDefault::Missing;
        self
    }
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }
    pub fn contract(mut self, contract: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.contract = Some(Arc::new(contract));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }
    pub fn default_value(&self) -> &FieldDefault {
        &self.default
    }
    /// The field's default, coerced to its declared type.
    pub fn initial_value(&self) -> Result<Option<Value>> {
        self.default.materialize(&self.field_type)
    }
    pub fn help_text(&self) -> &str {
        &self.help
    }
    pub fn contract_fn(&self) -> Option<&Contract> {
        self.contract.as_ref()
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("field_type", &self.field_type.to_string())
            .field("default", &self.default)
            .field("help", &self.help)
            .field("contract", &self.contract.is_some())
            .finish()
    }
}

// ------------- Schema -------------
pub struct Schema {
    name: String,
    fields: Vec<Field>,
    check: Option<Check>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
            check: None,
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
    pub(crate) fn check_hook(&self) -> Option<&Check> {
        self.check.as_ref()
    }
    pub(crate) fn with_fields(name: String, fields: Vec<Field>, check: Option<Check>) -> Self {
        Self { name, fields, check }
    }

    /// Build a fresh instance from a wire mapping, coercing every supplied
    /// field against its declared type. Absent fields fall back to their
    /// default; an absent field without one is an error.
    pub fn deserialize_new(self: &Arc<Self>, data: &Value) -> Result<Config> {
        let Value::Map(data) = data else {
            return Err(CoqpitError::mismatch(data, &FieldType::Record(Arc::clone(self))));
        };
        let mut values = Mapping::new();
        for field in &self.fields {
            let value = match data.get(&field.name) {
                None => field.initial_value()?.ok_or_else(|| CoqpitError::MissingField {
                    field: field.name.clone(),
                })?,
                Some(Value::Null) => Value::Null,
                Some(Value::Str(s)) if s == MISSING => {
                    return Err(CoqpitError::UnknownValue {
                        field: field.name.clone(),
                        record: self.name.clone(),
                    });
                }
                Some(value) => deserialize(value, &field.field_type)?,
            };
            values.insert(field.name.clone(), value);
        }
        debug!(record = %self.name, fields = values.len(), "deserialized new record");
        Config::with_values(self, values)
    }

    pub fn new_from_dict(self: &Arc<Self>, data: &Value) -> Result<Config> {
        self.deserialize_new(data)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
    check: Option<Check>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
    /// Cross-field check run after construction, loading and argument parsing.
    pub fn check(mut self, check: impl Fn(&Config) -> Result<()> + Send + Sync + 'static) -> Self {
        self.check = Some(Arc::new(check));
        self
    }
    pub fn build(mut self) -> Result<Arc<Schema>> {
        for (i, field) in self.fields.iter().enumerate() {
            if !FIELD_NAME.is_match(&field.name) {
                return Err(CoqpitError::Schema(format!(
                    "'{}' in {} is not a valid field name",
                    field.name, self.name
                )));
            }
            if self.fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CoqpitError::Schema(format!(
                    "duplicate field '{}' in {}",
                    field.name, self.name
                )));
            }
        }
        for field in &mut self.fields {
            if let FieldDefault::Value(value) = &field.default {
                let value = coerce_default(value, &field.field_type)?;
                field.default = FieldDefault::Value(value);
            }
        }
        Ok(Arc::new(Schema {
            name: self.name,
            fields: self.fields,
            check: self.check,
        }))
    }
}
