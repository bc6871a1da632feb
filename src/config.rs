//! Config instances: one slot per schema field plus the record contract.
//!
//! A [`Config`] goes through construction (values assigned as given),
//! validation (null legality, contracts, the schema's check hook) and is
//! then freely mutable. Mutation never re-validates on its own; call
//! [`Config::validate`] or [`Config::check_values`] for that.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::engine::{self, deserialize};
use crate::error::{CoqpitError, Result};
use crate::schema::{Field, FieldDefault, MISSING, Schema};
use crate::types::{FieldType, is_optional};
use crate::value::{Mapping, Value};

#[derive(Clone, Debug, PartialEq)]
enum Slot {
    Set(Value),
    /// MISSING sentinel: reading is an error until something is assigned.
    Missing,
    /// Removed through `del_item`.
    Unset,
}

#[derive(Clone)]
pub struct Config {
    schema: Arc<Schema>,
    slots: Vec<Slot>,
    extras: Mapping,
    initialized: bool,
}

impl Config {
    /// An instance holding every field's default.
    pub fn new(schema: &Arc<Schema>) -> Result<Self> {
        Self::with_values(schema, Mapping::new())
    }

    /// An instance built from the given values, which are taken as they are
    /// (no coercion). Fields not given start from their default.
    pub fn with_values<K, I>(schema: &Arc<Schema>, values: I) -> Result<Self>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut given: Mapping = values.into_iter().collect();
        let mut slots = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let slot = match given.remove(field.name()) {
                Some(value) => Slot::Set(value),
                None => match field.default_value() {
                    FieldDefault::Required => {
                        return Err(CoqpitError::MissingArgument {
                            field: field.name().to_string(),
                        });
                    }
                    FieldDefault::Missing => Slot::Missing,
                    _ => Slot::Set(field.initial_value()?.unwrap_or(Value::Null)),
                },
            };
            slots.push(slot);
        }
        if let Some(unknown) = given.keys().next() {
            return Err(CoqpitError::NoKey(unknown.to_string()));
        }
        let mut config = Self {
            schema: Arc::clone(schema),
            slots,
            extras: Mapping::new(),
            initialized: false,
        };
        config.post_init()?;
        Ok(config)
    }

    fn post_init(&mut self) -> Result<()> {
        self.validate_contracts()?;
        self.initialized = true;
        // the check hook may read MISSING fields that are set later
        match self.check_values() {
            Err(CoqpitError::Uninitialized { .. }) => Ok(()),
            other => other,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ------------- validation -------------

    /// Null legality for every field, then each field's contract.
    pub fn validate_contracts(&self) -> Result<()> {
        for (field, slot) in self.fields() {
            let Slot::Set(value) = slot else { continue };
            if value.is_null() && !is_optional(field.field_type()) {
                return Err(CoqpitError::NotOptional {
                    field: field.name().to_string(),
                });
            }
            if let Some(contract) = field.contract_fn() {
                if !value.is_null() && !contract(value) {
                    return Err(CoqpitError::Contract {
                        field: field.name().to_string(),
                        record: self.schema.name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Run the schema's check hook, if it has one.
    pub fn check_values(&self) -> Result<()> {
        match self.schema.check_hook() {
            Some(check) => check(self),
            None => Ok(()),
        }
    }

    /// Contracts, then a serialize/deserialize round trip that has to
    /// reproduce an equal instance.
    pub fn validate(&self) -> Result<()> {
        self.validate_contracts()?;
        let rebuilt = self.schema.deserialize_new(&self.serialize()?)?;
        if rebuilt != *self {
            return Err(CoqpitError::RoundTrip {
                record: self.schema.name().to_string(),
            });
        }
        Ok(())
    }

    // ------------- serialization -------------

    pub fn serialize(&self) -> Result<Value> {
        let mut out = Mapping::new();
        for (field, slot) in self.fields() {
            let value = Self::read(field.name(), slot)?;
            out.insert(field.name(), engine::serialize(value)?);
        }
        Ok(Value::Map(out))
    }

    pub fn to_dict(&self) -> Result<Value> {
        self.serialize()
    }

    /// Like [`Schema::deserialize_new`], but updates `self`. Fields absent
    /// from `data` keep their current value when they have one.
    pub fn deserialize_in_place(&mut self, data: &Value) -> Result<&mut Self> {
        let Value::Map(data) = data else {
            return Err(CoqpitError::mismatch(data, &FieldType::Record(Arc::clone(&self.schema))));
        };
        let mut updates = Vec::with_capacity(self.slots.len());
        for (i, field) in self.schema.fields().iter().enumerate() {
            let slot = match data.get(field.name()) {
                None if self.slots[i] != Slot::Unset => continue,
                None => {
                    return Err(CoqpitError::MissingField {
                        field: field.name().to_string(),
                    });
                }
                Some(Value::Null) => Slot::Set(Value::Null),
                Some(Value::Str(s)) if s == MISSING => {
                    return Err(CoqpitError::UnknownValue {
                        field: field.name().to_string(),
                        record: self.schema.name().to_string(),
                    });
                }
                Some(value) => Slot::Set(deserialize(value, field.field_type())?),
            };
            updates.push((i, slot));
        }
        for (i, slot) in updates {
            self.slots[i] = slot;
        }
        debug!(record = %self.schema.name(), "deserialized in place");
        self.validate_contracts()?;
        Ok(self)
    }

    pub fn from_dict(&mut self, data: &Value) -> Result<()> {
        self.deserialize_in_place(data).map(|_| ())
    }

    // ------------- mapping protocol -------------

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.slots.len()
    }
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.schema.fields().iter().map(Field::name)
    }
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys()
    }
    /// Field membership, the way `name in config` reads.
    pub fn contains(&self, name: &str) -> bool {
        self.schema
            .position(name)
            .is_some_and(|i| self.slots[i] != Slot::Unset)
    }
    /// Whether the instance holds the attribute at all, extras included.
    pub fn has(&self, name: &str) -> bool {
        self.contains(name) || self.extras.contains_key(name)
    }
    pub fn get(&self, name: &str) -> Result<Option<&Value>> {
        if !self.has(name) {
            return Ok(None);
        }
        self.get_item(name).map(Some)
    }
    pub fn get_or<'a>(&'a self, name: &str, default: &'a Value) -> Result<&'a Value> {
        Ok(self.get(name)?.unwrap_or(default))
    }
    pub fn items(&self) -> Result<Vec<(&str, &Value)>> {
        self.fields()
            .map(|(field, slot)| Ok((field.name(), Self::read(field.name(), slot)?)))
            .collect()
    }
    pub fn get_item(&self, name: &str) -> Result<&Value> {
        match self.schema.position(name) {
            Some(i) => Self::read(name, &self.slots[i]),
            None => self
                .extras
                .get(name)
                .ok_or_else(|| CoqpitError::NoKey(name.to_string())),
        }
    }
    /// Assigns without coercion or validation. Names the schema does not
    /// declare are kept as extra attributes.
    pub fn set_item(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.schema.position(name) {
            Some(i) => self.slots[i] = Slot::Set(value),
            None => {
                self.extras.insert(name, value);
            }
        }
    }
    pub fn del_item(&mut self, name: &str) -> Result<()> {
        match self.schema.position(name) {
            Some(i) if self.slots[i] != Slot::Unset => {
                self.slots[i] = Slot::Unset;
                Ok(())
            }
            Some(_) => Err(CoqpitError::NoKey(name.to_string())),
            None => self
                .extras
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| CoqpitError::NoKey(name.to_string())),
        }
    }

    /// Bulk assignment. Unknown names are rejected unless `allow_new`.
    pub fn update<K, I>(&mut self, new: I, allow_new: bool) -> Result<()>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Value)>,
    {
        for (key, value) in new {
            let key = key.as_ref();
            if allow_new || self.schema.position(key).is_some() || self.extras.contains_key(key) {
                self.set_item(key, value);
            } else {
                return Err(CoqpitError::NoKey(key.to_string()));
            }
        }
        Ok(())
    }

    /// Fold the fields and values of `others` into `self`, later configs
    /// winning on name clashes.
    pub fn merge(&mut self, others: &[Config]) {
        let mut fields: Vec<Field> = self.schema.fields().to_vec();
        let mut slots = std::mem::take(&mut self.slots);
        for other in others {
            for (field, slot) in other.fields() {
                match fields.iter().position(|f| f.name() == field.name()) {
                    Some(i) => {
                        fields[i] = field.clone();
                        slots[i] = slot.clone();
                    }
                    None => {
                        fields.push(field.clone());
                        slots.push(slot.clone());
                    }
                }
            }
            for (key, value) in other.extras.iter() {
                self.extras.insert(key, value.clone());
            }
        }
        self.schema = Arc::new(Schema::with_fields(
            self.schema.name().to_string(),
            fields,
            self.schema.check_hook().cloned(),
        ));
        self.slots = slots;
    }

    // ------------- internals -------------

    fn fields(&self) -> impl Iterator<Item = (&Field, &Slot)> {
        self.schema.fields().iter().zip(self.slots.iter())
    }

    fn read<'a>(name: &str, slot: &'a Slot) -> Result<&'a Value> {
        match slot {
            Slot::Set(value) => Ok(value),
            Slot::Missing => Err(CoqpitError::Uninitialized {
                field: name.to_string(),
            }),
            Slot::Unset => Err(CoqpitError::NoKey(name.to_string())),
        }
    }

    /// Mutable access to a readable attribute, for path resolution.
    pub(crate) fn value_mut(&mut self, name: &str) -> Result<&mut Value> {
        match self.schema.position(name) {
            Some(i) => match &mut self.slots[i] {
                Slot::Set(value) => Ok(value),
                Slot::Missing => Err(CoqpitError::Uninitialized {
                    field: name.to_string(),
                }),
                Slot::Unset => Err(CoqpitError::NoKey(name.to_string())),
            },
            None => self
                .extras
                .get_mut(name)
                .ok_or_else(|| CoqpitError::NoKey(name.to_string())),
        }
    }

    /// Current value of each field, `None` where nothing readable is held.
    pub(crate) fn current_values(&self) -> impl Iterator<Item = (&Field, Option<&Value>)> {
        self.fields().map(|(field, slot)| match slot {
            Slot::Set(value) => (field, Some(value)),
            _ => (field, None),
        })
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.schema, &other.schema) || self.schema.name() == other.schema.name())
            && self.slots == other.slots
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut out = f.debug_struct(self.schema.name());
        for (field, slot) in self.fields() {
            match slot {
                Slot::Set(value) => out.field(field.name(), value),
                Slot::Missing => out.field(field.name(), &MISSING),
                Slot::Unset => out.field(field.name(), &"<unset>"),
            };
        }
        out.finish()
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_json() {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "{self:?}"),
        }
    }
}
