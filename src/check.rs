//! Declarative value checks for use inside a schema's check hook.
//!
//! ```
//! use coqpit::check::{ArgumentCheck, check_argument};
//! # use coqpit::{Config, Field, FieldType, Schema};
//! let schema = Schema::builder("Audio")
//!     .field(Field::new("num_mels", FieldType::Int).default(80))
//!     .check(|c| check_argument("num_mels", c, &ArgumentCheck::new().restricted().min_val(10.0).max_val(2056.0)))
//!     .build()
//!     .unwrap();
//! assert!(Config::new(&schema).is_ok());
//! ```

use std::path::Path;

use crate::config::Config;
use crate::error::{CoqpitError, Result};
use crate::value::Value;

#[derive(Clone, Debug)]
pub struct ArgumentCheck {
    restricted: bool,
    allow_none: bool,
    is_path: bool,
    prerequest: Vec<String>,
    alternative: Option<String>,
    min_val: Option<f64>,
    max_val: Option<f64>,
    enum_list: Option<Vec<String>>,
}

impl Default for ArgumentCheck {
    fn default() -> Self {
        Self {
            restricted: false,
            allow_none: true,
            is_path: false,
            prerequest: Vec::new(),
            alternative: None,
            min_val: None,
            max_val: None,
            enum_list: None,
        }
    }
}

impl ArgumentCheck {
    pub fn new() -> Self {
        Self::default()
    }
    /// The field has to be present.
    pub fn restricted(mut self) -> Self {
        self.restricted = true;
        self
    }
    pub fn deny_none(mut self) -> Self {
        self.allow_none = false;
        self
    }
    /// The value names a path that has to exist.
    pub fn is_path(mut self) -> Self {
        self.is_path = true;
        self
    }
    pub fn prerequest(mut self, name: impl Into<String>) -> Self {
        self.prerequest.push(name.into());
        self
    }
    /// When this field holds a value, the range and enum checks are skipped.
    pub fn alternative(mut self, name: impl Into<String>) -> Self {
        self.alternative = Some(name.into());
        self
    }
    pub fn min_val(mut self, min: f64) -> Self {
        self.min_val = Some(min);
        self
    }
    pub fn max_val(mut self, max: f64) -> Self {
        self.max_val = Some(max);
        self
    }
    /// Allowed values, compared against the lower-cased string value.
    pub fn enum_list<I, S>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_list = Some(allowed.into_iter().map(Into::into).collect());
        self
    }

    pub fn check(&self, name: &str, config: &Config) -> Result<()> {
        let Some(value) = config.get(name)? else {
            if self.restricted {
                return Err(fail(format!("{name} not defined in config")));
            }
            return Ok(());
        };
        if value.is_null() {
            if self.allow_none {
                return Ok(());
            }
            return Err(fail(format!("None value is not allowed for {name}.")));
        }
        if let Some(missing) = self.prerequest.iter().find(|p| !config.has(p)) {
            return Err(fail(format!("prerequested field {missing} for {name} is not defined.")));
        }
        if self.is_path {
            let exists = match value {
                Value::Path(p) => p.exists(),
                Value::Str(s) => Path::new(s).exists(),
                _ => false,
            };
            if !exists {
                return Err(fail(format!("path for {name} (\"{value}\") does not exist.")));
            }
        }
        if let Some(alternative) = &self.alternative {
            if config.get(alternative)?.is_some_and(|v| !v.is_null()) {
                return Ok(());
            }
        }
        if self.min_val.is_some() || self.max_val.is_some() {
            let x = value
                .as_f64()
                .ok_or_else(|| fail(format!("{name} is not a number")))?;
            if let Some(max) = self.max_val.filter(|max| x > *max) {
                return Err(fail(format!("{name} is larger than max value {max}")));
            }
            if let Some(min) = self.min_val.filter(|min| x < *min) {
                return Err(fail(format!("{name} is smaller than min value {min}")));
            }
        }
        if let Some(allowed) = &self.enum_list {
            let valid = value
                .as_str()
                .is_some_and(|s| allowed.iter().any(|a| *a == s.to_lowercase()));
            if !valid {
                return Err(fail(format!("{name} is not a valid value")));
            }
        }
        Ok(())
    }
}

pub fn check_argument(name: &str, config: &Config, check: &ArgumentCheck) -> Result<()> {
    check.check(name, config)
}

fn fail(message: String) -> CoqpitError {
    CoqpitError::Check(format!(" [!] {message}"))
}
