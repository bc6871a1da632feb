//! Coqpit – typed configuration records that round-trip through JSON and can
//! be overridden from the command line.
//!
//! A record type is described by a [`schema::Schema`]: an ordered table of
//! [`schema::Field`]s, each with a declared [`types::FieldType`], a default,
//! a help text and an optional contract. Instances are [`config::Config`]s
//! holding one [`value::Value`] per field.
//!
//! ## Modules
//! * [`types`] – Declared field types and the predicates the engine dispatches on.
//! * [`value`] – Runtime values and the ordered [`value::Mapping`].
//! * [`engine`] – Type-directed coercion of wire values (`deserialize`) and
//!   the inverse projection (`serialize`).
//! * [`schema`] – Record types, field defaults and the MISSING sentinel.
//! * [`config`] – Instances: construction, validation, the mapping protocol,
//!   `update` and `merge`.
//! * [`path`] – Dotted field paths (`people.0.name`) over nested values.
//! * [`persist`] – JSON text and file I/O.
//! * [`argparse`] – Projection of a config onto command-line flags (clap).
//! * [`check`] – Declarative range, enum and presence checks for check hooks.
//!
//! ## Coercion
//! Primitives are strict: a string never becomes a number. An `int` widens
//! into a `float` field, and a `float` narrows into an `int` field by
//! truncation. Unions try their arms in declaration order and keep the first
//! that succeeds. Literals match on type and value.
//!
//! ## Quick Start
//! ```
//! use coqpit::{Config, Field, FieldType, Schema, Value};
//! let schema = Schema::builder("Training")
//!     .field(Field::new("epochs", FieldType::Int).default(10))
//!     .field(Field::new("lr", FieldType::Float).default(0.001))
//!     .field(Field::new("run_name", FieldType::optional(FieldType::Str)).default(Value::Null))
//!     .build()
//!     .unwrap();
//! let mut config = Config::new(&schema).unwrap();
//! config.parse_args(["--coqpit.epochs", "3"], &Default::default()).unwrap();
//! assert_eq!(config.get_item("epochs").unwrap(), &Value::Int(3));
//! let wire = config.serialize().unwrap();
//! assert_eq!(schema.deserialize_new(&wire).unwrap(), config);
//! ```

pub mod argparse;
pub mod check;
pub mod config;
pub mod engine;
pub mod error;
pub mod path;
pub mod persist;
pub mod schema;
pub mod types;
pub mod value;

pub use argparse::{ArgParser, Flag, FlagKind, ParserOptions};
pub use check::{ArgumentCheck, check_argument};
pub use config::Config;
pub use error::{CoqpitError, Result};
pub use path::{FieldPath, Segment};
pub use schema::{Field, FieldDefault, MISSING, Schema, SchemaBuilder};
pub use types::FieldType;
pub use value::{Mapping, Value};
