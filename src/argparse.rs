//! Command-line projection of a config's field tree.
//!
//! Every editable field becomes a long flag named by its dotted path below
//! an optional prefix, e.g. `--coqpit.people.0.name`. Parsed values are
//! coerced against the field's declared type and written back through
//! [`Config::set_path`], after which validation runs again.
//!
//! What gets a flag:
//! * primitives, paths and literals take one value; booleans only accept
//!   `true` or `false`;
//! * mappings take a JSON object;
//! * lists with a non-empty current value get one flag per existing index
//!   (recursing into records), other lists take a variadic sequence of a
//!   primitive element type;
//! * nested records with a current value contribute their own fields;
//! * `X | list[X]` behaves like a list when it holds one or nothing, and
//!   like `X` when it holds a scalar;
//! * other unions are an error, or are skipped with `relaxed` set.

use std::path::PathBuf;
use std::sync::Arc;

use clap::builder::ValueParser;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

use crate::config::Config;
use crate::engine::deserialize;
use crate::error::{CoqpitError, Result};
use crate::path::{FieldPath, set_in};
use crate::schema::{Field, Schema};
use crate::types::{
    FieldType, drop_absence_marker, is_list, is_primitive,
    list_element_if_homogeneous_union_of_list_and_scalar,
};
use crate::value::{Mapping, Value};

#[derive(Clone, Debug)]
pub struct ParserOptions {
    /// Leading flag segment; empty for bare field paths.
    pub prefix: String,
    pub help_prefix: String,
    /// Skip fields the projection cannot express instead of failing.
    pub relaxed: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            prefix: "coqpit".into(),
            help_prefix: String::new(),
            relaxed: false,
        }
    }
}

impl ParserOptions {
    pub fn relaxed() -> Self {
        Self {
            relaxed: true,
            ..Self::default()
        }
    }
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlagKind {
    Scalar,
    Variadic,
    Json,
}

/// One registered flag and the field it writes to.
#[derive(Clone, Debug)]
pub struct Flag {
    pub path: FieldPath,
    pub long: String,
    /// Type the parsed value is coerced against before it is assigned.
    pub field_type: FieldType,
    pub kind: FlagKind,
}

pub struct ArgParser {
    command: Command,
    flags: Vec<Flag>,
    prefix: String,
    relaxed: bool,
}

impl ArgParser {
    fn new(name: &str, options: &ParserOptions) -> Self {
        Self {
            command: Command::new(name.to_string())
                .no_binary_name(true)
                .args_override_self(true),
            flags: Vec::new(),
            prefix: options.prefix.clone(),
            relaxed: options.relaxed,
        }
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }
    pub fn command(&self) -> &Command {
        &self.command
    }
    /// Add the registered flags to another command.
    pub fn augment(&self, command: Command) -> Command {
        command.args(self.command.get_arguments().cloned())
    }
    pub fn render_help(&mut self) -> String {
        self.command.render_help().to_string()
    }

    /// Parse `args` (without a program name) into coerced field overrides,
    /// in flag registration order. Only flags present on the command line
    /// produce an override.
    pub fn parse<I, T>(&self, args: I) -> Result<Vec<(FieldPath, Value)>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let matches = self.command.clone().try_get_matches_from(args)?;
        self.overrides(&matches)
    }

    /// Like [`ArgParser::parse`], but flags this parser does not know are
    /// returned (with their values) instead of rejected.
    pub fn parse_known<I, T>(&self, args: I) -> Result<(Vec<(FieldPath, Value)>, Vec<String>)>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let (known, unknown) = self.split_known(args.into_iter().map(Into::into));
        if !unknown.is_empty() {
            debug!(?unknown, "ignoring unknown arguments");
        }
        Ok((self.parse(known)?, unknown))
    }

    fn split_known(&self, args: impl Iterator<Item = String>) -> (Vec<String>, Vec<String>) {
        let mut known = Vec::new();
        let mut unknown = Vec::new();
        let mut in_known = false;
        for arg in args {
            if let Some(name) = arg.strip_prefix("--") {
                let name = name.split_once('=').map_or(name, |(n, _)| n);
                in_known = name == "help" || self.flags.iter().any(|f| f.long == name);
            } else if arg == "-h" {
                in_known = true;
            } else if arg.len() > 1 && arg.starts_with('-') && arg.parse::<f64>().is_err() {
                // short flags are never registered
                in_known = false;
            }
            if in_known {
                known.push(arg);
            } else {
                unknown.push(arg);
            }
        }
        (known, unknown)
    }

    /// Coerced overrides for the flags set in `matches`, which may come
    /// from a command this parser [augmented](ArgParser::augment).
    pub fn overrides(&self, matches: &ArgMatches) -> Result<Vec<(FieldPath, Value)>> {
        let mut out = Vec::new();
        for flag in &self.flags {
            if matches.value_source(&flag.long) != Some(ValueSource::CommandLine) {
                continue;
            }
            let raw = match flag.kind {
                FlagKind::Variadic => matches
                    .try_get_many::<Value>(&flag.long)
                    .map_err(|e| CoqpitError::Unsupported(e.to_string()))?
                    .map(|values| Value::List(values.cloned().collect())),
                FlagKind::Scalar | FlagKind::Json => matches
                    .try_get_one::<Value>(&flag.long)
                    .map_err(|e| CoqpitError::Unsupported(e.to_string()))?
                    .cloned(),
            };
            let Some(raw) = raw else { continue };
            out.push((flag.path.clone(), deserialize(&raw, &flag.field_type)?));
        }
        Ok(out)
    }

    // ------------- registration -------------

    fn add_fields<'a>(
        &mut self,
        parent: &FieldPath,
        fields: impl Iterator<Item = (&'a Field, Option<&'a Value>)>,
        help_prefix: &str,
    ) -> Result<()> {
        for (field, current) in fields {
            let help = join_help(help_prefix, field.help_text());
            self.add_field(parent.field(field.name()), field.field_type(), current, &help)?;
        }
        Ok(())
    }

    fn add_field(&mut self, path: FieldPath, declared: &FieldType, current: Option<&Value>, help: &str) -> Result<()> {
        let current = current.filter(|v| !v.is_null());
        if let Some(element) = list_element_if_homogeneous_union_of_list_and_scalar(declared) {
            return match current {
                Some(Value::List(items)) if !items.is_empty() => self.add_indexed(&path, &element, items, help),
                Some(Value::List(_)) | None => self.add_variadic(path, &element, declared, help),
                Some(_) => self.add_scalar(path, &element, declared, help),
            };
        }
        let base = drop_absence_marker(declared);
        let editable_without_value = is_primitive(&base)
            || is_list(&base)
            || matches!(base, FieldType::Path | FieldType::Literal(_));
        if current.is_none() && !editable_without_value {
            // aggregates without a value have nothing to edit
            return Ok(());
        }
        match &base {
            FieldType::Mapping => {
                self.push(path, declared, FlagKind::Json, help, &FieldType::Mapping);
                Ok(())
            }
            FieldType::List(params) => {
                let element = match params.as_slice() {
                    [element] => element,
                    [] => return Err(CoqpitError::Unsupported(format!("un-hinted list field '{path}'"))),
                    _ if self.relaxed => return Ok(()),
                    _ => {
                        return Err(CoqpitError::Shape(format!(
                            "multi-type hinted '{base}' is not supported"
                        )));
                    }
                };
                if is_list(element) && self.relaxed {
                    return Ok(());
                }
                match current {
                    Some(Value::List(items)) if !items.is_empty() => self.add_indexed(&path, element, items, help),
                    _ if is_primitive(element) => self.add_variadic(path, element, declared, help),
                    _ if self.relaxed => Ok(()),
                    _ => Err(CoqpitError::Unsupported(format!(
                        "empty list '{path}' with non primitive inner type {element}"
                    ))),
                }
            }
            FieldType::Record(_) => match current {
                Some(Value::Record(config)) => self.add_fields(&path, config.current_values(), help),
                _ => Ok(()),
            },
            FieldType::Bool | FieldType::Int | FieldType::Float | FieldType::Str | FieldType::Path
            | FieldType::Literal(_) => self.add_scalar(path, &base, declared, help),
            _ if self.relaxed => Ok(()),
            other => Err(CoqpitError::Unsupported(format!("'{path}' of type {other}"))),
        }
    }

    fn add_indexed(&mut self, path: &FieldPath, element: &FieldType, items: &[Value], help: &str) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            self.add_field(path.index(i), element, Some(item), help)?;
        }
        Ok(())
    }

    fn add_scalar(&mut self, path: FieldPath, parse_as: &FieldType, declared: &FieldType, help: &str) -> Result<()> {
        if !is_primitive(parse_as) && !matches!(parse_as, FieldType::Path | FieldType::Literal(_)) {
            return if self.relaxed {
                Ok(())
            } else {
                Err(CoqpitError::Unsupported(format!("'{path}' of type {parse_as}")))
            };
        }
        self.push(path, declared, FlagKind::Scalar, help, parse_as);
        Ok(())
    }

    fn add_variadic(&mut self, path: FieldPath, element: &FieldType, declared: &FieldType, help: &str) -> Result<()> {
        if !is_primitive(element) {
            return if self.relaxed {
                Ok(())
            } else {
                Err(CoqpitError::Unsupported(format!(
                    "list '{path}' with non primitive inner type {element}"
                )))
            };
        }
        self.push(path, declared, FlagKind::Variadic, help, element);
        Ok(())
    }

    fn push(&mut self, path: FieldPath, declared: &FieldType, kind: FlagKind, help: &str, parse_as: &FieldType) {
        let long = if self.prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}.{path}", self.prefix)
        };
        let parser = match kind {
            FlagKind::Json => ValueParser::new(parse_json_token),
            FlagKind::Scalar | FlagKind::Variadic => token_parser(parse_as),
        };
        let mut arg = Arg::new(long.clone())
            .long(long.clone())
            .action(ArgAction::Set)
            .value_parser(parser)
            .value_name(metavar(parse_as))
            .help(format!("Config field: {help}"));
        if kind == FlagKind::Variadic {
            arg = arg.num_args(0..);
        }
        if matches!(parse_as, FieldType::Int | FieldType::Float) {
            arg = arg.allow_negative_numbers(true);
        }
        self.command = std::mem::take(&mut self.command).arg(arg);
        self.flags.push(Flag {
            path,
            long,
            field_type: declared.clone(),
            kind,
        });
    }
}

fn metavar(parse_as: &FieldType) -> &'static str {
    match parse_as {
        FieldType::Bool => "true/false",
        FieldType::Int => "INT",
        FieldType::Float => "FLOAT",
        FieldType::Str => "STR",
        FieldType::Path => "PATH",
        FieldType::Literal(_) => "CHOICE",
        FieldType::Mapping => "JSON",
        _ => "VALUE",
    }
}

fn join_help(prefix: &str, help: &str) -> String {
    if prefix.is_empty() {
        help.to_string()
    } else {
        format!("{prefix} - {help}")
    }
}

// ------------- token parsing -------------

fn token_parser(parse_as: &FieldType) -> ValueParser {
    let parse_as = parse_as.clone();
    ValueParser::new(move |token: &str| parse_token(token, &parse_as))
}

fn parse_token(token: &str, parse_as: &FieldType) -> std::result::Result<Value, String> {
    match parse_as {
        FieldType::Bool => match token {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(format!(
                " [!] Value for boolean field must be either \"true\" or \"false\". Got \"{token}\"."
            )),
        },
        FieldType::Int => token.parse().map(Value::Int).map_err(|e| format!("'{token}': {e}")),
        FieldType::Float => token.parse().map(Value::Float).map_err(|e| format!("'{token}': {e}")),
        FieldType::Str => Ok(Value::Str(token.to_string())),
        FieldType::Path => Ok(Value::Path(PathBuf::from(token))),
        FieldType::Literal(candidates) => candidates
            .iter()
            .find(|c| literal_token(c) == token)
            .cloned()
            .ok_or_else(|| format!("'{token}' is not one of {parse_as}")),
        other => Err(format!("type {other} cannot be read from the command line")),
    }
}

fn literal_token(candidate: &Value) -> String {
    match candidate {
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn parse_json_token(token: &str) -> std::result::Result<Value, String> {
    serde_json::from_str::<Value>(token).map_err(|e| e.to_string())
}

// ------------- config entry points -------------

impl Config {
    /// Flags for every editable field, seeded from the current values.
    pub fn init_argparse(&self, options: &ParserOptions) -> Result<ArgParser> {
        let mut parser = ArgParser::new(self.schema().name(), options);
        parser.add_fields(&FieldPath::new(), self.current_values(), &options.help_prefix)?;
        Ok(parser)
    }

    /// Override fields from command-line arguments, then validate again.
    pub fn parse_args<I, T>(&mut self, args: I, options: &ParserOptions) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let overrides = self.init_argparse(options)?.parse(args)?;
        self.apply_overrides(overrides)
    }

    /// Like [`Config::parse_args`], returning the arguments no flag matched.
    pub fn parse_known_args<I, T>(&mut self, args: I, options: &ParserOptions) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let (overrides, unknown) = self.init_argparse(options)?.parse_known(args)?;
        self.apply_overrides(overrides)?;
        Ok(unknown)
    }

    fn apply_overrides(&mut self, overrides: Vec<(FieldPath, Value)>) -> Result<()> {
        for (path, value) in overrides {
            debug!(%path, "override from command line");
            self.set_path(&path, value)?;
        }
        self.validate_contracts()?;
        self.check_values()
    }
}

impl Schema {
    /// Flags seeded from the schema's defaults rather than an instance.
    pub fn init_argparse(self: &Arc<Self>, options: &ParserOptions) -> Result<ArgParser> {
        let defaults = self
            .fields()
            .iter()
            .map(Field::initial_value)
            .collect::<Result<Vec<_>>>()?;
        let mut parser = ArgParser::new(self.name(), options);
        parser.add_fields(
            &FieldPath::new(),
            self.fields().iter().zip(defaults.iter().map(Option::as_ref)),
            &options.help_prefix,
        )?;
        Ok(parser)
    }

    /// Build a new instance from the defaults plus command-line arguments.
    /// Required fields have to be given as flags.
    pub fn init_from_argparse<I, T>(self: &Arc<Self>, args: I, options: &ParserOptions) -> Result<Config>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let overrides = self.init_argparse(options)?.parse(args)?;
        let mut defaults = Mapping::new();
        for field in self.fields() {
            if let Some(value) = field.initial_value()? {
                defaults.insert(field.name(), value);
            }
        }
        let mut root = Value::Map(defaults);
        for (path, value) in overrides {
            set_in(&mut root, path.segments(), value)?;
        }
        match root {
            Value::Map(values) => Config::with_values(self, values),
            other => Err(CoqpitError::mismatch(&other, &FieldType::Record(Arc::clone(self)))),
        }
    }
}
