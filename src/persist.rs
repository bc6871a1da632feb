// used for reading and writing config files
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::value::Value;

const INDENT: &[u8] = b"    ";

/// Parse JSON text into a wire value.
pub fn parse_json(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

/// Render a wire value as JSON text indented by four spaces.
pub fn write_json<W: Write>(writer: W, value: &Value) -> Result<()> {
    let mut serializer = Serializer::with_formatter(writer, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer)?;
    Ok(())
}

impl Config {
    pub fn to_json(&self) -> Result<String> {
        let mut out = Vec::new();
        write_json(&mut out, &self.serialize()?)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// The file is only created once the whole document has rendered.
    pub fn save_json(&self, file_name: impl AsRef<Path>) -> Result<()> {
        let mut rendered = Vec::new();
        write_json(&mut rendered, &self.serialize()?)?;
        let mut writer = BufWriter::new(File::create(file_name.as_ref())?);
        writer.write_all(&rendered)?;
        writer.flush()?;
        debug!(record = %self.schema().name(), path = %file_name.as_ref().display(), "saved config");
        Ok(())
    }

    /// Update the matching fields from a JSON file, with type coercion.
    pub fn load_json(&mut self, file_name: impl AsRef<Path>) -> Result<()> {
        let reader = BufReader::new(File::open(file_name.as_ref())?);
        let wire: Value = serde_json::from_reader(reader)?;
        self.deserialize_in_place(&wire)?;
        debug!(record = %self.schema().name(), path = %file_name.as_ref().display(), "loaded config");
        self.check_values()
    }
}
