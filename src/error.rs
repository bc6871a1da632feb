use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoqpitError {
    /// A container type with an unsupported number of parameters.
    #[error("Shape error: {0}")]
    Shape(String),
    #[error(" [!] '{value_type}' value type of '{value}' does not match '{field_type}' field type.")]
    TypeMismatch {
        value: String,
        value_type: String,
        field_type: String,
    },
    #[error(" [!] '{value}' is not valid for Literal field type '{field_type}'.")]
    Literal { value: String, field_type: String },
    #[error(" [!] Missing required field \"{field}\"")]
    MissingField { field: String },
    #[error("__init__ missing 1 required argument: '{field}'")]
    MissingArgument { field: String },
    #[error("Deserialized with unknown value for {field} in {record}")]
    UnknownValue { field: String, record: String },
    #[error(" [!] MISSING field {field} must be defined.")]
    Uninitialized { field: String },
    #[error("{field} is not optional")]
    NotOptional { field: String },
    #[error("break the contract for {field}, {record}")]
    Contract { field: String, record: String },
    #[error("{record} could not be deserialized with same value")]
    RoundTrip { record: String },
    #[error(" [!] No key - {0}")]
    NoKey(String),
    #[error("Path error: '{path}' {reason}")]
    Path { path: String, reason: String },
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Check failed: {0}")]
    Check(String),
    #[error("Not supported by the argument parser: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Args(#[from] clap::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoqpitError>;

impl CoqpitError {
    pub(crate) fn mismatch(value: &crate::value::Value, field_type: &crate::types::FieldType) -> Self {
        Self::TypeMismatch {
            value: value.to_string(),
            value_type: value.type_name(),
            field_type: field_type.to_string(),
        }
    }
    pub(crate) fn path(path: impl ToString, reason: impl Into<String>) -> Self {
        Self::Path {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
