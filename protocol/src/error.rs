use serde_json::Value as JsonValue;
use thiserror::Error;

/// Failure to turn a `{type, value}` pair back into a native value.
///
/// Either side speaking a different protocol version or a corrupted payload ends up here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnmarshalError {
    #[error("Unknown type tag `{0}`")]
    UnknownType(String),
    #[error("Invalid value for type `{type_name}`: {value}")]
    InvalidValue { type_name: String, value: JsonValue },
}
