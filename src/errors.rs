//! Error types for generation and for the emitted codecs.

use thiserror::Error;

/// Result alias for the generation pipeline.
pub type GenResult<T> = Result<T, GenError>;

/// Fatal errors raised while generating code. Generation aborts for the
/// offending file; nothing is written for it.
#[derive(Debug, Error)]
pub enum GenError {
    /// A struct declares a base that is neither registered nor declared.
    #[error("struct '{type_name}' extends unknown base type '{base}'")]
    UnknownBaseType { type_name: String, base: String },

    /// A pointer field references a pointee no codec can be emitted for.
    #[error("field '{type_name}.{field}' points to unregistered type '{pointee}'")]
    UnknownPointeeType {
        type_name: String,
        field: String,
        pointee: String,
    },

    /// An enum discriminant expression could not be evaluated.
    #[error("enum '{type_name}' has unsupported discriminant expression for '{constant}'")]
    BadDiscriminant {
        type_name: String,
        constant: String,
    },

    /// The declaration source failed to parse.
    #[error("failed to parse declaration source: {0}")]
    Parse(#[from] syn::Error),

    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors produced at decode time by the runtime and by emitted code.
///
/// A decode error aborts the enclosing document decode; there is no partial
/// recovery. `path` values are `Struct.Field` chains.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A document node has the wrong JSON type for its field.
    #[error("type mismatch at '{path}': expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A label string is not part of the enum's label table.
    #[error("unknown label '{label}' at '{path}'")]
    UnknownLabel { path: String, label: String },

    /// An enum value has no label to encode it with.
    #[error("enum '{type_name}' has no label for value {value}")]
    UnknownValue { type_name: String, value: u32 },

    /// Strict-key validation found a key the struct does not define.
    #[error("unexpected key '{key}' in '{type_name}' object")]
    UnexpectedKey { type_name: String, key: String },

    /// A dispatch tag has no registered decode handler.
    #[error("no decoder registered for dispatch tag '{tag}'")]
    UnknownDispatchTag { tag: String },
}

/// JSON node type name used in `TypeMismatch` reports.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
