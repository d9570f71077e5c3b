//! Error types for model graph serialization.

use modelkit_core::EncodeError;
use thiserror::Error;

/// Errors that can occur while serializing or deserializing models.
#[derive(Debug, Error)]
pub enum SerializeError {
    /// A model was refused for output (invalid, or its schema is not allowed).
    #[error("{model} is not serializable: {reason}")]
    NotSerializable { model: String, reason: String },

    /// An input object has no `model` key.
    #[error("json object has no attribute `model`")]
    MissingModelKey,

    /// The `model` key names a schema the registry does not know.
    #[error("unknown model '{0}'")]
    UnknownModel(String),

    /// The decoded object does not validate against its schema.
    #[error("json object is not a valid {model} instance: {reason}")]
    InvalidInstance { model: String, reason: String },

    /// An input entry does not have the `{"model": ..., "obj": {...}}` shape.
    #[error("malformed entry: {0}")]
    MalformedEntry(String),

    /// A model could not be projected to plain data.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// Model construction, decoding or JSON rendering failed.
    #[error(transparent)]
    Core(#[from] modelkit_core::Error),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`SerializeError`].
pub type Result<T> = std::result::Result<T, SerializeError>;
