//! Error types for model definition, access, validation and projection.
//!
//! Each failure family gets its own type so callers can match on exactly the
//! stage that failed. [`Error`] unifies them for APIs that can fail in more
//! than one way (e.g. constructing a model with embedded data).

use thiserror::Error;

/// An unknown field name was used for construction, item access or update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{model}' model has no field '{field}'")]
pub struct FieldError {
    /// Name of the schema the lookup was performed on.
    pub model: String,
    /// The offending key.
    pub field: String,
}

impl FieldError {
    pub fn new(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
        }
    }
}

/// A value failed one of its field's validators.
///
/// The message always names the violated rule (`"is required"`,
/// `"should be a string"`). When raised from [`Model::validate`] the failing
/// field name is attached and rendered as a prefix: `"name is required"`.
///
/// [`Model::validate`]: crate::Model::validate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.render())]
pub struct ValidationError {
    /// Field the error was reported for, if known.
    pub field: Option<String>,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl ValidationError {
    /// Creates an error with a rule message and no field attached.
    ///
    /// # Examples
    ///
    /// ```
    /// use modelkit_core::ValidationError;
    ///
    /// let err = ValidationError::new("is required").with_field("login");
    /// assert_eq!(err.to_string(), "login is required");
    /// ```
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// Attaches the failing field name.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    fn render(&self) -> String {
        match &self.field {
            Some(field) => format!("{field} {}", self.message),
            None => self.message.clone(),
        }
    }
}

/// A decoder could not interpret its raw input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The raw value does not match the expected textual format.
    #[error("cannot decode '{value}' with format '{format}'")]
    InvalidFormat { value: String, format: String },
    /// The raw value has the wrong shape (e.g. a number where a string was expected).
    #[error("expected {expected}, found {found}")]
    UnexpectedType { expected: String, found: String },
}

/// An encoder received a structurally invalid value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// A sequence was required.
    #[error("expected a list, found {0}")]
    NotAList(String),
    /// A datetime was required.
    #[error("expected a datetime, found {0}")]
    NotADateTime(String),
    /// The model graph loops back onto a model that is already being encoded.
    #[error("circular reference detected while encoding '{0}' model")]
    Cycle(String),
    /// The value has no plain-data representation (e.g. an opaque object in JSON).
    #[error("value of type {0} is not representable")]
    NotRepresentable(String),
}

/// Reflection was requested on something that is not a schema or model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected a model instance or schema, found {0}")]
pub struct InspectError(pub String);

/// Invalid field configuration, detected while a schema is being built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A field was declared with an empty name.
    #[error("schema '{schema}' declares a field with an empty name")]
    EmptyFieldName { schema: String },
    /// The same name was declared twice in one schema body.
    #[error("schema '{schema}' declares field '{field}' more than once")]
    DuplicateField { schema: String, field: String },
    /// `choices` was given but is empty.
    #[error("field '{field}' declares an empty choices list")]
    EmptyChoices { field: String },
    /// A literal default that can never validate against `choices`.
    #[error("default of field '{field}' is not one of its choices")]
    DefaultNotInChoices { field: String },
}

/// Unified error type for operations spanning several stages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Inspect(#[from] InspectError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// JSON text could not be produced.
    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
