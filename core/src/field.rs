//! Field declarations.
//!
//! A [`Field`] is metadata for one named attribute of a schema: its default,
//! its validator chain and its encode/decode pipelines. Fields are built
//! with chained configuration methods and handed to a
//! [`SchemaBuilder`](crate::SchemaBuilder), which binds their name. After
//! that they are shared, read-only, by every model of the schema.
//!
//! # Examples
//!
//! ```
//! use modelkit_core::{Field, Schema, Model};
//!
//! let user = Schema::builder("User")
//!     .field("login", Field::string().required())
//!     .field("role", Field::string().choices(["admin", "moderator", "user"]))
//!     .field("email", Field::email().required())
//!     .field("is_active", Field::boolean().default(false))
//!     .build()
//!     .unwrap();
//!
//! let jack = Model::new(&user, [("login", "jack"), ("role", "user"), ("email", "jack@example.com")]).unwrap();
//! assert_eq!(jack.get("is_active").unwrap(), false.into());
//! assert!(jack.validate().is_ok());
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::decoders::{self, Decoder};
use crate::encoders::{self, Encoder};
use crate::error::{ConfigError, DecodeError, EncodeError, Result, ValidationError};
use crate::model::Model;
use crate::schema::Schema;
use crate::validators::{self, Validator};
use crate::value::{Map, Value};

/// Structural role of a field, which decides how writes are interpreted
/// and which pipeline stages run after the user-supplied ones.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Stores whatever it is given.
    Plain,
    /// A list; encoding requires a list value.
    List,
    /// A single nested model of the given schema.
    Embedded(Arc<Schema>),
    /// A list of nested models of the given schema.
    Collection(Arc<Schema>),
}

/// How a field's value is produced when it was never assigned.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value, cloned for each instance.
    Literal(Value),
    /// Called once per instance, on first read.
    Producer(Arc<dyn Fn() -> Value + Send + Sync>),
    /// Called once per instance, on first read, with the owning model.
    ModelProducer(Arc<dyn Fn(&Model) -> Value + Send + Sync>),
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Producer(_) => f.write_str("Producer"),
            DefaultValue::ModelProducer(_) => f.write_str("ModelProducer"),
        }
    }
}

/// Metadata describing one attribute of a schema.
#[derive(Clone)]
pub struct Field {
    name: String,
    kind: FieldKind,
    default: Option<DefaultValue>,
    required: bool,
    choices: Option<validators::In>,
    validators: Vec<Arc<dyn Validator>>,
    encoders: Vec<Arc<dyn Encoder>>,
    decoders: Vec<Arc<dyn Decoder>>,
    read_only: bool,
    source: Option<String>,
    options: Map,
}

impl Default for Field {
    fn default() -> Self {
        Self::new()
    }
}

impl Field {
    /// An untyped field: no validators, no transforms.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            kind: FieldKind::Plain,
            default: None,
            required: false,
            choices: None,
            validators: Vec::new(),
            encoders: Vec::new(),
            decoders: Vec::new(),
            read_only: false,
            source: None,
            options: Map::new(),
        }
    }

    /// String-valued field.
    pub fn string() -> Self {
        Self::new().validator(validators::Str)
    }

    /// Integer-valued field.
    pub fn integer() -> Self {
        Self::new().validator(validators::Integer)
    }

    /// Float-valued field.
    pub fn float() -> Self {
        Self::new().validator(validators::Float)
    }

    /// Boolean-valued field.
    pub fn boolean() -> Self {
        Self::new().validator(validators::Boolean)
    }

    /// String field holding an email address.
    pub fn email() -> Self {
        Self::new().validator(validators::Email)
    }

    /// String field holding an http(s) URL.
    pub fn url() -> Self {
        Self::new().validator(validators::Url)
    }

    /// String field holding a `scheme://` URI.
    pub fn uri() -> Self {
        Self::new().validator(validators::Uri)
    }

    /// String field holding an IPv4 or IPv6 address.
    pub fn ip() -> Self {
        Self::new().validator(validators::Ip)
    }

    /// Datetime field, encoded to and decoded from ISO-8601 text.
    pub fn datetime() -> Self {
        Self::new()
            .validator(validators::DateTime)
            .encoder(encoders::DateTime::iso())
            .decoder(decoders::DateTime::iso())
    }

    /// Datetime field, encoded to and decoded from text in the given
    /// strftime-style format.
    pub fn datetime_with_format(format: &str) -> Self {
        Self::new()
            .validator(validators::DateTime)
            .encoder(encoders::DateTime::with_format(format))
            .decoder(decoders::DateTime::with_format(format))
    }

    /// List field. Every element must pass all `inner` validators. Defaults
    /// to a fresh empty list per instance.
    pub fn list(inner: Vec<Arc<dyn Validator>>) -> Self {
        let mut field = Self::new()
            .validator(validators::List::new(inner))
            .default_with(|| Value::List(Vec::new()));
        field.kind = FieldKind::List;
        field
    }

    /// A nested model of `schema`.
    ///
    /// Assigning a plain [`Value::Map`] builds a nested instance from its
    /// entries. Any other value, including an instance, is stored as given.
    pub fn embedded(schema: &Arc<Schema>) -> Self {
        let mut field = Self::new().validator(validators::Model::new(schema));
        field.kind = FieldKind::Embedded(Arc::clone(schema));
        field
    }

    /// A list of nested models of `schema`. Defaults to a fresh empty list
    /// per instance.
    ///
    /// Assigning a [`Value::List`] converts each mapping element into a
    /// nested instance; other elements and non-list values are kept as given.
    pub fn collection(schema: &Arc<Schema>) -> Self {
        let mut field = Self::new()
            .validator(validators::List::default().with(validators::Model::new(schema)))
            .default_with(|| Value::List(Vec::new()));
        field.kind = FieldKind::Collection(Arc::clone(schema));
        field
    }

    /// Adds the [`Required`](validators::Required) check.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restricts the value to one of `choices`.
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.choices = Some(validators::In::new(choices));
        self
    }

    /// Appends a validator to the chain.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Appends an encoder to the encode pipeline.
    pub fn encoder(mut self, encoder: impl Encoder + 'static) -> Self {
        self.encoders.push(Arc::new(encoder));
        self
    }

    /// Appends a decoder to the decode pipeline.
    pub fn decoder(mut self, decoder: impl Decoder + 'static) -> Self {
        self.decoders.push(Arc::new(decoder));
        self
    }

    /// Uses a fixed default value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Computes the default lazily, once per instance.
    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::Producer(Arc::new(producer)));
        self
    }

    /// Computes the default lazily from the owning model, once per instance.
    pub fn default_from_model<F>(mut self, producer: F) -> Self
    where
        F: Fn(&Model) -> Value + Send + Sync + 'static,
    {
        self.default = Some(DefaultValue::ModelProducer(Arc::new(producer)));
        self
    }

    /// Keeps the field out of encoded output; decoding still reads it.
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Uses `key` instead of the field name in encoded and raw data.
    pub fn source(mut self, key: impl Into<String>) -> Self {
        self.source = Some(key.into());
        self
    }

    /// Attaches a free-form option for consumers of the schema.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Binds the attribute name and checks the configuration.
    pub(crate) fn bind(mut self, name: &str) -> std::result::Result<Self, ConfigError> {
        self.name = name.to_string();

        if let Some(choices) = &self.choices {
            if choices.choices().is_empty() {
                return Err(ConfigError::EmptyChoices {
                    field: self.name.clone(),
                });
            }
            if let Some(DefaultValue::Literal(value)) = &self.default {
                if !choices.choices().contains(value) {
                    return Err(ConfigError::DefaultNotInChoices {
                        field: self.name.clone(),
                    });
                }
            }
        }

        Ok(self)
    }

    /// Attribute name, empty until the field is part of a schema.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key used in encoded and raw data.
    pub fn external_name(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.name)
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn choices_list(&self) -> Option<&[Value]> {
        self.choices.as_ref().map(validators::In::choices)
    }

    pub fn options(&self) -> &Map {
        &self.options
    }

    /// Current value in `model`, resolving and caching the default on first read.
    pub fn read(&self, model: &Model) -> Value {
        if let Some(value) = model.stored(&self.name) {
            return value;
        }
        if self.default.is_none() {
            return Value::Null;
        }

        let value = self.produce_default(model);
        model.store_if_absent(&self.name, value)
    }

    fn produce_default(&self, model: &Model) -> Value {
        match &self.default {
            None => Value::Null,
            Some(DefaultValue::Literal(value)) => value.clone(),
            Some(DefaultValue::Producer(producer)) => {
                trace!(field = %self.name, "Producing default");
                producer()
            }
            Some(DefaultValue::ModelProducer(producer)) => {
                trace!(field = %self.name, model = %model.schema().name(), "Producing default from model");
                producer(model)
            }
        }
    }

    /// Stores `value` in `model` without validating it.
    ///
    /// Embedded and collection fields turn mappings into nested instances
    /// first, which fails if a mapping names an unknown field.
    pub fn write(&self, model: &Model, value: Value) -> Result<()> {
        let value = self.adopt(value)?;
        model.store(&self.name, value);
        Ok(())
    }

    fn adopt(&self, value: Value) -> Result<Value> {
        match (&self.kind, value) {
            (FieldKind::Embedded(schema), Value::Map(entries)) => {
                Ok(Value::Model(Model::from_map(schema, entries)?))
            }
            (FieldKind::Collection(schema), Value::List(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::Map(entries) => Ok(Value::Model(Model::from_map(schema, entries)?)),
                    other => Ok(other),
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::List),
            (_, value) => Ok(value),
        }
    }

    /// Runs the validator chain, stopping at the first failure.
    ///
    /// `required` runs first, then `choices`, then the remaining validators
    /// in declaration order.
    pub fn validate(&self, value: &Value) -> std::result::Result<(), ValidationError> {
        if self.required {
            validators::Required.validate(value)?;
        }
        if let Some(choices) = &self.choices {
            choices.validate(value)?;
        }
        for validator in &self.validators {
            validator.validate(value)?;
        }
        Ok(())
    }

    /// Runs the encode pipeline. With no encoders the value is unchanged.
    pub fn encode(&self, value: Value) -> std::result::Result<Value, EncodeError> {
        let value = self
            .encoders
            .iter()
            .try_fold(value, |acc, encoder| encoder.encode(acc))?;

        match &self.kind {
            FieldKind::Plain => Ok(value),
            FieldKind::List => encoders::List::default().encode(value),
            FieldKind::Embedded(_) => encoders::Model.encode(value),
            FieldKind::Collection(_) => encoders::collection().encode(value),
        }
    }

    /// Runs the decode pipeline. With no decoders the value is unchanged.
    pub fn decode(&self, value: Value) -> std::result::Result<Value, DecodeError> {
        let value = self
            .decoders
            .iter()
            .try_fold(value, |acc, decoder| decoder.decode(acc))?;

        match &self.kind {
            FieldKind::Plain | FieldKind::List => Ok(value),
            FieldKind::Embedded(schema) => decoders::Model::new(schema).decode(value),
            FieldKind::Collection(schema) => decoders::Collection::new(schema).decode(value),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("choices", &self.choices_list())
            .field("read_only", &self.read_only)
            .field("source", &self.source)
            .field("validators", &self.validators.len())
            .field("encoders", &self.encoders.len())
            .field("decoders", &self.decoders.len())
            .finish()
    }
}
